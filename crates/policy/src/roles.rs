//! Role hierarchy: seniority levels and explicit capability sets.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::permissions::Capability;

/// Role of a staff actor.
///
/// A closed set; seniority and capabilities are not properties of the enum
/// but of the [`RoleHierarchy`] table, which deployments may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator. Acts across tenants for platform-level abilities only.
    SuperAdmin,
    /// Tenant owner. The top role: never assignable, established at provisioning.
    Owner,
    GeneralManager,
    Accountant,
    StoreManager,
    AssistantManager,
    Supervisor,
    SalesRep,
    Cashier,
    StockClerk,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::SuperAdmin,
        Role::Owner,
        Role::GeneralManager,
        Role::Accountant,
        Role::StoreManager,
        Role::AssistantManager,
        Role::Supervisor,
        Role::SalesRep,
        Role::Cashier,
        Role::StockClerk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Owner => "owner",
            Role::GeneralManager => "general_manager",
            Role::Accountant => "accountant",
            Role::StoreManager => "store_manager",
            Role::AssistantManager => "assistant_manager",
            Role::Supervisor => "supervisor",
            Role::SalesRep => "sales_rep",
            Role::Cashier => "cashier",
            Role::StockClerk => "stock_clerk",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the role table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: Role,
    /// Seniority; higher is more senior. Unique across the table.
    pub level: u32,
    /// Acts tenant-wide without shop-assignment checks.
    #[serde(default)]
    pub global: bool,
    /// May act outside its own tenant (platform abilities only).
    #[serde(default)]
    pub cross_tenant: bool,
    pub capabilities: BTreeSet<Capability>,
}

/// Process-wide role table.
///
/// Every role's capability set is enumerated explicitly; there is no
/// inheritance between roles.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    top_role: Role,
    specs: HashMap<Role, RoleSpec>,
}

impl RoleHierarchy {
    /// Build and validate a hierarchy from its table rows.
    ///
    /// Rejects duplicate or missing roles, duplicate levels (the order must be
    /// strict), a cross-tenant top role, a top role that is not senior to every
    /// other tenant role, and platform capabilities on tenant roles.
    pub fn from_specs(top_role: Role, specs: Vec<RoleSpec>) -> Result<Self, ConfigError> {
        let mut by_role: HashMap<Role, RoleSpec> = HashMap::with_capacity(specs.len());
        let mut levels: HashMap<u32, Role> = HashMap::with_capacity(specs.len());

        for spec in specs {
            if let Some(first) = levels.insert(spec.level, spec.role) {
                if first != spec.role {
                    return Err(ConfigError::DuplicateLevel {
                        level: spec.level,
                        first,
                        second: spec.role,
                    });
                }
            }
            if !spec.cross_tenant {
                if let Some(cap) = spec.capabilities.iter().find(|c| c.is_platform()) {
                    return Err(ConfigError::PlatformCapabilityOnTenantRole {
                        role: spec.role,
                        capability: *cap,
                    });
                }
            }
            let role = spec.role;
            if by_role.insert(role, spec).is_some() {
                return Err(ConfigError::DuplicateRole(role));
            }
        }

        for role in Role::ALL {
            if !by_role.contains_key(&role) {
                return Err(ConfigError::MissingRole(role));
            }
        }

        let top = &by_role[&top_role];
        if top.cross_tenant {
            return Err(ConfigError::TopRoleCrossTenant(top_role));
        }
        for spec in by_role.values() {
            if spec.role != top_role && !spec.cross_tenant && spec.level >= top.level {
                return Err(ConfigError::TopRoleNotSenior {
                    top: top_role,
                    other: spec.role,
                });
            }
        }

        Ok(Self {
            top_role,
            specs: by_role,
        })
    }

    /// The single top role (never assignable).
    pub fn top_role(&self) -> Role {
        self.top_role
    }

    pub fn level(&self, role: Role) -> u32 {
        self.spec(role).level
    }

    pub fn has_capability(&self, role: Role, capability: Capability) -> bool {
        self.spec(role).capabilities.contains(&capability)
    }

    /// Whether the role acts tenant-wide, bypassing shop scoping.
    pub fn is_global(&self, role: Role) -> bool {
        self.spec(role).global
    }

    pub fn is_cross_tenant(&self, role: Role) -> bool {
        self.spec(role).cross_tenant
    }

    /// Strict seniority: equal levels never outrank each other.
    pub fn outranks(&self, actor: Role, target: Role) -> bool {
        self.level(actor) > self.level(target)
    }

    /// Whether `actor` may hand `target` to someone.
    ///
    /// Built on [`outranks`](Self::outranks), so a role can never assign itself.
    pub fn can_assign(&self, actor: Role, target: Role) -> bool {
        self.outranks(actor, target) && target != self.top_role
    }

    /// Roles ordered from most to least senior.
    pub fn by_seniority(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.specs.keys().copied().collect();
        roles.sort_by(|a, b| self.level(*b).cmp(&self.level(*a)));
        roles
    }

    pub fn specs(&self) -> impl Iterator<Item = &RoleSpec> {
        self.specs.values()
    }

    /// Roles that hold `capability`, most senior first.
    pub fn holders_of(&self, capability: Capability) -> Vec<Role> {
        self.by_seniority()
            .into_iter()
            .filter(|role| self.has_capability(*role, capability))
            .collect()
    }

    fn spec(&self, role: Role) -> &RoleSpec {
        // Construction guarantees every role is present.
        &self.specs[&role]
    }
}

/// The built-in role table.
pub(crate) fn standard_roles() -> Vec<RoleSpec> {
    use Capability::*;

    let tenant_caps: BTreeSet<Capability> = Capability::ALL
        .into_iter()
        .filter(|c| !c.is_platform())
        .collect();
    let manager_caps: BTreeSet<Capability> = tenant_caps
        .iter()
        .copied()
        .filter(|c| *c != ManageSettings)
        .collect();

    let row = |role, level, global, caps: &[Capability]| RoleSpec {
        role,
        level,
        global,
        cross_tenant: false,
        capabilities: caps.iter().copied().collect(),
    };

    let mut rows = vec![
        RoleSpec {
            role: Role::SuperAdmin,
            level: 1000,
            global: true,
            cross_tenant: true,
            capabilities: [ManagePlatform].into_iter().collect(),
        },
        RoleSpec {
            role: Role::Owner,
            level: 100,
            global: true,
            cross_tenant: false,
            capabilities: tenant_caps,
        },
        RoleSpec {
            role: Role::GeneralManager,
            level: 90,
            global: true,
            cross_tenant: false,
            capabilities: manager_caps,
        },
    ];

    rows.push(row(
        Role::Accountant,
        80,
        false,
        &[
            ViewStaff,
            ViewOrders,
            ProcessPayments,
            RefundPayments,
            ViewPayroll,
            ManagePayroll,
            ApprovePayroll,
            ApproveAdvances,
            DisburseFunds,
            SubmitTimesheets,
            RequestAdvances,
            ViewReports,
        ],
    ));
    rows.push(row(
        Role::StoreManager,
        70,
        false,
        &[
            ViewStaff,
            ManageStaff,
            AssignRoles,
            ViewOrders,
            ManageOrders,
            ProcessPayments,
            RefundPayments,
            ManageReturns,
            ApproveReturns,
            ManageInventory,
            ManagePurchasing,
            FulfilSupplierOrders,
            ManageSuppliers,
            ViewPayroll,
            ManagePayroll,
            SubmitTimesheets,
            ManageTimesheets,
            ApproveTimesheets,
            RequestAdvances,
            ApproveAdvances,
            ViewReports,
        ],
    ));
    rows.push(row(
        Role::AssistantManager,
        60,
        false,
        &[
            ViewStaff,
            ViewOrders,
            ManageOrders,
            ProcessPayments,
            ManageReturns,
            ManageInventory,
            ManagePurchasing,
            FulfilSupplierOrders,
            SubmitTimesheets,
            ManageTimesheets,
            ApproveTimesheets,
            RequestAdvances,
            ViewReports,
        ],
    ));
    rows.push(row(
        Role::Supervisor,
        50,
        false,
        &[
            ViewStaff,
            ViewOrders,
            ManageOrders,
            ProcessPayments,
            ManageReturns,
            ManageInventory,
            SubmitTimesheets,
            ApproveTimesheets,
            RequestAdvances,
        ],
    ));
    rows.push(row(
        Role::SalesRep,
        30,
        false,
        &[ViewOrders, ManageOrders, ProcessPayments, SubmitTimesheets, RequestAdvances],
    ));
    rows.push(row(
        Role::Cashier,
        20,
        false,
        &[ViewOrders, ProcessPayments, SubmitTimesheets, RequestAdvances],
    ));
    rows.push(row(
        Role::StockClerk,
        10,
        false,
        &[ManageInventory, SubmitTimesheets, RequestAdvances],
    ));

    rows
}

/// Roles whose table rows differ between two tables (used when logging overrides).
pub(crate) fn changed_roles(before: &[RoleSpec], after: &[RoleSpec]) -> Vec<Role> {
    let before: HashSet<&RoleSpec> = before.iter().collect();
    let mut changed: Vec<Role> = after
        .iter()
        .filter(|spec| !before.contains(spec))
        .map(|spec| spec.role)
        .collect();
    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> RoleHierarchy {
        RoleHierarchy::from_specs(Role::Owner, standard_roles()).unwrap()
    }

    #[test]
    fn owner_and_general_manager_levels() {
        let h = standard();
        assert_eq!(h.level(Role::Owner), 100);
        assert_eq!(h.level(Role::GeneralManager), 90);
    }

    #[test]
    fn owner_can_assign_general_manager_but_not_the_reverse() {
        let h = standard();
        assert!(h.can_assign(Role::Owner, Role::GeneralManager));
        assert!(!h.can_assign(Role::GeneralManager, Role::Owner));
    }

    #[test]
    fn top_role_is_never_assignable_even_by_itself() {
        let h = standard();
        for role in Role::ALL {
            assert!(!h.can_assign(role, Role::Owner), "{role} assigned owner");
        }
    }

    #[test]
    fn equal_levels_never_outrank() {
        let h = standard();
        for role in Role::ALL {
            assert!(!h.outranks(role, role));
            assert!(!h.can_assign(role, role));
        }
    }

    #[test]
    fn only_the_two_senior_operational_roles_are_global_in_tenants() {
        let h = standard();
        let global: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| h.is_global(*r) && !h.is_cross_tenant(*r))
            .collect();
        assert_eq!(global, vec![Role::Owner, Role::GeneralManager]);
    }

    #[test]
    fn store_manager_holds_manage_payroll() {
        let h = standard();
        assert!(h.has_capability(Role::StoreManager, Capability::ManagePayroll));
        assert!(!h.has_capability(Role::StoreManager, Capability::ApprovePayroll));
    }

    #[test]
    fn by_seniority_is_strictly_descending() {
        let h = standard();
        let levels: Vec<u32> = h.by_seniority().into_iter().map(|r| h.level(r)).collect();
        assert!(levels.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(h.by_seniority()[0], Role::SuperAdmin);
    }

    #[test]
    fn holders_of_capability_are_listed_most_senior_first() {
        let h = standard();
        let holders = h.holders_of(Capability::DisburseFunds);
        assert_eq!(holders, vec![Role::Owner, Role::GeneralManager, Role::Accountant]);
    }

    #[test]
    fn duplicate_levels_are_rejected() {
        let mut specs = standard_roles();
        for spec in specs.iter_mut() {
            if spec.role == Role::Cashier {
                spec.level = 30;
            }
        }
        let err = RoleHierarchy::from_specs(Role::Owner, specs).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLevel { level: 30, .. }));
    }

    #[test]
    fn missing_role_is_rejected() {
        let specs: Vec<RoleSpec> = standard_roles()
            .into_iter()
            .filter(|s| s.role != Role::StockClerk)
            .collect();
        let err = RoleHierarchy::from_specs(Role::Owner, specs).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRole(Role::StockClerk)));
    }

    #[test]
    fn tenant_role_above_the_top_role_is_rejected() {
        let mut specs = standard_roles();
        for spec in specs.iter_mut() {
            if spec.role == Role::GeneralManager {
                spec.level = 150;
            }
        }
        let err = RoleHierarchy::from_specs(Role::Owner, specs).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TopRoleNotSenior {
                top: Role::Owner,
                other: Role::GeneralManager
            }
        ));
    }

    #[test]
    fn platform_capability_on_tenant_role_is_rejected() {
        let mut specs = standard_roles();
        for spec in specs.iter_mut() {
            if spec.role == Role::Owner {
                spec.capabilities.insert(Capability::ManagePlatform);
            }
        }
        let err = RoleHierarchy::from_specs(Role::Owner, specs).unwrap_err();
        assert!(matches!(err, ConfigError::PlatformCapabilityOnTenantRole { .. }));
    }

    #[test]
    fn changed_roles_reports_modified_rows() {
        let before = standard_roles();
        let mut after = standard_roles();
        for spec in after.iter_mut() {
            if spec.role == Role::Supervisor {
                spec.capabilities.insert(Capability::ApproveAdvances);
            }
        }
        assert_eq!(changed_roles(&before, &after), vec![Role::Supervisor]);
    }
}
