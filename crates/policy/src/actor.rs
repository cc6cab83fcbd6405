use serde::{Deserialize, Serialize};

use shopgate_core::{CustomerId, TenantId, TenantScoped, UserId};

use crate::roles::{Role, RoleHierarchy};
use crate::scope::ShopSet;

/// The identity attempting an operation.
///
/// Built fresh by the caller for every evaluation from upstream records and
/// passed explicitly; the engine never looks up a "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Staff(StaffActor),
    Customer(CustomerActor),
}

/// A staff member acting within their tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffActor {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    /// Shops the staff member is assigned to.
    #[serde(default)]
    pub shops: ShopSet,
    /// Set for the account that provisioned the tenant.
    #[serde(default)]
    pub is_tenant_owner: bool,
}

/// A customer of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerActor {
    pub id: CustomerId,
    pub tenant_id: TenantId,
}

impl StaffActor {
    pub fn new(id: UserId, tenant_id: TenantId, role: Role) -> Self {
        Self {
            id,
            tenant_id,
            role,
            shops: ShopSet::new(),
            is_tenant_owner: false,
        }
    }

    pub fn with_shops(mut self, shops: ShopSet) -> Self {
        self.shops = shops;
        self
    }

    pub fn tenant_owner(mut self) -> Self {
        self.is_tenant_owner = true;
        self
    }

    /// Seniority of this actor according to `hierarchy`.
    pub fn level(&self, hierarchy: &RoleHierarchy) -> u32 {
        hierarchy.level(self.role)
    }
}

impl Actor {
    /// A staff actor with no shop assignments; build a [`StaffActor`] to set them.
    pub fn staff(id: UserId, tenant_id: TenantId, role: Role) -> Self {
        Actor::Staff(StaffActor::new(id, tenant_id, role))
    }

    pub fn customer(id: CustomerId, tenant_id: TenantId) -> Self {
        Actor::Customer(CustomerActor { id, tenant_id })
    }

    pub fn as_staff(&self) -> Option<&StaffActor> {
        match self {
            Actor::Staff(staff) => Some(staff),
            Actor::Customer(_) => None,
        }
    }

    pub fn as_customer(&self) -> Option<&CustomerActor> {
        match self {
            Actor::Customer(customer) => Some(customer),
            Actor::Staff(_) => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.as_staff().map(|s| s.role)
    }
}

impl From<StaffActor> for Actor {
    fn from(value: StaffActor) -> Self {
        Actor::Staff(value)
    }
}

impl From<CustomerActor> for Actor {
    fn from(value: CustomerActor) -> Self {
        Actor::Customer(value)
    }
}

impl TenantScoped for Actor {
    fn tenant_id(&self) -> TenantId {
        match self {
            Actor::Staff(s) => s.tenant_id,
            Actor::Customer(c) => c.tenant_id,
        }
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::Staff(s) => write!(f, "staff:{}({})", s.id, s.role),
            Actor::Customer(c) => write!(f, "customer:{}", c.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_json_is_tagged_by_kind() {
        let tenant = TenantId::new();
        let actor: Actor = StaffActor::new(UserId::new(42), tenant, Role::SalesRep)
            .with_shops(ShopSet::from([3]))
            .into();

        let json = serde_json::to_value(&actor).unwrap();
        assert_eq!(json["kind"], "staff");
        assert_eq!(json["role"], "sales_rep");
        assert_eq!(json["shops"], serde_json::json!([3]));

        let back: Actor = serde_json::from_value(json).unwrap();
        assert_eq!(back, actor);
    }

    #[test]
    fn staff_constructor_builds_an_unassigned_actor() {
        let tenant = TenantId::new();
        let actor = Actor::staff(UserId::new(9), tenant, Role::Cashier);
        assert_eq!(actor.role(), Some(Role::Cashier));
        assert!(actor.as_staff().is_some_and(|s| s.shops.is_empty()));
        assert_eq!(actor, StaffActor::new(UserId::new(9), tenant, Role::Cashier).into());
    }

    #[test]
    fn customers_have_no_role() {
        let actor = Actor::customer(CustomerId::new(5), TenantId::new());
        assert!(actor.role().is_none());
        assert!(actor.as_staff().is_none());
        assert_eq!(actor.to_string(), "customer:5");
    }
}
