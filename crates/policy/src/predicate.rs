//! Composable checks that ability tables are built from.
//!
//! Every ability is a tree of [`Check`] leaves joined by `all_of` / `any_of`.
//! Evaluation is ordered and short-circuiting: `all_of` stops at the first
//! denial and reports it, `any_of` stops at the first grant and otherwise
//! reports the denial of its last alternative. Tables therefore list special
//! cases (ownership, platform access) first and the general staff path last.

use std::collections::BTreeSet;

use shopgate_core::TenantScoped;

use crate::ability::{Ability, AbilityContext, Target};
use crate::actor::Actor;
use crate::authorize::{Decision, ReasonCode, TraceStep};
use crate::error::PolicyError;
use crate::lifecycle::{Gate, LifecycleGate, Transition};
use crate::permissions::Capability;
use crate::resource::{Field, ResourceKind, ResourceSnapshot};
use crate::roles::RoleHierarchy;
use crate::scope::{ScopeResolver, ScopeTarget};

/// Which party of a two-tenant resource the actor must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The tenant that owns the resource (`tenant_id`).
    Buyer,
    /// The counterparty tenant (`counterparty_tenant_id`).
    Supplier,
}

/// A single leaf check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Actor's tenant equals the target's tenant.
    SameTenant,
    /// Actor's tenant is the given side of a bilateral resource.
    OnSide(Side),
    /// Actor holds a cross-tenant role with the platform capability.
    Platform,
    Staff,
    Customer,
    /// Actor is the account that provisioned the tenant.
    TenantOwner,
    HasCapability(Capability),
    /// `can_assign(actor.role, context.candidate_role)`.
    CanAssignCandidate,
    /// Actor is strictly senior to the resource owner's role.
    OutranksOwner,
    /// The resource owner does not hold the top role.
    OwnerNotTopRole,
    IsOwner,
    IsCustomer,
    /// Actor is not the resource owner (no self-action).
    NotOwner,
    ShopScope,
    Lifecycle(Transition),
    /// The resource still carries an unsettled balance.
    BalanceOutstanding,
}

impl Check {
    /// Snapshot field the check reads, if any.
    pub fn reads(&self) -> Option<Field> {
        match self {
            Check::OnSide(Side::Supplier) => Some(Field::Counterparty),
            Check::OutranksOwner | Check::OwnerNotTopRole => Some(Field::OwnerRole),
            Check::IsOwner | Check::NotOwner => Some(Field::Owner),
            Check::IsCustomer => Some(Field::Customer),
            Check::ShopScope => Some(Field::Shops),
            Check::Lifecycle(_) => Some(Field::Status),
            Check::BalanceOutstanding => Some(Field::BalanceSettled),
            _ => None,
        }
    }

    /// Checks that only make sense against a concrete resource.
    pub fn is_instance_only(&self) -> bool {
        matches!(
            self,
            Check::OnSide(_)
                | Check::OutranksOwner
                | Check::OwnerNotTopRole
                | Check::IsOwner
                | Check::IsCustomer
                | Check::NotOwner
                | Check::Lifecycle(_)
                | Check::BalanceOutstanding
        )
    }

    fn is_tenancy(&self) -> bool {
        matches!(self, Check::SameTenant | Check::OnSide(_) | Check::Platform)
    }
}

impl core::fmt::Display for Check {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Check::SameTenant => f.write_str("same_tenant"),
            Check::OnSide(Side::Buyer) => f.write_str("on_side(buyer)"),
            Check::OnSide(Side::Supplier) => f.write_str("on_side(supplier)"),
            Check::Platform => f.write_str("platform"),
            Check::Staff => f.write_str("staff"),
            Check::Customer => f.write_str("customer"),
            Check::TenantOwner => f.write_str("tenant_owner"),
            Check::HasCapability(c) => write!(f, "has_capability({c})"),
            Check::CanAssignCandidate => f.write_str("can_assign_candidate"),
            Check::OutranksOwner => f.write_str("outranks_owner"),
            Check::OwnerNotTopRole => f.write_str("owner_not_top_role"),
            Check::IsOwner => f.write_str("is_owner"),
            Check::IsCustomer => f.write_str("is_customer"),
            Check::NotOwner => f.write_str("not_owner"),
            Check::ShopScope => f.write_str("shop_scope"),
            Check::Lifecycle(t) => write!(f, "lifecycle({t})"),
            Check::BalanceOutstanding => f.write_str("balance_outstanding"),
        }
    }
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Check(Check),
    AllOf(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
}

impl From<Check> for Predicate {
    fn from(value: Check) -> Self {
        Predicate::Check(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructors used by the ability tables
// ─────────────────────────────────────────────────────────────────────────────

pub fn all_of(children: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::AllOf(children.into_iter().collect())
}

pub fn any_of(children: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::AnyOf(children.into_iter().collect())
}

pub fn same_tenant() -> Predicate {
    Check::SameTenant.into()
}

pub fn on_side(side: Side) -> Predicate {
    Check::OnSide(side).into()
}

pub fn platform() -> Predicate {
    Check::Platform.into()
}

pub fn staff() -> Predicate {
    Check::Staff.into()
}

pub fn customer() -> Predicate {
    Check::Customer.into()
}

pub fn tenant_owner() -> Predicate {
    Check::TenantOwner.into()
}

pub fn cap(capability: Capability) -> Predicate {
    Check::HasCapability(capability).into()
}

pub fn can_assign_candidate() -> Predicate {
    Check::CanAssignCandidate.into()
}

pub fn outranks_owner() -> Predicate {
    Check::OutranksOwner.into()
}

pub fn owner_not_top_role() -> Predicate {
    Check::OwnerNotTopRole.into()
}

pub fn is_owner() -> Predicate {
    Check::IsOwner.into()
}

pub fn is_customer() -> Predicate {
    Check::IsCustomer.into()
}

pub fn not_owner() -> Predicate {
    Check::NotOwner.into()
}

pub fn shop_scope() -> Predicate {
    Check::ShopScope.into()
}

pub fn lifecycle(transition: Transition) -> Predicate {
    Check::Lifecycle(transition).into()
}

pub fn balance_outstanding() -> Predicate {
    Check::BalanceOutstanding.into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Static analysis (registration-time)
// ─────────────────────────────────────────────────────────────────────────────

impl Predicate {
    /// Whether `holds` is satisfied on every path to a grant.
    ///
    /// A leaf enforces it if it matches; `all_of` if any child does; `any_of`
    /// only if every alternative does.
    pub fn enforces(&self, holds: &impl Fn(&Check) -> bool) -> bool {
        match self {
            Predicate::Check(check) => holds(check),
            Predicate::AllOf(children) => children.iter().any(|c| c.enforces(holds)),
            Predicate::AnyOf(children) => {
                !children.is_empty() && children.iter().all(|c| c.enforces(holds))
            }
        }
    }

    pub fn enforces_tenancy(&self) -> bool {
        self.enforces(&Check::is_tenancy)
    }

    pub fn enforces_lifecycle(&self) -> bool {
        self.enforces(&|check| matches!(check, Check::Lifecycle(_)))
    }

    /// Whether some path can grant to an actor outside the target's tenant.
    pub fn admits_cross_tenant(&self) -> bool {
        self.any_check(&|check| matches!(check, Check::Platform | Check::OnSide(Side::Supplier)))
    }

    pub fn any_check(&self, pred: &impl Fn(&Check) -> bool) -> bool {
        match self {
            Predicate::Check(check) => pred(check),
            Predicate::AllOf(children) | Predicate::AnyOf(children) => {
                children.iter().any(|c| c.any_check(pred))
            }
        }
    }

    /// Fields read anywhere in the tree.
    pub fn fields(&self) -> BTreeSet<Field> {
        let mut out = BTreeSet::new();
        self.visit(&mut |check| {
            if let Some(field) = check.reads() {
                out.insert(field);
            }
        });
        out
    }

    /// Lifecycle transitions gated anywhere in the tree, in order.
    pub fn transitions(&self) -> Vec<Transition> {
        let mut out = Vec::new();
        self.visit(&mut |check| {
            if let Check::Lifecycle(t) = check {
                if !out.contains(t) {
                    out.push(*t);
                }
            }
        });
        out
    }

    fn visit(&self, f: &mut impl FnMut(&Check)) {
        match self {
            Predicate::Check(check) => f(check),
            Predicate::AllOf(children) | Predicate::AnyOf(children) => {
                for child in children {
                    child.visit(f);
                }
            }
        }
    }

    fn label(&self) -> String {
        match self {
            Predicate::Check(check) => check.to_string(),
            Predicate::AllOf(_) => "all_of".to_string(),
            Predicate::AnyOf(_) => "any_of".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Optional sink for evaluated steps.
pub(crate) struct Recorder<'t> {
    steps: Option<&'t mut Vec<TraceStep>>,
}

impl<'t> Recorder<'t> {
    pub(crate) fn off() -> Self {
        Self { steps: None }
    }

    pub(crate) fn capture(steps: &'t mut Vec<TraceStep>) -> Self {
        Self { steps: Some(steps) }
    }

    fn open(&mut self, depth: usize, predicate: &Predicate) -> Option<usize> {
        let steps = self.steps.as_deref_mut()?;
        steps.push(TraceStep {
            depth,
            check: predicate.label(),
            passed: false,
            reason: ReasonCode::Granted,
        });
        Some(steps.len() - 1)
    }

    fn close(&mut self, slot: Option<usize>, decision: Decision) {
        if let (Some(steps), Some(i)) = (self.steps.as_deref_mut(), slot) {
            steps[i].passed = decision.allowed;
            steps[i].reason = decision.reason;
        }
    }
}

/// Everything one evaluation reads.
pub(crate) struct Env<'a> {
    pub hierarchy: &'a RoleHierarchy,
    pub lifecycle: &'a LifecycleGate,
    pub actor: &'a Actor,
    pub kind: ResourceKind,
    pub ability: Ability,
    pub target: Target,
    /// The resource for instance abilities, the parent for parent-targeted ones.
    pub subject: Option<&'a ResourceSnapshot>,
    pub context: &'a AbilityContext,
}

fn verdict(ok: bool, reason: ReasonCode) -> Decision {
    if ok {
        Decision::allow()
    } else {
        Decision::deny(reason)
    }
}

impl Predicate {
    pub(crate) fn evaluate(
        &self,
        env: &Env<'_>,
        recorder: &mut Recorder<'_>,
        depth: usize,
    ) -> Result<Decision, PolicyError> {
        let slot = recorder.open(depth, self);
        let decision = match self {
            Predicate::Check(check) => env.check(check)?,
            Predicate::AllOf(children) => {
                let mut out = Decision::allow();
                for child in children {
                    let d = child.evaluate(env, recorder, depth + 1)?;
                    if !d.allowed {
                        out = d;
                        break;
                    }
                }
                out
            }
            Predicate::AnyOf(children) => {
                let mut out = Decision::deny(ReasonCode::RoleInsufficient);
                for child in children {
                    out = child.evaluate(env, recorder, depth + 1)?;
                    if out.allowed {
                        break;
                    }
                }
                out
            }
        };
        recorder.close(slot, decision);
        Ok(decision)
    }
}

impl Env<'_> {
    fn subject(&self) -> Result<&ResourceSnapshot, PolicyError> {
        self.subject.ok_or(PolicyError::MissingResource {
            kind: self.kind,
            ability: self.ability,
        })
    }

    /// User ids are only unique within a tenant, so ownership needs both to match.
    fn actor_owns(&self) -> Result<bool, PolicyError> {
        let subject = self.subject()?;
        Ok(self.actor.as_staff().is_some_and(|s| {
            s.tenant_id == subject.tenant_id && subject.owner == Some(s.id)
        }))
    }

    fn check(&self, check: &Check) -> Result<Decision, PolicyError> {
        use ReasonCode::*;

        let h = self.hierarchy;
        let staff = self.actor.as_staff();
        let actor_tenant = self.actor.tenant_id();

        let decision = match check {
            Check::SameTenant => {
                let same = match self.subject {
                    Some(subject) => subject.shares_tenant_with(self.actor),
                    None => self.context.tenant_id.unwrap_or(actor_tenant) == actor_tenant,
                };
                verdict(same, TenantMismatch)
            }
            Check::OnSide(Side::Buyer) => {
                verdict(self.subject()?.tenant_id == actor_tenant, TenantMismatch)
            }
            Check::OnSide(Side::Supplier) => verdict(
                self.subject()?.counterparty_tenant_id == Some(actor_tenant),
                TenantMismatch,
            ),
            Check::Platform => verdict(
                staff.is_some_and(|s| {
                    h.is_cross_tenant(s.role) && h.has_capability(s.role, Capability::ManagePlatform)
                }),
                RoleInsufficient,
            ),
            Check::Staff => verdict(staff.is_some(), RoleInsufficient),
            Check::Customer => verdict(self.actor.as_customer().is_some(), RoleInsufficient),
            Check::TenantOwner => verdict(staff.is_some_and(|s| s.is_tenant_owner), OwnershipRequired),
            Check::HasCapability(capability) => verdict(
                staff.is_some_and(|s| h.has_capability(s.role, *capability)),
                RoleInsufficient,
            ),
            Check::CanAssignCandidate => {
                let candidate =
                    self.context
                        .candidate_role
                        .ok_or(PolicyError::MissingCandidateRole {
                            kind: self.kind,
                            ability: self.ability,
                        })?;
                verdict(
                    staff.is_some_and(|s| h.can_assign(s.role, candidate)),
                    RoleInsufficient,
                )
            }
            Check::OutranksOwner => {
                let subject = self.subject()?;
                let owner_role = subject.owner_role.ok_or(PolicyError::MissingField {
                    kind: subject.kind,
                    field: Field::OwnerRole,
                })?;
                verdict(
                    staff.is_some_and(|s| h.outranks(s.role, owner_role)),
                    RoleInsufficient,
                )
            }
            Check::OwnerNotTopRole => verdict(
                self.subject()?.owner_role != Some(h.top_role()),
                RoleInsufficient,
            ),
            Check::IsOwner => verdict(self.actor_owns()?, OwnershipRequired),
            Check::IsCustomer => {
                let customer = self.subject()?.customer;
                verdict(
                    self.actor.as_customer().is_some_and(|c| customer == Some(c.id)),
                    OwnershipRequired,
                )
            }
            Check::NotOwner => verdict(!self.actor_owns()?, SelfActionForbidden),
            Check::ShopScope => self.shop_scope(),
            Check::Lifecycle(transition) => self.lifecycle(*transition)?,
            Check::BalanceOutstanding => {
                let subject = self.subject()?;
                let settled = subject.balance_settled.ok_or(PolicyError::MissingField {
                    kind: subject.kind,
                    field: Field::BalanceSettled,
                })?;
                verdict(!settled, LifecycleBlocked)
            }
        };
        Ok(decision)
    }

    fn shop_scope(&self) -> Decision {
        let Some(staff) = self.actor.as_staff() else {
            return Decision::deny(ReasonCode::RoleInsufficient);
        };
        let subject_shops = self.subject.and_then(|s| s.shops.as_ref());
        let target = match self.target {
            Target::Instance => subject_shops.map_or(ScopeTarget::TenantWide, ScopeTarget::Shops),
            Target::Parent(_) => subject_shops
                .or(self.context.target_shops.as_ref())
                .map_or(ScopeTarget::TenantWide, ScopeTarget::Shops),
            Target::Collection => self
                .context
                .target_shops
                .as_ref()
                .map_or(ScopeTarget::AnyAssigned, ScopeTarget::Shops),
        };
        verdict(
            ScopeResolver::new(self.hierarchy).permits(staff.role, &staff.shops, target),
            ReasonCode::ScopeMismatch,
        )
    }

    fn lifecycle(&self, transition: Transition) -> Result<Decision, PolicyError> {
        let subject = self.subject()?;
        let status = subject.status.as_ref().ok_or(PolicyError::MissingField {
            kind: subject.kind,
            field: Field::Status,
        })?;
        Ok(match self.lifecycle.check(subject.kind, status, transition)? {
            Gate::Open => Decision::allow(),
            Gate::OverrideOnly => verdict(
                self.actor.role() == Some(self.hierarchy.top_role()),
                ReasonCode::RoleInsufficient,
            ),
            Gate::Blocked => Decision::deny(ReasonCode::LifecycleBlocked),
        })
    }
}
