//! Named abilities and the context they are evaluated in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shopgate_core::TenantId;

use crate::error::PolicyError;
use crate::predicate::Predicate;
use crate::resource::{ResourceKind, ResourceSnapshot};
use crate::roles::Role;
use crate::scope::ShopSet;

/// A named, resource-kind-specific permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ability {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    UpdateOwnProfile,
    AssignRole,
    Suspend,
    Calculate,
    Submit,
    Approve,
    Reject,
    Complete,
    Cancel,
    Regenerate,
    Disburse,
    RecordRepayment,
    Review,
    Process,
    Reprocess,
    MarkPaid,
    Reopen,
    Confirm,
    Refund,
    Ship,
    Receive,
    Disconnect,
}

impl Ability {
    pub const ALL: [Ability; 27] = [
        Ability::ViewAny,
        Ability::View,
        Ability::Create,
        Ability::Update,
        Ability::Delete,
        Ability::UpdateOwnProfile,
        Ability::AssignRole,
        Ability::Suspend,
        Ability::Calculate,
        Ability::Submit,
        Ability::Approve,
        Ability::Reject,
        Ability::Complete,
        Ability::Cancel,
        Ability::Regenerate,
        Ability::Disburse,
        Ability::RecordRepayment,
        Ability::Review,
        Ability::Process,
        Ability::Reprocess,
        Ability::MarkPaid,
        Ability::Reopen,
        Ability::Confirm,
        Ability::Refund,
        Ability::Ship,
        Ability::Receive,
        Ability::Disconnect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::ViewAny => "viewAny",
            Ability::View => "view",
            Ability::Create => "create",
            Ability::Update => "update",
            Ability::Delete => "delete",
            Ability::UpdateOwnProfile => "updateOwnProfile",
            Ability::AssignRole => "assignRole",
            Ability::Suspend => "suspend",
            Ability::Calculate => "calculate",
            Ability::Submit => "submit",
            Ability::Approve => "approve",
            Ability::Reject => "reject",
            Ability::Complete => "complete",
            Ability::Cancel => "cancel",
            Ability::Regenerate => "regenerate",
            Ability::Disburse => "disburse",
            Ability::RecordRepayment => "recordRepayment",
            Ability::Review => "review",
            Ability::Process => "process",
            Ability::Reprocess => "reprocess",
            Ability::MarkPaid => "markPaid",
            Ability::Reopen => "reopen",
            Ability::Confirm => "confirm",
            Ability::Refund => "refund",
            Ability::Ship => "ship",
            Ability::Receive => "receive",
            Ability::Disconnect => "disconnect",
        }
    }

    /// Everything except reads changes the resource.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Ability::View | Ability::ViewAny)
    }

    /// Approval-type abilities, which always forbid acting on one's own record.
    pub fn is_approval(&self) -> bool {
        matches!(self, Ability::Approve | Ability::Reject | Ability::Disburse)
    }
}

impl core::fmt::Display for Ability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ability {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ability::ALL
            .into_iter()
            .find(|ability| ability.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownAbility(s.to_string()))
    }
}

/// Optional inputs keyed by ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityContext {
    /// Tenant a collection query runs in. Defaults to the actor's tenant.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Parent the new resource is created under (an order for a payment).
    #[serde(default)]
    pub parent: Option<ResourceSnapshot>,
    /// Role being handed out by `assignRole`.
    #[serde(default)]
    pub candidate_role: Option<Role>,
    /// Shops a collection query or creation targets.
    #[serde(default)]
    pub target_shops: Option<ShopSet>,
}

impl AbilityContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_parent(mut self, parent: ResourceSnapshot) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_candidate_role(mut self, role: Role) -> Self {
        self.candidate_role = Some(role);
        self
    }

    pub fn with_target_shops(mut self, shops: ShopSet) -> Self {
        self.target_shops = Some(shops);
        self
    }
}

/// What an ability is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An existing resource of the registered kind.
    Instance,
    /// The kind as a whole (`viewAny`, shop-targeted `create`).
    Collection,
    /// A parent resource supplied through [`AbilityContext::parent`].
    Parent(ResourceKind),
}

/// One registered ability: its target and its predicate tree.
#[derive(Debug, Clone)]
pub struct AbilitySpec {
    pub ability: Ability,
    pub target: Target,
    pub predicate: Predicate,
}

impl AbilitySpec {
    pub fn instance(ability: Ability, predicate: Predicate) -> Self {
        Self {
            ability,
            target: Target::Instance,
            predicate,
        }
    }

    pub fn collection(ability: Ability, predicate: Predicate) -> Self {
        Self {
            ability,
            target: Target::Collection,
            predicate,
        }
    }

    pub fn under(ability: Ability, parent: ResourceKind, predicate: Predicate) -> Self {
        Self {
            ability,
            target: Target::Parent(parent),
            predicate,
        }
    }

    /// Whether a grant may come from a tenant other than the target's.
    pub fn is_cross_tenant(&self) -> bool {
        self.predicate.admits_cross_tenant()
    }
}
