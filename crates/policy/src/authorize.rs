use serde::Serialize;
use thiserror::Error;

use crate::ability::Ability;
use crate::error::PolicyError;
use crate::resource::ResourceKind;

/// Why a decision came out the way it did. A closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Granted,
    TenantMismatch,
    RoleInsufficient,
    ScopeMismatch,
    LifecycleBlocked,
    SelfActionForbidden,
    OwnershipRequired,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Granted => "granted",
            ReasonCode::TenantMismatch => "tenant_mismatch",
            ReasonCode::RoleInsufficient => "role_insufficient",
            ReasonCode::ScopeMismatch => "scope_mismatch",
            ReasonCode::LifecycleBlocked => "lifecycle_blocked",
            ReasonCode::SelfActionForbidden => "self_action_forbidden",
            ReasonCode::OwnershipRequired => "ownership_required",
        }
    }

    /// Short user-facing message for a 403 body.
    pub fn message(&self) -> &'static str {
        match self {
            ReasonCode::Granted => "allowed",
            ReasonCode::TenantMismatch => "the resource belongs to another tenant",
            ReasonCode::RoleInsufficient => "your role does not permit this action",
            ReasonCode::ScopeMismatch => "the resource is outside your assigned shops",
            ReasonCode::LifecycleBlocked => "the resource's current status does not allow this action",
            ReasonCode::SelfActionForbidden => "you cannot perform this action on your own record",
            ReasonCode::OwnershipRequired => "only the owner of this record may do this",
        }
    }
}

impl core::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one ability for one actor/resource pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: ReasonCode,
}

impl Decision {
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: ReasonCode::Granted,
        }
    }

    pub const fn deny(reason: ReasonCode) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Convert into the command-boundary form.
    pub fn into_result(self) -> Result<(), AuthzError> {
        if self.allowed {
            Ok(())
        } else {
            Err(AuthzError::Denied(self.reason))
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Ordinary denial; maps to a 403-class response.
    #[error("forbidden: {}", .0.message())]
    Denied(ReasonCode),

    /// Integration bug; maps to a 500-class response.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl AuthzError {
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            AuthzError::Denied(reason) => Some(*reason),
            AuthzError::Policy(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// One evaluated check, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    /// Nesting depth inside `all_of` / `any_of` combinators.
    pub depth: usize,
    pub check: String,
    pub passed: bool,
    /// `granted` when the check passed.
    pub reason: ReasonCode,
}

/// Detailed explanation of a decision.
///
/// Answers "why was this allowed/denied?" for audit logs and support tooling.
/// Checks skipped by short-circuiting do not appear in the trace.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub actor: String,
    pub kind: ResourceKind,
    pub ability: Ability,
    pub decision: Decision,
    /// Human-readable summary of the decision.
    pub summary: String,
    pub trace: Vec<TraceStep>,
}

impl Explanation {
    /// The first failed leaf check, if the decision was a denial.
    pub fn failed_check(&self) -> Option<&TraceStep> {
        if self.decision.allowed {
            return None;
        }
        self.trace
            .iter()
            .rev()
            .find(|step| !step.passed && step.reason == self.decision.reason)
    }
}
