//! Error model of the policy engine.
//!
//! Ordinary denials are not errors: they are `Decision { allowed: false, .. }`.
//! The types here describe integration and configuration bugs, which must
//! surface as `Err` and never be folded into a deny.

use std::path::PathBuf;

use thiserror::Error;

use crate::ability::Ability;
use crate::lifecycle::{Status, Transition};
use crate::permissions::Capability;
use crate::resource::{Field, ResourceKind};
use crate::roles::Role;

/// A caller asked something the registry cannot answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("unknown resource kind '{0}'")]
    UnknownResourceKind(String),

    #[error("resource kind '{0}' is not registered")]
    UnregisteredResource(ResourceKind),

    #[error("ability '{ability}' is not registered for '{kind}'")]
    AbilityNotRegistered { kind: ResourceKind, ability: Ability },

    #[error("'{kind}.{ability}' requires a resource snapshot")]
    MissingResource { kind: ResourceKind, ability: Ability },

    #[error("'{kind}.{ability}' requires a parent '{parent}' in the context")]
    MissingParent {
        kind: ResourceKind,
        ability: Ability,
        parent: ResourceKind,
    },

    #[error("'{kind}.{ability}' requires a candidate role in the context")]
    MissingCandidateRole { kind: ResourceKind, ability: Ability },

    #[error("expected a '{expected}' snapshot, got '{actual}'")]
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("'{kind}' snapshot is missing required field '{field}'")]
    MissingField { kind: ResourceKind, field: Field },

    #[error("'{status}' is not a status of '{kind}'")]
    UnknownStatus { kind: ResourceKind, status: Status },

    #[error("no lifecycle table for '{0}'")]
    NoLifecycleTable(ResourceKind),
}

/// The policy configuration (role table, lifecycle tables, ability tables)
/// failed to load or validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read policy config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{var} is not valid unicode: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid policy config JSON: {0}")]
    Json(#[from] serde_json::Error),

    // Role table
    #[error("role '{0}' is defined more than once")]
    DuplicateRole(Role),

    #[error("role '{0}' is not defined")]
    MissingRole(Role),

    #[error("roles '{first}' and '{second}' share level {level}")]
    DuplicateLevel { level: u32, first: Role, second: Role },

    #[error("top role '{top}' must be more senior than '{other}'")]
    TopRoleNotSenior { top: Role, other: Role },

    #[error("top role '{0}' cannot be cross-tenant")]
    TopRoleCrossTenant(Role),

    #[error("tenant role '{role}' cannot hold platform capability '{capability}'")]
    PlatformCapabilityOnTenantRole { role: Role, capability: Capability },

    // Lifecycle tables
    #[error("lifecycle table for '{0}' is defined more than once")]
    DuplicateLifecycle(ResourceKind),

    #[error("status '{status}' of '{kind}' is defined more than once")]
    DuplicateStatus { kind: ResourceKind, status: Status },

    #[error("lifecycle table for '{0}' has no terminal status")]
    NoTerminalStatus(ResourceKind),

    #[error("'{transition}' is both a transition and an override of '{kind}.{status}'")]
    OverlappingOverride {
        kind: ResourceKind,
        status: Status,
        transition: Transition,
    },

    #[error("terminal status '{kind}.{status}' cannot carry transition '{transition}'")]
    TerminalTransition {
        kind: ResourceKind,
        status: Status,
        transition: Transition,
    },

    #[error("'{0}' carries a status but has no lifecycle table")]
    MissingLifecycle(ResourceKind),

    #[error("lifecycle table for '{0}' belongs to no status-bearing resource")]
    UnusedLifecycle(ResourceKind),

    // Ability tables
    #[error("resource kind '{0}' is registered more than once")]
    DuplicateResource(ResourceKind),

    #[error("ability '{kind}.{ability}' is registered more than once")]
    DuplicateAbility { kind: ResourceKind, ability: Ability },

    #[error("ability '{kind}.{ability}' does not enforce tenant isolation")]
    TenancyNotEnforced { kind: ResourceKind, ability: Ability },

    #[error("ability '{kind}.{ability}' reads '{field}', which '{target}' does not declare")]
    UndeclaredField {
        kind: ResourceKind,
        ability: Ability,
        target: ResourceKind,
        field: Field,
    },

    #[error("collection ability '{kind}.{ability}' uses an instance-only check")]
    InstanceOnlyPredicate { kind: ResourceKind, ability: Ability },

    #[error("mutating ability '{kind}.{ability}' has no lifecycle check")]
    UngatedMutation { kind: ResourceKind, ability: Ability },

    #[error("ability '{kind}.{ability}' gates '{transition}', which no status of '{target}' reaches")]
    UnreachableTransition {
        kind: ResourceKind,
        ability: Ability,
        target: ResourceKind,
        transition: Transition,
    },

    #[error("ability '{kind}.{ability}' targets unregistered parent '{parent}'")]
    UnregisteredParent {
        kind: ResourceKind,
        ability: Ability,
        parent: ResourceKind,
    },
}
