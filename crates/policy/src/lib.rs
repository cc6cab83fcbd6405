//! `shopgate-policy`: multi-tenant, multi-shop policy evaluation engine.
//!
//! Pure and synchronous: callers build [`Actor`] and [`ResourceSnapshot`]
//! values from their own records and ask the [`PolicyRegistry`] whether an
//! ability is permitted. The engine performs no IO and holds no ambient
//! "current user".
//!
//! Layers, leaves first:
//! - [`RoleHierarchy`]: seniority levels and explicit capability sets
//! - [`ScopeResolver`]: shop-assignment intersection
//! - [`LifecycleGate`]: per-kind status tables and the [`StatusGuard`] used
//!   inside a storage commit
//! - [`Predicate`]: composable checks that ability tables are written in
//! - [`PolicyRegistry`]: dispatch from `(kind, ability)` to a predicate

pub mod ability;
pub mod actor;
pub mod authorize;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod permissions;
pub mod predicate;
pub mod registry;
pub mod resource;
pub mod roles;
pub mod scope;

mod policies;

pub use ability::{Ability, AbilityContext, AbilitySpec, Target};
pub use actor::{Actor, CustomerActor, StaffActor};
pub use authorize::{AuthzError, Decision, Explanation, ReasonCode, TraceStep};
pub use config::{OVERRIDES_ENV, PolicyConfig, PolicyOverrides};
pub use error::{ConfigError, PolicyError};
pub use lifecycle::{Gate, LifecycleGate, LifecycleSpec, Status, StatusGuard, StatusSpec, Transition};
pub use permissions::Capability;
pub use predicate::{Check, Predicate, Side};
pub use registry::{PolicyRegistry, ResourcePolicy};
pub use resource::{Field, ResourceKind, ResourceShape, ResourceSnapshot};
pub use roles::{Role, RoleHierarchy, RoleSpec};
pub use scope::{ScopeResolver, ScopeTarget, ShopSet};
