//! `shopgate-core`: shared domain primitives.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! identifiers for the tenant/shop/user boundaries and the tenant scoping trait.

pub mod error;
pub mod id;
pub mod tenant;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, ShopId, TenantId, UserId};
pub use tenant::TenantScoped;
