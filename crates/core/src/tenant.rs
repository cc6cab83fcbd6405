use crate::TenantId;

/// Helper trait for tenant-scoped values.
///
/// Marks types that belong to exactly one tenant. Actors and resource
/// snapshots implement it so tenant isolation checks can be written once,
/// against the trait, instead of per type.
///
/// ```ignore
/// fn same_tenant(a: &impl TenantScoped, b: &impl TenantScoped) -> bool {
///     a.tenant_id() == b.tenant_id()
/// }
/// ```
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;

    /// Whether `other` lives in the same tenant as `self`.
    fn shares_tenant_with(&self, other: &impl TenantScoped) -> bool
    where
        Self: Sized,
    {
        self.tenant_id() == other.tenant_id()
    }
}
