#![allow(dead_code)]

use std::sync::LazyLock;

use shopgate_core::{CustomerId, TenantId, UserId};
use shopgate_policy::{
    AbilityContext, Actor, PolicyRegistry, ResourceKind, ResourceSnapshot, Role, ShopSet,
    StaffActor, Status, Target,
};

pub static REGISTRY: LazyLock<PolicyRegistry> = LazyLock::new(|| {
    shopgate_observability::init();
    PolicyRegistry::standard().expect("standard policy tables are valid")
});

pub fn registry() -> &'static PolicyRegistry {
    &REGISTRY
}

pub fn staff(tenant: TenantId, id: u64, role: Role, shops: &[u64]) -> Actor {
    StaffActor::new(UserId::new(id), tenant, role)
        .with_shops(shops.iter().copied().map(shopgate_core::ShopId::new).collect())
        .into()
}

pub fn customer(tenant: TenantId, id: u64) -> Actor {
    Actor::customer(CustomerId::new(id), tenant)
}

/// A snapshot carrying every optional field, so any ability of `kind` can be
/// evaluated against it without a missing-field error.
pub fn full_snapshot(
    kind: ResourceKind,
    tenant: TenantId,
    counterparty: TenantId,
    status: Option<Status>,
    owner: u64,
    owner_role: Role,
) -> ResourceSnapshot {
    let mut snapshot = ResourceSnapshot::new(kind, tenant)
        .with_shops(ShopSet::from([1]))
        .with_owner(UserId::new(owner), owner_role)
        .with_customer(CustomerId::new(owner))
        .with_counterparty(counterparty)
        .with_balance_settled(false);
    snapshot.status = status;
    snapshot
}

/// First status of `kind`'s table (alphabetical), if it has one.
pub fn some_status(kind: ResourceKind, pick: usize) -> Option<Status> {
    let table = registry().lifecycle().table(kind).ok()?;
    let statuses: Vec<&Status> = table.statuses().collect();
    Some(statuses[pick % statuses.len()].clone())
}

/// Context that satisfies every ability's inputs for `target`.
pub fn context_for(
    target: Target,
    tenant: TenantId,
    counterparty: TenantId,
    pick: usize,
) -> AbilityContext {
    let mut context = AbilityContext::new()
        .in_tenant(tenant)
        .with_candidate_role(Role::Cashier)
        .with_target_shops(ShopSet::from([1]));
    if let Target::Parent(parent) = target {
        context = context.with_parent(full_snapshot(
            parent,
            tenant,
            counterparty,
            some_status(parent, pick),
            900,
            Role::SalesRep,
        ));
    }
    context
}
