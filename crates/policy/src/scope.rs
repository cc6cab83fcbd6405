//! Shop scoping primitives.
//!
//! Every shop-bound check in the engine goes through this module, so the rule
//! is written exactly once: global roles bypass scoping, everyone else needs a
//! non-empty intersection between their assignments and the target's shops.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use shopgate_core::ShopId;

use crate::roles::{Role, RoleHierarchy};

/// A set of shops (a staff member's assignments, or the shops a resource is tied to).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopSet(BTreeSet<ShopId>);

impl ShopSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(shop: ShopId) -> Self {
        Self(BTreeSet::from([shop]))
    }

    pub fn insert(&mut self, shop: ShopId) -> bool {
        self.0.insert(shop)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShopId> {
        self.0.iter()
    }

    /// Membership test. An empty set contains nothing.
    pub fn contains_shop(&self, shop: ShopId) -> bool {
        self.0.contains(&shop)
    }

    /// Non-empty intersection test.
    pub fn overlaps(&self, other: &ShopSet) -> bool {
        // Iterate the smaller side.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|shop| large.0.contains(shop))
    }
}

impl FromIterator<ShopId> for ShopSet {
    fn from_iter<I: IntoIterator<Item = ShopId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[u64; N]> for ShopSet {
    fn from(ids: [u64; N]) -> Self {
        ids.into_iter().map(ShopId::new).collect()
    }
}

/// Whether an actor assigned to `actor_shops` may touch something in `shop`.
pub fn overlaps_shop(actor_shops: &ShopSet, shop: ShopId) -> bool {
    actor_shops.contains_shop(shop)
}

/// Whether two shop sets share at least one shop.
pub fn overlaps(actor_shops: &ShopSet, target_shops: &ShopSet) -> bool {
    actor_shops.overlaps(target_shops)
}

/// What a scope check is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum ScopeTarget<'a> {
    /// A resource (or creation target) bound to these shops.
    Shops(&'a ShopSet),
    /// A tenant-wide resource with no shop binding.
    TenantWide,
    /// A collection query with no specific shop: the actor needs at least one
    /// assignment to see anything.
    AnyAssigned,
}

/// Applies shop scoping for a role.
#[derive(Debug, Clone, Copy)]
pub struct ScopeResolver<'a> {
    hierarchy: &'a RoleHierarchy,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(hierarchy: &'a RoleHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Global roles bypass scoping. Non-global roles never reach tenant-wide
    /// resources and otherwise need overlapping shops.
    pub fn permits(&self, role: Role, actor_shops: &ShopSet, target: ScopeTarget<'_>) -> bool {
        if self.hierarchy.is_global(role) {
            return true;
        }
        match target {
            ScopeTarget::Shops(shops) => overlaps(actor_shops, shops),
            ScopeTarget::TenantWide => false,
            ScopeTarget::AnyAssigned => !actor_shops.is_empty(),
        }
    }
}
