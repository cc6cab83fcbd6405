//! Purchase orders and supplier connections.
//!
//! Both are shared by two tenants: `tenant_id` is the buyer and
//! `counterparty_tenant_id` the supplier. Every ability first decides which
//! side the actor is on; role checks only apply within that side. `owner` is
//! a buyer-side user, so supplier-side decisions never compare against it.

use crate::ability::{Ability, AbilitySpec};
use crate::lifecycle::Transition;
use crate::permissions::Capability::*;
use crate::predicate::{
    Predicate, Side, all_of, any_of, cap, lifecycle, on_side, same_tenant, shop_scope,
};
use crate::registry::ResourcePolicy;
use crate::resource::{Field, ResourceKind, ResourceShape};

fn bilateral_shape() -> ResourceShape {
    ResourceShape::new()
        .requires(Field::Status)
        .requires(Field::Counterparty)
        .optional(Field::Shops)
        .optional(Field::Owner)
}

fn buyer(transition: Transition) -> Predicate {
    all_of([
        on_side(Side::Buyer),
        cap(ManagePurchasing),
        shop_scope(),
        lifecycle(transition),
    ])
}

fn supplier(transition: Transition) -> Predicate {
    all_of([
        on_side(Side::Supplier),
        cap(FulfilSupplierOrders),
        lifecycle(transition),
    ])
}

/// `owner` is the buyer-side staff member who placed the order.
pub(super) fn purchase_order() -> ResourcePolicy {
    ResourcePolicy::new(ResourceKind::PurchaseOrder, bilateral_shape())
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            all_of([
                same_tenant(),
                any_of([cap(ManagePurchasing), cap(FulfilSupplierOrders)]),
                shop_scope(),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([on_side(Side::Buyer), cap(ManagePurchasing), shop_scope()]),
                all_of([on_side(Side::Supplier), cap(FulfilSupplierOrders)]),
            ]),
        ))
        .with(AbilitySpec::under(
            Ability::Create,
            ResourceKind::SupplierConnection,
            buyer(Transition::PlaceOrder),
        ))
        .with(AbilitySpec::instance(Ability::Update, buyer(Transition::Update)))
        .with(AbilitySpec::instance(Ability::Submit, buyer(Transition::Submit)))
        .with(AbilitySpec::instance(Ability::Delete, buyer(Transition::Delete)))
        .with(AbilitySpec::instance(Ability::Cancel, buyer(Transition::Cancel)))
        .with(AbilitySpec::instance(Ability::Confirm, supplier(Transition::Confirm)))
        .with(AbilitySpec::instance(Ability::Reject, supplier(Transition::Reject)))
        .with(AbilitySpec::instance(Ability::Ship, supplier(Transition::Ship)))
        .with(AbilitySpec::instance(
            Ability::Receive,
            all_of([
                on_side(Side::Buyer),
                cap(ManageInventory),
                shop_scope(),
                lifecycle(Transition::Receive),
            ]),
        ))
}

/// A buyer's standing relationship with a supplier tenant. `owner` is the
/// buyer-side staff member who requested it.
pub(super) fn supplier_connection() -> ResourcePolicy {
    let decide = |transition| {
        all_of([
            on_side(Side::Supplier),
            cap(ManageSuppliers),
            lifecycle(transition),
        ])
    };

    ResourcePolicy::new(ResourceKind::SupplierConnection, bilateral_shape())
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            all_of([
                same_tenant(),
                any_of([cap(ManageSuppliers), cap(FulfilSupplierOrders)]),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([on_side(Side::Buyer), cap(ManageSuppliers)]),
                all_of([on_side(Side::Supplier), cap(FulfilSupplierOrders)]),
            ]),
        ))
        .with(AbilitySpec::collection(
            Ability::Create,
            all_of([same_tenant(), cap(ManageSuppliers)]),
        ))
        .with(AbilitySpec::instance(Ability::Approve, decide(Transition::Approve)))
        .with(AbilitySpec::instance(Ability::Reject, decide(Transition::Reject)))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            all_of([
                on_side(Side::Buyer),
                cap(ManageSuppliers),
                lifecycle(Transition::Cancel),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::Disconnect,
            any_of([
                all_of([
                    on_side(Side::Buyer),
                    cap(ManageSuppliers),
                    lifecycle(Transition::Disconnect),
                ]),
                all_of([
                    on_side(Side::Supplier),
                    cap(ManageSuppliers),
                    lifecycle(Transition::Disconnect),
                ]),
            ]),
        ))
}
