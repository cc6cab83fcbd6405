//! Orders, payments and returns.

use crate::ability::{Ability, AbilitySpec};
use crate::lifecycle::Transition;
use crate::permissions::Capability::{self, *};
use crate::predicate::{
    Predicate, all_of, any_of, cap, customer, is_customer, is_owner, lifecycle, not_owner,
    same_tenant, shop_scope,
};
use crate::registry::ResourcePolicy;
use crate::resource::{Field, ResourceKind, ResourceShape};

/// Shop staff holding `capability`, gated on `transition`.
fn shop_transition(capability: Capability, transition: Transition) -> Predicate {
    all_of([
        same_tenant(),
        cap(capability),
        shop_scope(),
        lifecycle(transition),
    ])
}

fn shop_read(capability: Capability) -> Predicate {
    all_of([same_tenant(), cap(capability), shop_scope()])
}

pub(super) fn order() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Shops)
        .requires(Field::Status)
        .optional(Field::Customer)
        .optional(Field::Owner);

    ResourcePolicy::new(ResourceKind::Order, shape)
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            any_of([all_of([same_tenant(), customer()]), shop_read(ViewOrders)]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([all_of([same_tenant(), is_customer()]), shop_read(ViewOrders)]),
        ))
        .with(AbilitySpec::collection(
            Ability::Create,
            any_of([all_of([same_tenant(), customer()]), shop_read(ManageOrders)]),
        ))
        .with(AbilitySpec::instance(
            Ability::Update,
            shop_transition(ManageOrders, Transition::Update),
        ))
        .with(AbilitySpec::instance(
            Ability::Confirm,
            shop_transition(ManageOrders, Transition::Confirm),
        ))
        .with(AbilitySpec::instance(
            Ability::Complete,
            shop_transition(ManageOrders, Transition::Complete),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            all_of([
                same_tenant(),
                any_of([is_customer(), all_of([cap(ManageOrders), shop_scope()])]),
                lifecycle(Transition::Cancel),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::Delete,
            shop_transition(ManageOrders, Transition::Delete),
        ))
}

/// Payments are recorded against an order; `owner` is the staff member who
/// took the payment.
pub(super) fn payment() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Shops)
        .requires(Field::Status)
        .optional(Field::Owner);

    ResourcePolicy::new(ResourceKind::Payment, shape)
        .with(AbilitySpec::collection(Ability::ViewAny, shop_read(ViewOrders)))
        .with(AbilitySpec::instance(Ability::View, shop_read(ViewOrders)))
        .with(AbilitySpec::under(
            Ability::Create,
            ResourceKind::Order,
            shop_transition(ProcessPayments, Transition::RecordPayment),
        ))
        .with(AbilitySpec::instance(
            Ability::Complete,
            shop_transition(ProcessPayments, Transition::Complete),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            shop_transition(ProcessPayments, Transition::Cancel),
        ))
        .with(AbilitySpec::instance(
            Ability::Refund,
            all_of([
                same_tenant(),
                not_owner(),
                cap(RefundPayments),
                shop_scope(),
                lifecycle(Transition::Refund),
            ]),
        ))
}

/// Return requests raised by a customer (or by staff on their behalf) against
/// an order. `owner` is the staff member handling the return.
pub(super) fn return_request() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Shops)
        .requires(Field::Status)
        .optional(Field::Customer)
        .optional(Field::Owner);

    let decide = |transition| {
        all_of([
            same_tenant(),
            not_owner(),
            cap(ApproveReturns),
            shop_scope(),
            lifecycle(transition),
        ])
    };

    ResourcePolicy::new(ResourceKind::ReturnRequest, shape)
        .with(AbilitySpec::collection(Ability::ViewAny, shop_read(ViewOrders)))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([all_of([same_tenant(), is_customer()]), shop_read(ViewOrders)]),
        ))
        .with(AbilitySpec::under(
            Ability::Create,
            ResourceKind::Order,
            any_of([all_of([same_tenant(), is_customer()]), shop_read(ManageReturns)]),
        ))
        .with(AbilitySpec::instance(
            Ability::Review,
            shop_transition(ManageReturns, Transition::Review),
        ))
        .with(AbilitySpec::instance(Ability::Approve, decide(Transition::Approve)))
        .with(AbilitySpec::instance(Ability::Reject, decide(Transition::Reject)))
        .with(AbilitySpec::instance(
            Ability::Process,
            shop_transition(ManageReturns, Transition::Process),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            all_of([
                same_tenant(),
                any_of([
                    is_customer(),
                    is_owner(),
                    all_of([cap(ManageReturns), shop_scope()]),
                ]),
                lifecycle(Transition::Cancel),
            ]),
        ))
}
