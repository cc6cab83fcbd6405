//! Wage advances and fund requests: requested by one staff member, decided
//! and paid out by a strictly more senior one.

use crate::ability::{Ability, AbilitySpec};
use crate::lifecycle::Transition;
use crate::permissions::Capability::{self, *};
use crate::predicate::{
    Predicate, all_of, any_of, balance_outstanding, cap, is_owner, lifecycle, not_owner,
    outranks_owner, same_tenant, shop_scope, staff,
};
use crate::registry::ResourcePolicy;
use crate::resource::{Field, ResourceKind, ResourceShape};

fn request_shape() -> ResourceShape {
    ResourceShape::new()
        .requires(Field::Owner)
        .requires(Field::OwnerRole)
        .requires(Field::Status)
        .optional(Field::Shops)
}

/// Someone senior to the requester, in one of their shops.
fn senior(capability: Capability) -> Predicate {
    all_of([cap(capability), outranks_owner(), shop_scope()])
}

fn decide(capability: Capability, transition: Transition) -> Predicate {
    all_of([
        same_tenant(),
        not_owner(),
        senior(capability),
        lifecycle(transition),
    ])
}

/// Abilities shared by both request kinds.
fn request_policy(kind: ResourceKind, shape: ResourceShape, create: Predicate) -> ResourcePolicy {
    ResourcePolicy::new(kind, shape)
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            all_of([
                same_tenant(),
                any_of([cap(ApproveAdvances), cap(DisburseFunds)]),
                shop_scope(),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([same_tenant(), is_owner()]),
                all_of([
                    same_tenant(),
                    any_of([cap(ApproveAdvances), cap(DisburseFunds)]),
                    outranks_owner(),
                    shop_scope(),
                ]),
            ]),
        ))
        .with(AbilitySpec::collection(Ability::Create, create))
        .with(AbilitySpec::instance(
            Ability::Update,
            all_of([same_tenant(), is_owner(), lifecycle(Transition::Update)]),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            all_of([
                same_tenant(),
                any_of([is_owner(), senior(ApproveAdvances)]),
                lifecycle(Transition::Cancel),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::Approve,
            decide(ApproveAdvances, Transition::Approve),
        ))
        .with(AbilitySpec::instance(
            Ability::Reject,
            decide(ApproveAdvances, Transition::Reject),
        ))
        .with(AbilitySpec::instance(
            Ability::Disburse,
            decide(DisburseFunds, Transition::Disburse),
        ))
}

pub(super) fn wage_advance() -> ResourcePolicy {
    request_policy(
        ResourceKind::WageAdvance,
        request_shape().optional(Field::BalanceSettled),
        all_of([same_tenant(), cap(RequestAdvances)]),
    )
    .with(AbilitySpec::instance(
        Ability::RecordRepayment,
        all_of([
            same_tenant(),
            not_owner(),
            cap(DisburseFunds),
            shop_scope(),
            lifecycle(Transition::RecordRepayment),
            balance_outstanding(),
        ]),
    ))
}

/// Fund requests cover shop expenses, so any staff member working in the
/// target shop may raise one.
pub(super) fn fund_request() -> ResourcePolicy {
    request_policy(
        ResourceKind::FundRequest,
        request_shape(),
        all_of([same_tenant(), staff(), shop_scope()]),
    )
}
