//! Payroll periods, pay runs, payslips and timesheets.
//!
//! Periods and runs use separate status vocabularies: a period moves through
//! `draft/processing/processed/approved/paid/cancelled`, while each pay run
//! inside it goes `draft/pending_review/pending_approval/approved/paid`.

use crate::ability::{Ability, AbilitySpec};
use crate::lifecycle::Transition;
use crate::permissions::Capability::{self, *};
use crate::predicate::{
    Predicate, all_of, any_of, cap, is_owner, lifecycle, not_owner, outranks_owner, same_tenant,
    shop_scope,
};
use crate::registry::ResourcePolicy;
use crate::resource::{Field, ResourceKind, ResourceShape};

fn gated(capability: Capability, transition: Transition) -> Predicate {
    all_of([
        same_tenant(),
        cap(capability),
        shop_scope(),
        lifecycle(transition),
    ])
}

fn read(capability: Capability) -> Predicate {
    all_of([same_tenant(), cap(capability), shop_scope()])
}

pub(super) fn payroll_period() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Status)
        .optional(Field::Shops);

    ResourcePolicy::new(ResourceKind::PayrollPeriod, shape)
        .with(AbilitySpec::collection(Ability::ViewAny, read(ViewPayroll)))
        .with(AbilitySpec::instance(Ability::View, read(ViewPayroll)))
        .with(AbilitySpec::collection(Ability::Create, read(ManagePayroll)))
        .with(AbilitySpec::instance(
            Ability::Update,
            gated(ManagePayroll, Transition::Update),
        ))
        .with(AbilitySpec::instance(
            Ability::Delete,
            gated(ManagePayroll, Transition::Delete),
        ))
        .with(AbilitySpec::instance(
            Ability::Process,
            gated(ManagePayroll, Transition::Process),
        ))
        .with(AbilitySpec::instance(
            Ability::Reprocess,
            gated(ManagePayroll, Transition::Reprocess),
        ))
        .with(AbilitySpec::instance(
            Ability::Approve,
            gated(ManagePayroll, Transition::Approve),
        ))
        .with(AbilitySpec::instance(
            Ability::MarkPaid,
            gated(DisburseFunds, Transition::MarkPaid),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            gated(ManagePayroll, Transition::Cancel),
        ))
        .with(AbilitySpec::instance(
            Ability::Reopen,
            gated(ManagePayroll, Transition::Reopen),
        ))
}

/// Pay runs. `owner` is the preparer: approvers must strictly outrank them.
pub(super) fn pay_run() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Status)
        .requires(Field::Owner)
        .requires(Field::OwnerRole)
        .optional(Field::Shops);

    let decide = |transition| {
        all_of([
            same_tenant(),
            not_owner(),
            cap(ApprovePayroll),
            outranks_owner(),
            shop_scope(),
            lifecycle(transition),
        ])
    };

    ResourcePolicy::new(ResourceKind::PayRun, shape)
        .with(AbilitySpec::collection(Ability::ViewAny, read(ViewPayroll)))
        .with(AbilitySpec::instance(Ability::View, read(ViewPayroll)))
        .with(AbilitySpec::under(
            Ability::Create,
            ResourceKind::PayrollPeriod,
            read(ManagePayroll),
        ))
        .with(AbilitySpec::instance(
            Ability::Calculate,
            gated(ManagePayroll, Transition::Calculate),
        ))
        .with(AbilitySpec::instance(
            Ability::Submit,
            gated(ManagePayroll, Transition::Submit),
        ))
        .with(AbilitySpec::instance(Ability::Approve, decide(Transition::Approve)))
        .with(AbilitySpec::instance(Ability::Reject, decide(Transition::Reject)))
        .with(AbilitySpec::instance(
            Ability::Complete,
            gated(DisburseFunds, Transition::Complete),
        ))
        .with(AbilitySpec::instance(
            Ability::Cancel,
            gated(ManagePayroll, Transition::Cancel),
        ))
        .with(AbilitySpec::instance(
            Ability::Delete,
            gated(ManagePayroll, Transition::Delete),
        ))
        .with(AbilitySpec::instance(
            Ability::Regenerate,
            gated(ManagePayroll, Transition::Regenerate),
        ))
}

/// Payslips. `owner` is the employee; anyone else needs strict seniority over
/// them to read it.
pub(super) fn payslip() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Owner)
        .requires(Field::OwnerRole)
        .optional(Field::Shops);

    ResourcePolicy::new(ResourceKind::Payslip, shape)
        .with(AbilitySpec::collection(Ability::ViewAny, read(ViewPayroll)))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([same_tenant(), is_owner()]),
                all_of([
                    same_tenant(),
                    cap(ViewPayroll),
                    outranks_owner(),
                    shop_scope(),
                ]),
            ]),
        ))
}

/// Timesheets. `owner` is the employee who logged the hours.
pub(super) fn timesheet() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Owner)
        .requires(Field::OwnerRole)
        .requires(Field::Status)
        .optional(Field::Shops);

    // Managers acting on someone else's sheet.
    let manager = || all_of([cap(ManageTimesheets), outranks_owner(), shop_scope()]);
    let own_or_managed = |transition| {
        all_of([
            same_tenant(),
            any_of([is_owner(), manager()]),
            lifecycle(transition),
        ])
    };
    let decide = |transition| {
        all_of([
            same_tenant(),
            not_owner(),
            cap(ApproveTimesheets),
            outranks_owner(),
            shop_scope(),
            lifecycle(transition),
        ])
    };

    ResourcePolicy::new(ResourceKind::Timesheet, shape)
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            all_of([
                same_tenant(),
                any_of([cap(ManageTimesheets), cap(ApproveTimesheets)]),
                shop_scope(),
            ]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([same_tenant(), is_owner()]),
                all_of([
                    same_tenant(),
                    any_of([cap(ManageTimesheets), cap(ApproveTimesheets)]),
                    outranks_owner(),
                    shop_scope(),
                ]),
            ]),
        ))
        .with(AbilitySpec::collection(
            Ability::Create,
            all_of([same_tenant(), cap(SubmitTimesheets)]),
        ))
        .with(AbilitySpec::instance(
            Ability::Update,
            own_or_managed(Transition::Update),
        ))
        .with(AbilitySpec::instance(
            Ability::Submit,
            own_or_managed(Transition::Submit),
        ))
        .with(AbilitySpec::instance(
            Ability::Delete,
            own_or_managed(Transition::Delete),
        ))
        .with(AbilitySpec::instance(Ability::Approve, decide(Transition::Approve)))
        .with(AbilitySpec::instance(Ability::Reject, decide(Transition::Reject)))
        .with(AbilitySpec::instance(
            Ability::Reopen,
            all_of([
                same_tenant(),
                cap(ManageTimesheets),
                lifecycle(Transition::Reopen),
            ]),
        ))
}
