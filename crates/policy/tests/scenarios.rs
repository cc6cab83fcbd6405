//! End-to-end decisions through the registry for the documented workflows.

mod common;

use common::{customer, registry, staff};
use shopgate_core::{CustomerId, ShopId, TenantId, UserId};
use shopgate_policy::{
    Ability, AbilityContext, AuthzError, PolicyError, ReasonCode, ResourceKind, ResourceSnapshot,
    Role, ShopSet,
};

fn none() -> AbilityContext {
    AbilityContext::default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario A: role assignment between owner and general manager
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_a_owner_assigns_general_manager_but_not_the_reverse() {
    let r = registry();
    assert_eq!(r.hierarchy().level(Role::Owner), 100);
    assert_eq!(r.hierarchy().level(Role::GeneralManager), 90);

    let tenant = TenantId::new();
    let owner = staff(tenant, 1, Role::Owner, &[]);
    let general = staff(tenant, 2, Role::GeneralManager, &[]);
    assert_eq!(owner.as_staff().unwrap().level(r.hierarchy()), 100);
    let record = ResourceSnapshot::new(ResourceKind::Staff, tenant)
        .with_owner(UserId::new(5), Role::StoreManager)
        .with_shop(ShopId::new(1));

    let promote = none().with_candidate_role(Role::GeneralManager);
    let d = r
        .can(&owner, Ability::AssignRole, ResourceKind::Staff, Some(&record), &promote)
        .unwrap();
    assert!(d.allowed);

    let crown = none().with_candidate_role(Role::Owner);
    let d = r
        .can(&general, Ability::AssignRole, ResourceKind::Staff, Some(&record), &crown)
        .unwrap();
    assert_eq!(d.reason, ReasonCode::RoleInsufficient);

    // Not even the owner can hand out the top role.
    let d = r
        .can(&owner, Ability::AssignRole, ResourceKind::Staff, Some(&record), &crown)
        .unwrap();
    assert!(!d.allowed);
}

#[test]
fn assign_role_checks_the_candidate_before_the_record() {
    let r = registry();
    let tenant = TenantId::new();
    let other_tenant = TenantId::new();
    let manager = staff(tenant, 1, Role::StoreManager, &[1]);
    let foreign = ResourceSnapshot::new(ResourceKind::Staff, other_tenant)
        .with_owner(UserId::new(5), Role::Cashier);

    // Peer role: rejected on the candidate even though the record is foreign.
    let d = r
        .can(
            &manager,
            Ability::AssignRole,
            ResourceKind::Staff,
            Some(&foreign),
            &none().with_candidate_role(Role::StoreManager),
        )
        .unwrap();
    assert_eq!(d.reason, ReasonCode::RoleInsufficient);

    let err = r
        .can(&manager, Ability::AssignRole, ResourceKind::Staff, Some(&foreign), &none())
        .unwrap_err();
    assert!(matches!(err, PolicyError::MissingCandidateRole { .. }));
}

#[test]
fn top_role_record_is_out_of_reach_of_generic_staff_management() {
    let r = registry();
    let tenant = TenantId::new();
    let owner = staff(tenant, 1, Role::Owner, &[]);
    let general = staff(tenant, 2, Role::GeneralManager, &[]);
    let owner_record = ResourceSnapshot::new(ResourceKind::Staff, tenant)
        .with_owner(UserId::new(1), Role::Owner);

    for ability in [Ability::Update, Ability::Delete] {
        let d = r
            .can(&general, ability, ResourceKind::Staff, Some(&owner_record), &none())
            .unwrap();
        assert_eq!(d.reason, ReasonCode::RoleInsufficient, "{ability}");
    }

    let d = r
        .can(&owner, Ability::Update, ResourceKind::Staff, Some(&owner_record), &none())
        .unwrap();
    assert_eq!(d.reason, ReasonCode::SelfActionForbidden);

    let d = r
        .can(
            &owner,
            Ability::UpdateOwnProfile,
            ResourceKind::Staff,
            Some(&owner_record),
            &none(),
        )
        .unwrap();
    assert!(d.allowed);
}

#[test]
fn store_manager_manages_junior_staff_in_their_shops_only() {
    let r = registry();
    let tenant = TenantId::new();
    let manager = staff(tenant, 1, Role::StoreManager, &[3, 9]);
    let in_shop = ResourceSnapshot::new(ResourceKind::Staff, tenant)
        .with_owner(UserId::new(5), Role::Cashier)
        .with_shops(ShopSet::from([9]));
    let elsewhere = ResourceSnapshot::new(ResourceKind::Staff, tenant)
        .with_owner(UserId::new(6), Role::Cashier)
        .with_shops(ShopSet::from([7]));
    let peer = ResourceSnapshot::new(ResourceKind::Staff, tenant)
        .with_owner(UserId::new(7), Role::StoreManager)
        .with_shops(ShopSet::from([9]));

    let update = |record: &ResourceSnapshot| {
        r.can(&manager, Ability::Update, ResourceKind::Staff, Some(record), &none())
            .unwrap()
    };
    assert!(update(&in_shop).allowed);
    assert_eq!(update(&elsewhere).reason, ReasonCode::ScopeMismatch);
    assert_eq!(update(&peer).reason, ReasonCode::RoleInsufficient);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario B: requester cancels their own wage advance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_b_requester_cancels_pending_advance_until_disbursed() {
    let r = registry();
    let tenant = TenantId::new();
    let requester = staff(tenant, 42, Role::SalesRep, &[]);
    let pending = ResourceSnapshot::new(ResourceKind::WageAdvance, tenant)
        .with_owner(UserId::new(42), Role::SalesRep)
        .with_shop(ShopId::new(1))
        .with_status("pending");

    let d = r
        .can(&requester, Ability::Cancel, ResourceKind::WageAdvance, Some(&pending), &none())
        .unwrap();
    assert!(d.allowed);

    let disbursed = pending.clone().with_status("disbursed");
    let everyone = [
        requester.clone(),
        staff(tenant, 1, Role::Owner, &[]),
        staff(tenant, 2, Role::GeneralManager, &[]),
        staff(tenant, 3, Role::Accountant, &[1]),
        staff(tenant, 4, Role::StoreManager, &[1]),
    ];
    for actor in &everyone {
        let d = r
            .can(actor, Ability::Cancel, ResourceKind::WageAdvance, Some(&disbursed), &none())
            .unwrap();
        assert_eq!(d.reason, ReasonCode::LifecycleBlocked, "{actor}");
    }
    let outsider = staff(TenantId::new(), 42, Role::Owner, &[]);
    let d = r
        .can(&outsider, Ability::Cancel, ResourceKind::WageAdvance, Some(&disbursed), &none())
        .unwrap();
    assert_eq!(d.reason, ReasonCode::TenantMismatch);
}

#[test]
fn advance_approval_requires_strict_seniority_and_forbids_self_approval() {
    let r = registry();
    let tenant = TenantId::new();
    let manager = staff(tenant, 10, Role::StoreManager, &[1]);
    let request = |owner: u64, role: Role| {
        ResourceSnapshot::new(ResourceKind::WageAdvance, tenant)
            .with_owner(UserId::new(owner), role)
            .with_shop(ShopId::new(1))
            .with_status("pending")
    };

    let approve = |snapshot: &ResourceSnapshot| {
        r.can(&manager, Ability::Approve, ResourceKind::WageAdvance, Some(snapshot), &none())
            .unwrap()
    };
    assert!(approve(&request(11, Role::Cashier)).allowed);
    assert_eq!(approve(&request(12, Role::StoreManager)).reason, ReasonCode::RoleInsufficient);
    assert_eq!(approve(&request(10, Role::StoreManager)).reason, ReasonCode::SelfActionForbidden);
}

#[test]
fn repayments_are_recorded_against_disbursed_advances_until_settled() {
    let r = registry();
    let tenant = TenantId::new();
    let accountant = staff(tenant, 3, Role::Accountant, &[1]);
    let disbursed = ResourceSnapshot::new(ResourceKind::WageAdvance, tenant)
        .with_owner(UserId::new(42), Role::SalesRep)
        .with_shop(ShopId::new(1))
        .with_status("disbursed");

    let outstanding = disbursed.clone().with_balance_settled(false);
    let settled = disbursed.clone().with_balance_settled(true);
    let repay = |snapshot: &ResourceSnapshot| {
        r.can(
            &accountant,
            Ability::RecordRepayment,
            ResourceKind::WageAdvance,
            Some(snapshot),
            &none(),
        )
    };

    assert!(repay(&outstanding).unwrap().allowed);
    assert_eq!(repay(&settled).unwrap().reason, ReasonCode::LifecycleBlocked);
    assert!(matches!(
        repay(&disbursed).unwrap_err(),
        PolicyError::MissingField { .. }
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario C: payroll period approval is shop scoped
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scenario_c_store_manager_outside_the_period_shop_is_denied() {
    let r = registry();
    let tenant = TenantId::new();
    let period = ResourceSnapshot::new(ResourceKind::PayrollPeriod, tenant)
        .with_shop(ShopId::new(7))
        .with_status("processed");

    let manager = staff(tenant, 1, Role::StoreManager, &[3, 9]);
    assert!(r.hierarchy().has_capability(Role::StoreManager, shopgate_policy::Capability::ManagePayroll));
    let d = r
        .can(&manager, Ability::Approve, ResourceKind::PayrollPeriod, Some(&period), &none())
        .unwrap();
    assert_eq!(d.reason, ReasonCode::ScopeMismatch);

    let assigned = staff(tenant, 1, Role::StoreManager, &[3, 7]);
    let d = r
        .can(&assigned, Ability::Approve, ResourceKind::PayrollPeriod, Some(&period), &none())
        .unwrap();
    assert!(d.allowed);
}

#[test]
fn explanation_traces_the_failing_check() {
    let r = registry();
    let tenant = TenantId::new();
    let period = ResourceSnapshot::new(ResourceKind::PayrollPeriod, tenant)
        .with_shop(ShopId::new(7))
        .with_status("processed");
    let manager = staff(tenant, 1, Role::StoreManager, &[3, 9]);

    let explanation = r
        .explain(&manager, Ability::Approve, ResourceKind::PayrollPeriod, Some(&period), &none())
        .unwrap();

    assert!(!explanation.decision.allowed);
    let checks: Vec<&str> = explanation.trace.iter().map(|s| s.check.as_str()).collect();
    assert_eq!(
        checks,
        vec!["all_of", "same_tenant", "has_capability(manage_payroll)", "shop_scope"]
    );
    assert_eq!(explanation.failed_check().unwrap().check, "shop_scope");
    assert!(explanation.summary.contains("may not approve payroll_period"));

    let json = serde_json::to_value(&explanation).unwrap();
    assert_eq!(json["decision"]["reason"], "scope_mismatch");
}

// ─────────────────────────────────────────────────────────────────────────────
// Pay runs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn preparer_cannot_approve_own_pay_run() {
    let r = registry();
    let tenant = TenantId::new();
    let run = ResourceSnapshot::new(ResourceKind::PayRun, tenant)
        .with_owner(UserId::new(2), Role::GeneralManager)
        .with_status("pending_approval");

    let preparer = staff(tenant, 2, Role::GeneralManager, &[]);
    let owner = staff(tenant, 1, Role::Owner, &[]);

    let d = r
        .can(&preparer, Ability::Approve, ResourceKind::PayRun, Some(&run), &none())
        .unwrap();
    assert_eq!(d.reason, ReasonCode::SelfActionForbidden);
    let d = r
        .can(&owner, Ability::Approve, ResourceKind::PayRun, Some(&run), &none())
        .unwrap();
    assert!(d.allowed);
}

#[test]
fn pay_run_approval_requires_strict_seniority_over_the_preparer() {
    let r = registry();
    let tenant = TenantId::new();
    let prepared_by = |id, role| {
        ResourceSnapshot::new(ResourceKind::PayRun, tenant)
            .with_shop(ShopId::new(1))
            .with_owner(UserId::new(id), role)
            .with_status("pending_approval")
    };
    let accountant = staff(tenant, 5, Role::Accountant, &[1]);
    let general = staff(tenant, 2, Role::GeneralManager, &[]);

    let decide = |actor, ability, run: &ResourceSnapshot| {
        r.can(actor, ability, ResourceKind::PayRun, Some(run), &none())
            .unwrap()
    };

    // Same level: both hold approve_payroll, equality never grants.
    let peer_run = prepared_by(6, Role::Accountant);
    assert_eq!(decide(&accountant, Ability::Approve, &peer_run).reason, ReasonCode::RoleInsufficient);
    assert_eq!(decide(&accountant, Ability::Reject, &peer_run).reason, ReasonCode::RoleInsufficient);

    // Junior approver.
    let senior_run = prepared_by(2, Role::GeneralManager);
    assert_eq!(decide(&accountant, Ability::Approve, &senior_run).reason, ReasonCode::RoleInsufficient);

    assert!(decide(&general, Ability::Approve, &peer_run).allowed);
    assert!(decide(&general, Ability::Reject, &peer_run).allowed);
}

#[test]
fn pay_run_without_a_preparer_is_rejected_as_malformed() {
    let r = registry();
    let tenant = TenantId::new();
    let run = ResourceSnapshot::new(ResourceKind::PayRun, tenant).with_status("pending_approval");
    let owner = staff(tenant, 1, Role::Owner, &[]);

    let err = r
        .can(&owner, Ability::Approve, ResourceKind::PayRun, Some(&run), &none())
        .unwrap_err();
    assert!(matches!(err, PolicyError::MissingField { kind: ResourceKind::PayRun, .. }));
}

#[test]
fn only_the_top_role_regenerates_a_cancelled_pay_run() {
    let r = registry();
    let tenant = TenantId::new();
    let cancelled = ResourceSnapshot::new(ResourceKind::PayRun, tenant)
        .with_owner(UserId::new(3), Role::Accountant)
        .with_status("cancelled");

    let owner = staff(tenant, 1, Role::Owner, &[]);
    let general = staff(tenant, 2, Role::GeneralManager, &[]);

    let regen = |actor| {
        r.can(actor, Ability::Regenerate, ResourceKind::PayRun, Some(&cancelled), &none())
            .unwrap()
    };
    assert!(regen(&owner).allowed);
    assert_eq!(regen(&general).reason, ReasonCode::RoleInsufficient);
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders, payments, returns
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn payment_creation_is_gated_by_the_parent_order() {
    let r = registry();
    let tenant = TenantId::new();
    let cashier = staff(tenant, 4, Role::Cashier, &[1]);
    let order = ResourceSnapshot::new(ResourceKind::Order, tenant)
        .with_shop(ShopId::new(1))
        .with_status("pending");

    let create = |order: ResourceSnapshot| {
        r.can(
            &cashier,
            Ability::Create,
            ResourceKind::Payment,
            None,
            &none().with_parent(order),
        )
    };
    assert!(create(order.clone()).unwrap().allowed);
    assert_eq!(
        create(order.clone().with_status("completed")).unwrap().reason,
        ReasonCode::LifecycleBlocked
    );
    assert_eq!(
        create(order.with_shop(ShopId::new(2)).with_status("confirmed"))
            .unwrap()
            .reason,
        ReasonCode::ScopeMismatch
    );

    let err = r
        .can(&cashier, Ability::Create, ResourceKind::Payment, None, &none())
        .unwrap_err();
    assert_eq!(
        err,
        PolicyError::MissingParent {
            kind: ResourceKind::Payment,
            ability: Ability::Create,
            parent: ResourceKind::Order
        }
    );
}

#[test]
fn customers_cancel_their_own_pending_orders() {
    let r = registry();
    let tenant = TenantId::new();
    let order = ResourceSnapshot::new(ResourceKind::Order, tenant)
        .with_shop(ShopId::new(1))
        .with_customer(CustomerId::new(5))
        .with_status("pending");

    let d = r
        .can(&customer(tenant, 5), Ability::Cancel, ResourceKind::Order, Some(&order), &none())
        .unwrap();
    assert!(d.allowed);

    let d = r
        .can(&customer(tenant, 6), Ability::Cancel, ResourceKind::Order, Some(&order), &none())
        .unwrap();
    assert!(!d.allowed);

    let completed = order.with_status("completed");
    let d = r
        .can(&customer(tenant, 5), Ability::Cancel, ResourceKind::Order, Some(&completed), &none())
        .unwrap();
    assert_eq!(d.reason, ReasonCode::LifecycleBlocked);
}

#[test]
fn authorize_maps_denials_to_forbidden() {
    let r = registry();
    let tenant = TenantId::new();
    let order = ResourceSnapshot::new(ResourceKind::Order, tenant)
        .with_shop(ShopId::new(1))
        .with_status("pending");
    let clerk = staff(tenant, 8, Role::StockClerk, &[1]);

    let err = r
        .authorize(&clerk, Ability::Update, ResourceKind::Order, Some(&order), &none())
        .unwrap_err();
    assert_eq!(err, AuthzError::Denied(ReasonCode::RoleInsufficient));

    let err = r
        .authorize(&clerk, Ability::Ship, ResourceKind::Order, Some(&order), &none())
        .unwrap_err();
    assert!(matches!(err, AuthzError::Policy(PolicyError::AbilityNotRegistered { .. })));
}

// ─────────────────────────────────────────────────────────────────────────────
// Bilateral resources
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn purchase_orders_branch_on_buyer_and_supplier_side() {
    let r = registry();
    let buyer_tenant = TenantId::new();
    let supplier_tenant = TenantId::new();
    let submitted = ResourceSnapshot::new(ResourceKind::PurchaseOrder, buyer_tenant)
        .with_counterparty(supplier_tenant)
        .with_shop(ShopId::new(1))
        .with_owner_id(UserId::new(7))
        .with_status("submitted");

    let buyer = staff(buyer_tenant, 7, Role::StoreManager, &[1]);
    let supplier = staff(supplier_tenant, 20, Role::StoreManager, &[40]);
    let stranger = staff(TenantId::new(), 30, Role::Owner, &[]);

    let can = |actor, ability, snapshot: &ResourceSnapshot| {
        r.can(actor, ability, ResourceKind::PurchaseOrder, Some(snapshot), &none())
            .unwrap()
    };

    assert!(can(&supplier, Ability::Confirm, &submitted).allowed);
    assert!(can(&supplier, Ability::View, &submitted).allowed);
    assert_eq!(can(&buyer, Ability::Confirm, &submitted).reason, ReasonCode::TenantMismatch);
    assert!(can(&buyer, Ability::Cancel, &submitted).allowed);
    assert_eq!(can(&supplier, Ability::Cancel, &submitted).reason, ReasonCode::TenantMismatch);
    assert_eq!(can(&stranger, Ability::View, &submitted).reason, ReasonCode::TenantMismatch);

    let confirmed = submitted.clone().with_status("confirmed");
    assert!(can(&supplier, Ability::Ship, &confirmed).allowed);
    assert_eq!(can(&buyer, Ability::Ship, &confirmed).reason, ReasonCode::TenantMismatch);
}

#[test]
fn supplier_staff_sharing_the_placer_user_id_still_decide() {
    let r = registry();
    let buyer_tenant = TenantId::new();
    let supplier_tenant = TenantId::new();
    let submitted = ResourceSnapshot::new(ResourceKind::PurchaseOrder, buyer_tenant)
        .with_counterparty(supplier_tenant)
        .with_shop(ShopId::new(1))
        .with_owner_id(UserId::new(7))
        .with_status("submitted");
    let pending = ResourceSnapshot::new(ResourceKind::SupplierConnection, buyer_tenant)
        .with_counterparty(supplier_tenant)
        .with_owner_id(UserId::new(7))
        .with_status("pending");

    // User ids are per tenant: supplier user 7 is not buyer user 7.
    let supplier = staff(supplier_tenant, 7, Role::StoreManager, &[40]);
    let supplier_owner = staff(supplier_tenant, 7, Role::Owner, &[]);

    for ability in [Ability::Confirm, Ability::Reject] {
        let d = r
            .can(&supplier, ability, ResourceKind::PurchaseOrder, Some(&submitted), &none())
            .unwrap();
        assert!(d.allowed, "{ability}: {d:?}");
    }
    for ability in [Ability::Approve, Ability::Reject] {
        let d = r
            .can(&supplier_owner, ability, ResourceKind::SupplierConnection, Some(&pending), &none())
            .unwrap();
        assert!(d.allowed, "{ability}: {d:?}");
    }
}

#[test]
fn purchase_orders_are_placed_through_an_active_connection() {
    let r = registry();
    let buyer_tenant = TenantId::new();
    let supplier_tenant = TenantId::new();
    let connection = ResourceSnapshot::new(ResourceKind::SupplierConnection, buyer_tenant)
        .with_counterparty(supplier_tenant)
        .with_status("active");
    let buyer = staff(buyer_tenant, 7, Role::StoreManager, &[1]);

    let place = |connection: ResourceSnapshot| {
        r.can(
            &buyer,
            Ability::Create,
            ResourceKind::PurchaseOrder,
            None,
            &none()
                .with_parent(connection)
                .with_target_shops(ShopSet::from([1])),
        )
        .unwrap()
    };
    assert!(place(connection.clone()).allowed);
    assert_eq!(
        place(connection.with_status("disconnected")).reason,
        ReasonCode::LifecycleBlocked
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tenants and the platform role
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn platform_operator_acts_across_tenants_only_for_platform_abilities() {
    let r = registry();
    let platform_tenant = TenantId::new();
    let tenant = TenantId::new();
    let operator = staff(platform_tenant, 1, Role::SuperAdmin, &[]);
    let owner = staff(tenant, 2, Role::Owner, &[]);
    let record = ResourceSnapshot::new(ResourceKind::Tenant, tenant);

    let can = |actor, ability| {
        r.can(actor, ability, ResourceKind::Tenant, Some(&record), &none())
            .unwrap()
    };
    assert!(can(&operator, Ability::Suspend).allowed);
    assert!(can(&operator, Ability::View).allowed);
    assert_eq!(can(&owner, Ability::Suspend).reason, ReasonCode::RoleInsufficient);
    assert!(can(&owner, Ability::View).allowed);

    // Tenant-scoped abilities stay closed to the platform role.
    let order = ResourceSnapshot::new(ResourceKind::Order, tenant)
        .with_shop(ShopId::new(1))
        .with_status("pending");
    let d = r
        .can(&operator, Ability::View, ResourceKind::Order, Some(&order), &none())
        .unwrap();
    assert!(!d.allowed);
}

#[test]
fn permitted_abilities_lists_what_the_ui_may_show() {
    let r = registry();
    let tenant = TenantId::new();
    let accountant = staff(tenant, 3, Role::Accountant, &[1]);
    let advance = ResourceSnapshot::new(ResourceKind::WageAdvance, tenant)
        .with_owner(UserId::new(5), Role::SalesRep)
        .with_shop(ShopId::new(1))
        .with_status("pending");

    let abilities = r.permitted_abilities(&accountant, &advance).unwrap();
    assert_eq!(
        abilities,
        vec![Ability::View, Ability::Cancel, Ability::Approve, Ability::Reject]
    );

    let requester = staff(tenant, 5, Role::SalesRep, &[1]);
    let abilities = r.permitted_abilities(&requester, &advance).unwrap();
    assert_eq!(abilities, vec![Ability::View, Ability::Update, Ability::Cancel]);
}

#[test]
fn string_keyed_lookup_matches_typed_lookup() {
    let r = registry();
    let tenant = TenantId::new();
    let clerk = staff(tenant, 8, Role::StockClerk, &[]);
    let d = r
        .can_named(&clerk, "create", "wage_advance", None, &none())
        .unwrap();
    assert!(d.allowed);
}
