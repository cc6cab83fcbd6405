//! Deployment overrides of the role and lifecycle tables.

use std::path::PathBuf;

use anyhow::Context;
use shopgate_core::{ShopId, TenantId, UserId};
use shopgate_policy::{
    Ability, AbilityContext, Actor, ConfigError, OVERRIDES_ENV, PolicyConfig, PolicyOverrides,
    PolicyRegistry, ReasonCode, ResourceKind, ResourceSnapshot, Role, ShopSet, StaffActor,
};

fn write_overrides(name: &str, json: &str) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("shopgate-{}-{name}.json", std::process::id()));
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn member(tenant: TenantId, id: u64, role: Role) -> Actor {
    StaffActor::new(UserId::new(id), tenant, role)
        .with_shops(ShopSet::from([1]))
        .into()
}

const CASHIER_REFUNDS: &str = r#"{
    "roles": [{
        "role": "cashier",
        "level": 20,
        "capabilities": ["view_orders", "process_payments", "refund_payments", "submit_timesheets", "request_advances"]
    }]
}"#;

#[test]
fn role_override_grants_a_capability() -> anyhow::Result<()> {
    shopgate_observability::init();

    let tenant = TenantId::new();
    let cashier = member(tenant, 4, Role::Cashier);
    let payment = ResourceSnapshot::new(ResourceKind::Payment, tenant)
        .with_shop(ShopId::new(1))
        .with_owner_id(UserId::new(9))
        .with_status("completed");
    let refund = |registry: &PolicyRegistry| {
        registry.can(
            &cashier,
            Ability::Refund,
            ResourceKind::Payment,
            Some(&payment),
            &AbilityContext::default(),
        )
    };

    let standard = PolicyRegistry::standard()?;
    assert_eq!(refund(&standard)?.reason, ReasonCode::RoleInsufficient);

    let overrides = PolicyOverrides::from_json_str(CASHIER_REFUNDS)?;
    let registry = PolicyRegistry::from_config(PolicyConfig::standard().apply_overrides(overrides))?;
    assert!(refund(&registry)?.allowed);
    Ok(())
}

#[test]
fn lifecycle_override_adds_a_top_role_exception() -> anyhow::Result<()> {
    shopgate_observability::init();

    let overrides = PolicyOverrides::from_json_str(
        r#"{
            "lifecycles": [{
                "resource": "order",
                "statuses": [
                    { "status": "pending", "transitions": ["update", "confirm", "cancel", "delete", "record_payment"] },
                    { "status": "confirmed", "transitions": ["complete", "cancel", "record_payment"] },
                    { "status": "completed", "terminal": true, "overrides": ["cancel"] },
                    { "status": "cancelled", "terminal": true }
                ]
            }]
        }"#,
    )?;
    let registry = PolicyRegistry::from_config(PolicyConfig::standard().apply_overrides(overrides))?;

    let tenant = TenantId::new();
    let completed = ResourceSnapshot::new(ResourceKind::Order, tenant)
        .with_shop(ShopId::new(1))
        .with_status("completed");
    let cancel = |actor: &Actor| {
        registry.can(
            actor,
            Ability::Cancel,
            ResourceKind::Order,
            Some(&completed),
            &AbilityContext::default(),
        )
    };

    assert!(cancel(&member(tenant, 1, Role::Owner))?.allowed);
    assert_eq!(
        cancel(&member(tenant, 2, Role::GeneralManager))?.reason,
        ReasonCode::RoleInsufficient
    );
    Ok(())
}

#[test]
fn overrides_file_is_loaded_from_the_environment() -> anyhow::Result<()> {
    shopgate_observability::init();

    let path = write_overrides("env", CASHIER_REFUNDS)?;
    // SAFETY: this is the only test in this binary that touches the variable.
    unsafe { std::env::set_var(OVERRIDES_ENV, &path) };
    let loaded = PolicyConfig::from_env();
    unsafe { std::env::remove_var(OVERRIDES_ENV) };
    std::fs::remove_file(&path)?;

    let config = loaded?;
    let cashier = config
        .roles
        .iter()
        .find(|row| row.role == Role::Cashier)
        .context("cashier row present")?;
    assert_eq!(cashier.capabilities.len(), 5);

    // Unset falls back to the standard tables.
    assert_eq!(PolicyConfig::from_env()?, PolicyConfig::standard());

    // A path that is not unicode is a misconfiguration, not an absent override.
    #[cfg(unix)]
    {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        unsafe { std::env::set_var(OVERRIDES_ENV, OsString::from_vec(b"/tmp/po\xfflicy.json".to_vec())) };
        let loaded = PolicyConfig::from_env();
        unsafe { std::env::remove_var(OVERRIDES_ENV) };
        assert!(matches!(
            loaded,
            Err(ConfigError::InvalidEnv { var: OVERRIDES_ENV, .. })
        ));
    }
    Ok(())
}

#[test]
fn overrides_file_round_trips_from_disk() -> anyhow::Result<()> {
    let path = write_overrides("disk", CASHIER_REFUNDS)?;
    let overrides = PolicyOverrides::from_path(&path);
    std::fs::remove_file(&path)?;
    assert_eq!(overrides?.roles.len(), 1);
    Ok(())
}

#[test]
fn invalid_overrides_fail_registry_construction() -> anyhow::Result<()> {
    shopgate_observability::init();

    let build = |json: &str| -> anyhow::Result<Result<PolicyRegistry, ConfigError>> {
        let overrides = PolicyOverrides::from_json_str(json)?;
        Ok(PolicyRegistry::from_config(
            PolicyConfig::standard().apply_overrides(overrides),
        ))
    };

    let clash = build(
        r#"{ "roles": [{ "role": "cashier", "level": 100, "capabilities": [] }] }"#,
    )?;
    assert!(matches!(clash, Err(ConfigError::DuplicateLevel { level: 100, .. })));

    let usurper = build(
        r#"{ "roles": [{ "role": "general_manager", "level": 150, "capabilities": [] }] }"#,
    )?;
    assert!(matches!(
        usurper,
        Err(ConfigError::TopRoleNotSenior { top: Role::Owner, other: Role::GeneralManager })
    ));

    let no_exit = build(
        r#"{ "lifecycles": [{ "resource": "payment", "statuses": [
            { "status": "pending", "transitions": ["complete"] }
        ] }] }"#,
    )?;
    assert!(matches!(no_exit, Err(ConfigError::NoTerminalStatus(ResourceKind::Payment))));

    // Payment abilities still gate refund and cancel.
    let dropped = build(
        r#"{ "lifecycles": [{ "resource": "payment", "statuses": [
            { "status": "pending", "transitions": ["complete"] },
            { "status": "completed", "terminal": true }
        ] }] }"#,
    )?;
    assert!(matches!(
        dropped,
        Err(ConfigError::UnreachableTransition { kind: ResourceKind::Payment, .. })
    ));

    let platform_leak = build(
        r#"{ "roles": [{ "role": "cashier", "level": 20, "capabilities": ["manage_platform"] }] }"#,
    )?;
    assert!(matches!(
        platform_leak,
        Err(ConfigError::PlatformCapabilityOnTenantRole { role: Role::Cashier, .. })
    ));
    Ok(())
}
