use crate::ability::{Ability, AbilitySpec};
use crate::predicate::{all_of, any_of, platform, same_tenant, staff, tenant_owner};
use crate::registry::ResourcePolicy;
use crate::resource::{ResourceKind, ResourceShape};

/// The tenant record itself. Platform operators list and suspend tenants;
/// only the provisioning account changes tenant settings.
pub(super) fn tenant() -> ResourcePolicy {
    ResourcePolicy::new(ResourceKind::Tenant, ResourceShape::new())
        .with(AbilitySpec::collection(Ability::ViewAny, platform()))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([platform(), all_of([same_tenant(), staff()])]),
        ))
        .with(AbilitySpec::instance(
            Ability::Update,
            all_of([same_tenant(), tenant_owner()]),
        ))
        .with(AbilitySpec::instance(Ability::Suspend, platform()))
}
