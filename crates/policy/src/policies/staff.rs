use crate::ability::{Ability, AbilitySpec};
use crate::permissions::Capability::*;
use crate::predicate::{
    Predicate, all_of, any_of, can_assign_candidate, cap, is_owner, not_owner, outranks_owner,
    owner_not_top_role, same_tenant, shop_scope,
};
use crate::registry::ResourcePolicy;
use crate::resource::{Field, ResourceKind, ResourceShape};

/// Staff records. `owner` is the staff member the record describes.
///
/// Generic management never touches one's own record (that goes through
/// `updateOwnProfile`) and never touches the top role.
pub(super) fn staff() -> ResourcePolicy {
    let shape = ResourceShape::new()
        .requires(Field::Owner)
        .requires(Field::OwnerRole)
        .optional(Field::Shops);

    let manage = || {
        all_of([
            same_tenant(),
            not_owner(),
            owner_not_top_role(),
            cap(ManageStaff),
            outranks_owner(),
            shop_scope(),
        ])
    };

    ResourcePolicy::new(ResourceKind::Staff, shape)
        .with(AbilitySpec::collection(
            Ability::ViewAny,
            all_of([same_tenant(), cap(ViewStaff), shop_scope()]),
        ))
        .with(AbilitySpec::instance(
            Ability::View,
            any_of([
                all_of([same_tenant(), is_owner()]),
                all_of([same_tenant(), cap(ViewStaff), shop_scope()]),
            ]),
        ))
        .with(AbilitySpec::collection(
            Ability::Create,
            all_of([
                can_assign_candidate(),
                same_tenant(),
                cap(ManageStaff),
                shop_scope(),
            ]),
        ))
        .with(AbilitySpec::instance(Ability::Update, manage()))
        .with(AbilitySpec::instance(Ability::Delete, manage()))
        .with(AbilitySpec::instance(
            Ability::UpdateOwnProfile,
            all_of([same_tenant(), is_owner()]),
        ))
        .with(AbilitySpec::instance(Ability::AssignRole, assign_role()))
}

// The candidate check runs first, before anything about the record.
fn assign_role() -> Predicate {
    all_of([
        can_assign_candidate(),
        same_tenant(),
        not_owner(),
        owner_not_top_role(),
        cap(AssignRoles),
        outranks_owner(),
        shop_scope(),
    ])
}
