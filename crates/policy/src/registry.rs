//! Central dispatch from `(resource kind, ability)` to a predicate tree.
//!
//! The registry is the single entry point callers use. It is immutable after
//! construction and `Send + Sync`, so one instance can be shared behind an
//! `Arc` by every request handler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, instrument, warn};

use crate::ability::{Ability, AbilityContext, AbilitySpec, Target};
use crate::actor::Actor;
use crate::authorize::{AuthzError, Decision, Explanation};
use crate::config::PolicyConfig;
use crate::error::{ConfigError, PolicyError};
use crate::lifecycle::{LifecycleGate, StatusGuard};
use crate::policies;
use crate::predicate::{Check, Env, Recorder};
use crate::resource::{Field, ResourceKind, ResourceShape, ResourceSnapshot};
use crate::roles::RoleHierarchy;

/// Declared shape and ability table of one resource kind.
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    kind: ResourceKind,
    shape: ResourceShape,
    abilities: Vec<AbilitySpec>,
}

impl ResourcePolicy {
    pub fn new(kind: ResourceKind, shape: ResourceShape) -> Self {
        Self {
            kind,
            shape,
            abilities: Vec::new(),
        }
    }

    pub fn with(mut self, spec: AbilitySpec) -> Self {
        self.abilities.push(spec);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn shape(&self) -> &ResourceShape {
        &self.shape
    }

    pub fn ability(&self, ability: Ability) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|spec| spec.ability == ability)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &AbilitySpec> {
        self.abilities.iter()
    }
}

#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    hierarchy: RoleHierarchy,
    lifecycle: LifecycleGate,
    policies: HashMap<ResourceKind, ResourcePolicy>,
}

impl PolicyRegistry {
    /// Built-in role table, lifecycle tables and ability tables.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::from_config(PolicyConfig::standard())
    }

    /// Built-in ability tables over a (possibly overridden) configuration.
    pub fn from_config(config: PolicyConfig) -> Result<Self, ConfigError> {
        let build = || -> Result<Self, ConfigError> {
            let hierarchy = RoleHierarchy::from_specs(config.top_role, config.roles)?;
            let lifecycle = LifecycleGate::from_specs(config.lifecycles)?;
            Self::new(hierarchy, lifecycle, policies::standard())
        };
        build().inspect_err(|err| error!(error = %err, "invalid policy configuration"))
    }

    /// Register `policies` and validate them against the tables.
    pub fn new(
        hierarchy: RoleHierarchy,
        lifecycle: LifecycleGate,
        policies: Vec<ResourcePolicy>,
    ) -> Result<Self, ConfigError> {
        let mut by_kind = HashMap::with_capacity(policies.len());
        for policy in policies {
            let kind = policy.kind;
            if by_kind.insert(kind, policy).is_some() {
                return Err(ConfigError::DuplicateResource(kind));
            }
        }

        let registry = Self {
            hierarchy,
            lifecycle,
            policies: by_kind,
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn lifecycle(&self) -> &LifecycleGate {
        &self.lifecycle
    }

    pub fn policy(&self, kind: ResourceKind) -> Result<&ResourcePolicy, PolicyError> {
        self.policies
            .get(&kind)
            .ok_or(PolicyError::UnregisteredResource(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.policies.keys().copied()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────

    /// Decide whether `actor` may perform `ability` on `kind`.
    ///
    /// `resource` is required for instance abilities and ignored otherwise.
    /// Denials are `Ok(Decision { allowed: false, .. })`; `Err` means the call
    /// itself is malformed and must not be treated as a deny.
    pub fn can(
        &self,
        actor: &Actor,
        ability: Ability,
        kind: ResourceKind,
        resource: Option<&ResourceSnapshot>,
        context: &AbilityContext,
    ) -> Result<Decision, PolicyError> {
        let decision = self
            .evaluate(actor, ability, kind, resource, context, &mut Recorder::off())
            .inspect_err(|err| {
                error!(%kind, %ability, actor = %actor, error = %err, "policy evaluation failed")
            })?;
        debug!(
            %kind,
            %ability,
            actor = %actor,
            allowed = decision.allowed,
            reason = %decision.reason,
            "policy decision"
        );
        Ok(decision)
    }

    /// [`can`](Self::can) for string-keyed callers.
    pub fn can_named(
        &self,
        actor: &Actor,
        ability: &str,
        kind: &str,
        resource: Option<&ResourceSnapshot>,
        context: &AbilityContext,
    ) -> Result<Decision, PolicyError> {
        let log = |err: &PolicyError| error!(error = %err, "policy lookup failed");
        let ability = ability.parse::<Ability>().inspect_err(log)?;
        let kind = kind.parse::<ResourceKind>().inspect_err(log)?;
        self.can(actor, ability, kind, resource, context)
    }

    /// Command-boundary form: `Err(Denied)` for a denial.
    pub fn authorize(
        &self,
        actor: &Actor,
        ability: Ability,
        kind: ResourceKind,
        resource: Option<&ResourceSnapshot>,
        context: &AbilityContext,
    ) -> Result<(), AuthzError> {
        self.can(actor, ability, kind, resource, context)?
            .into_result()
    }

    /// Evaluate and return the ordered trace of checks that ran.
    #[instrument(skip_all, fields(kind = %kind, ability = %ability, actor = %actor))]
    pub fn explain(
        &self,
        actor: &Actor,
        ability: Ability,
        kind: ResourceKind,
        resource: Option<&ResourceSnapshot>,
        context: &AbilityContext,
    ) -> Result<Explanation, PolicyError> {
        let mut trace = Vec::new();
        let decision = self
            .evaluate(
                actor,
                ability,
                kind,
                resource,
                context,
                &mut Recorder::capture(&mut trace),
            )
            .inspect_err(|err| error!(error = %err, "policy evaluation failed"))?;

        let summary = if decision.allowed {
            format!("{actor} may {ability} {kind}")
        } else {
            warn!(reason = %decision.reason, "denied");
            format!(
                "{actor} may not {ability} {kind}: {}",
                decision.reason.message()
            )
        };

        Ok(Explanation {
            actor: actor.to_string(),
            kind,
            ability,
            decision,
            summary,
            trace,
        })
    }

    /// Instance abilities `actor` currently holds on `resource`, in table order.
    ///
    /// Abilities that need extra context (a candidate role) are left out; ask
    /// for those with [`can`](Self::can).
    pub fn permitted_abilities(
        &self,
        actor: &Actor,
        resource: &ResourceSnapshot,
    ) -> Result<Vec<Ability>, PolicyError> {
        let policy = self.policy(resource.kind)?;
        let context = AbilityContext::default();
        let mut permitted = Vec::new();
        for spec in policy.abilities() {
            if spec.target != Target::Instance
                || spec.predicate.any_check(&|c| matches!(c, Check::CanAssignCandidate))
            {
                continue;
            }
            if self
                .can(actor, spec.ability, resource.kind, Some(resource), &context)?
                .allowed
            {
                permitted.push(spec.ability);
            }
        }
        Ok(permitted)
    }

    /// Compare-and-swap guard for committing `ability` on `resource`.
    ///
    /// `None` when the ability moves no status.
    pub fn transition_guard(
        &self,
        resource: &ResourceSnapshot,
        ability: Ability,
    ) -> Result<Option<StatusGuard<'_>>, PolicyError> {
        let spec = self.ability_spec(resource.kind, ability)?;
        if spec.target != Target::Instance {
            return Ok(None);
        }
        let Some(transition) = spec.predicate.transitions().into_iter().next() else {
            return Ok(None);
        };
        let status = resource.status.clone().ok_or(PolicyError::MissingField {
            kind: resource.kind,
            field: Field::Status,
        })?;
        self.lifecycle
            .guard(resource.kind, status, transition)
            .map(Some)
    }

    fn ability_spec(
        &self,
        kind: ResourceKind,
        ability: Ability,
    ) -> Result<&AbilitySpec, PolicyError> {
        self.policy(kind)?
            .ability(ability)
            .ok_or(PolicyError::AbilityNotRegistered { kind, ability })
    }

    fn evaluate(
        &self,
        actor: &Actor,
        ability: Ability,
        kind: ResourceKind,
        resource: Option<&ResourceSnapshot>,
        context: &AbilityContext,
        recorder: &mut Recorder<'_>,
    ) -> Result<Decision, PolicyError> {
        let policy = self.policy(kind)?;
        let spec = policy
            .ability(ability)
            .ok_or(PolicyError::AbilityNotRegistered { kind, ability })?;

        let subject = match spec.target {
            Target::Instance => {
                let resource = resource.ok_or(PolicyError::MissingResource { kind, ability })?;
                expect_kind(kind, resource)?;
                resource.conforms_to(&policy.shape)?;
                Some(resource)
            }
            Target::Collection => None,
            Target::Parent(parent) => {
                let snapshot = context.parent.as_ref().ok_or(PolicyError::MissingParent {
                    kind,
                    ability,
                    parent,
                })?;
                expect_kind(parent, snapshot)?;
                snapshot.conforms_to(&self.policy(parent)?.shape)?;
                Some(snapshot)
            }
        };

        let env = Env {
            hierarchy: &self.hierarchy,
            lifecycle: &self.lifecycle,
            actor,
            kind,
            ability,
            target: spec.target,
            subject,
            context,
        };
        spec.predicate.evaluate(&env, recorder, 0)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration checks
    // ─────────────────────────────────────────────────────────────────────

    fn validate(&self) -> Result<(), ConfigError> {
        for policy in self.policies.values() {
            let kind = policy.kind;
            if policy.shape.has_status() && !self.lifecycle.has_table(kind) {
                return Err(ConfigError::MissingLifecycle(kind));
            }

            let mut seen = HashSet::new();
            for spec in &policy.abilities {
                let ability = spec.ability;
                if !seen.insert(ability) {
                    return Err(ConfigError::DuplicateAbility { kind, ability });
                }
                if !spec.predicate.enforces_tenancy() {
                    return Err(ConfigError::TenancyNotEnforced { kind, ability });
                }

                let target = match spec.target {
                    Target::Collection => {
                        if spec.predicate.any_check(&Check::is_instance_only) {
                            return Err(ConfigError::InstanceOnlyPredicate { kind, ability });
                        }
                        continue;
                    }
                    Target::Instance => policy,
                    Target::Parent(parent) => {
                        self.policies
                            .get(&parent)
                            .ok_or(ConfigError::UnregisteredParent {
                                kind,
                                ability,
                                parent,
                            })?
                    }
                };

                if let Some(field) = spec
                    .predicate
                    .fields()
                    .into_iter()
                    .find(|field| !target.shape.declares(*field))
                {
                    return Err(ConfigError::UndeclaredField {
                        kind,
                        ability,
                        target: target.kind,
                        field,
                    });
                }

                for transition in spec.predicate.transitions() {
                    let table = self
                        .lifecycle
                        .table(target.kind)
                        .map_err(|_| ConfigError::MissingLifecycle(target.kind))?;
                    if !table.knows(transition) {
                        return Err(ConfigError::UnreachableTransition {
                            kind,
                            ability,
                            target: target.kind,
                            transition,
                        });
                    }
                }

                if spec.target == Target::Instance
                    && ability.is_mutating()
                    && policy.shape.has_status()
                    && !spec.predicate.enforces_lifecycle()
                {
                    return Err(ConfigError::UngatedMutation { kind, ability });
                }
            }
        }

        for kind in self.lifecycle.kinds() {
            let used = self
                .policies
                .get(&kind)
                .is_some_and(|policy| policy.shape.has_status());
            if !used {
                return Err(ConfigError::UnusedLifecycle(kind));
            }
        }

        Ok(())
    }
}

fn expect_kind(expected: ResourceKind, snapshot: &ResourceSnapshot) -> Result<(), PolicyError> {
    if snapshot.kind == expected {
        Ok(())
    } else {
        Err(PolicyError::KindMismatch {
            expected,
            actual: snapshot.kind,
        })
    }
}
