//! Policy configuration: the role table and the lifecycle tables as data.
//!
//! Ability logic is code; the tables it reads are loaded once at startup and
//! may be overridden per deployment from a JSON file named by
//! `SHOPGATE_POLICY_OVERRIDES`.

use std::env::VarError;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::ConfigError;
use crate::lifecycle::{LifecycleSpec, standard_lifecycles};
use crate::roles::{Role, RoleSpec, changed_roles, standard_roles};

/// Environment variable holding the path of a JSON overrides file.
pub const OVERRIDES_ENV: &str = "SHOPGATE_POLICY_OVERRIDES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub top_role: Role,
    pub roles: Vec<RoleSpec>,
    pub lifecycles: Vec<LifecycleSpec>,
}

/// Rows replacing (or adding to) the standard tables, keyed by role and by
/// resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    #[serde(default)]
    pub lifecycles: Vec<LifecycleSpec>,
}

impl PolicyConfig {
    /// The built-in tables.
    pub fn standard() -> Self {
        Self {
            top_role: Role::Owner,
            roles: standard_roles(),
            lifecycles: standard_lifecycles(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a complete configuration file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_json_str(&read(path.as_ref())?)?;
        info!(
            roles = config.roles.len(),
            lifecycles = config.lifecycles.len(),
            "loaded policy config"
        );
        Ok(config)
    }

    /// Standard tables with the overrides file named by
    /// [`OVERRIDES_ENV`] applied, if set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(OVERRIDES_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let overrides = PolicyOverrides::from_path(path.trim())?;
                Ok(Self::standard().apply_overrides(overrides))
            }
            Err(VarError::NotUnicode(value)) => Err(ConfigError::InvalidEnv {
                var: OVERRIDES_ENV,
                value: value.to_string_lossy().into_owned(),
            }),
            Ok(_) | Err(VarError::NotPresent) => {
                warn!("{OVERRIDES_ENV} not set; using standard policy tables");
                Ok(Self::standard())
            }
        }
    }

    /// Replace rows by key; unknown keys are appended.
    ///
    /// Validation happens when the registry is built from the result.
    pub fn apply_overrides(mut self, overrides: PolicyOverrides) -> Self {
        let before = self.roles.clone();
        for spec in overrides.roles {
            match self.roles.iter_mut().find(|row| row.role == spec.role) {
                Some(row) => *row = spec,
                None => self.roles.push(spec),
            }
        }
        for role in changed_roles(&before, &self.roles) {
            info!(%role, "role table row overridden");
        }

        for spec in overrides.lifecycles {
            info!(kind = %spec.resource, "lifecycle table overridden");
            match self
                .lifecycles
                .iter_mut()
                .find(|table| table.resource == spec.resource)
            {
                Some(table) => *table = spec,
                None => self.lifecycles.push(spec),
            }
        }
        self
    }
}

impl PolicyOverrides {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let overrides = Self::from_json_str(&read(path.as_ref())?)?;
        info!(
            roles = overrides.roles.len(),
            lifecycles = overrides.lifecycles.len(),
            "loaded policy overrides"
        );
        Ok(overrides)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
