//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::CachePolicy;

/// Process-wide STRATA configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Expiry and stale-reuse policy.
    #[serde(default)]
    pub policy: CachePolicy,
    /// Directory holding the durable tier's LMDB environment.
    #[serde(default = "default_durable_dir")]
    pub durable_dir: PathBuf,
    /// Maximum size of the durable tier, in megabytes.
    #[serde(default = "default_durable_max_size_mb")]
    pub durable_max_size_mb: usize,
}

fn default_durable_dir() -> PathBuf {
    PathBuf::from("strata-cache")
}

fn default_durable_max_size_mb() -> usize {
    256
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            durable_dir: default_durable_dir(),
            durable_max_size_mb: default_durable_max_size_mb(),
        }
    }
}

impl StrataConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.durable_max_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "durable_max_size_mb".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.policy.expire_after.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "policy.expire_after".to_string(),
                reason: "a zero expiry window would expire every write immediately".to_string(),
            });
        }
        Ok(())
    }
}
