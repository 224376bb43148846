//! Verifier configuration
//!
//! Reads the settings of a [`MapVerifier`] from a YAML document:
//!
//! ```yaml
//! field_prefix: actualResponse.body
//! max_depth: 5
//! case_sensitive: true
//! collections:
//!   default:
//!     ordering: ordered
//!     operator: equivalent-of
//!   fields:
//!     user.idam:
//!       ordering: unordered
//!       element_id: [id]
//! ```
//!
//! Every key is optional. `RV_FIELD_PREFIX`, `RV_MAX_DEPTH` and
//! `RV_CASE_SENSITIVE` override the file when set.

use crate::error::{ConfigError, ConfigResult};
use rv_core::{CollectionPolicies, MapVerifier, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

pub const FIELD_PREFIX_VAR: &str = "RV_FIELD_PREFIX";
pub const MAX_DEPTH_VAR: &str = "RV_MAX_DEPTH";
pub const CASE_SENSITIVE_VAR: &str = "RV_CASE_SENSITIVE";

/// Settings for building a [`MapVerifier`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Path prefix of every issue message
    #[serde(default = "default_field_prefix")]
    pub field_prefix: String,

    /// Cascade depth budget, must not be negative
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,

    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub collections: CollectionPolicies,
}

fn default_field_prefix() -> String {
    "actualResponse".to_string()
}

fn default_max_depth() -> i64 {
    DEFAULT_MAX_DEPTH as i64
}

fn default_case_sensitive() -> bool {
    true
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            field_prefix: default_field_prefix(),
            max_depth: default_max_depth(),
            case_sensitive: default_case_sensitive(),
            collections: CollectionPolicies::default(),
        }
    }
}

impl VerifierConfig {
    /// Load a configuration file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading verifier config: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_yaml_str(&content, path)?.with_env_overrides()
    }

    /// Parse a configuration document without consulting the environment
    pub fn from_yaml_str(content: &str, source_path: &Path) -> ConfigResult<Self> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RV_*` variables from the process environment
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|var| env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(FIELD_PREFIX_VAR) {
            trace!(var = FIELD_PREFIX_VAR, value = %prefix, "Overriding field prefix");
            self.field_prefix = prefix;
        }

        if let Some(value) = lookup(MAX_DEPTH_VAR) {
            trace!(var = MAX_DEPTH_VAR, value = %value, "Overriding max depth");
            self.max_depth = value.trim().parse().map_err(|_| ConfigError::EnvVar {
                var: MAX_DEPTH_VAR.to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(CASE_SENSITIVE_VAR) {
            trace!(var = CASE_SENSITIVE_VAR, value = %value, "Overriding case sensitivity");
            self.case_sensitive = parse_flag(&value).ok_or_else(|| ConfigError::EnvVar {
                var: CASE_SENSITIVE_VAR.to_string(),
                value: value.clone(),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check values the YAML types cannot rule out
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth < 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_depth".to_string(),
                reason: format!("must be non-negative, got {}", self.max_depth),
            });
        }

        let identities = std::iter::once(("collections.default".to_string(), &self.collections.default))
            .chain(
                self.collections
                    .fields
                    .iter()
                    .map(|(field, options)| (format!("collections.fields.{}", field), options)),
            );
        for (key, options) in identities {
            if let Some(fields) = &options.element_id {
                if fields.iter().any(|f| f.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        key: format!("{}.element_id", key),
                        reason: "field names must not be empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the verifier these settings describe
    pub fn build_verifier(&self) -> ConfigResult<MapVerifier> {
        let verifier = MapVerifier::with_max_depth(self.field_prefix.clone(), self.max_depth)?
            .with_case_sensitivity(self.case_sensitive)
            .with_collection_policies(self.collections.clone());
        Ok(verifier)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
