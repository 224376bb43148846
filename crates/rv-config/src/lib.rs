//! YAML configuration for response verification
//!
//! Loads the settings of a verifier (field prefix, cascade depth budget, case
//! sensitivity and collection policies) from a YAML file, with `RV_*`
//! environment variables taking precedence.
//!
//! # Example
//!
//! ```ignore
//! use rv_config::VerifierConfig;
//!
//! let verifier = VerifierConfig::load("verifier.yaml")?.build_verifier()?;
//! ```

mod config;
mod error;

pub use config::{VerifierConfig, CASE_SENSITIVE_VAR, FIELD_PREFIX_VAR, MAX_DEPTH_VAR};
pub use error::{ConfigError, ConfigResult};
