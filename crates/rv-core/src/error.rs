//! Error types for verification
//!
//! Only caller misuse is an error. Data mismatches are reported as issues in a
//! [`VerificationResult`](crate::VerificationResult) and never fail a call.

use std::fmt;
use thiserror::Error;

/// Result type for verifier operations
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Configuration errors raised before or during a verification walk
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The cascade depth budget was negative
    #[error("maximum message depth must be non-negative, got {depth}")]
    NegativeDepth { depth: i64 },

    /// A collection option held a value that is not recognised
    #[error("unknown {option} '{value}'")]
    UnknownOption { option: &'static str, value: String },

    /// An in-band collection directive could not be interpreted
    #[error("invalid collection directive at {path}: {reason}")]
    InvalidDirective { path: String, reason: String },
}

/// Returned by [`VerificationResult::into_result`](crate::VerificationResult::into_result)
/// when a verification found issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub path: String,
    pub issues: Vec<String>,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = if self.path.is_empty() {
            "verification"
        } else {
            self.path.as_str()
        };
        write!(f, "{} failed with {} issue(s)", subject, self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}
