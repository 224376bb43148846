//! Error types for test data loading and response verification

use rv_core::VerifyError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for test data operations
pub type TestDataResult<T> = Result<T, TestDataError>;

/// Errors that can occur while loading or using test data
#[derive(Debug, Error)]
pub enum TestDataError {
    /// Failed to list a directory
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON
    #[error("failed to parse JSON in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A test data file does not hold a JSON object
    #[error("test data in {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    /// Two files declare the same id
    #[error("duplicate test data id '{id}' in {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// No test data with this id
    #[error("test data '{id}' not found")]
    NotFound { id: String },

    /// `_extends_` names a base that does not exist
    #[error("test data '{id}' extends unknown test data '{base}'")]
    UnknownBase { id: String, base: String },

    /// `_extends_` chain loops back on itself
    #[error("circular _extends_ chain: {chain}")]
    CircularExtends { chain: String },

    /// The resolved test data has the wrong shape
    #[error("invalid test data '{id}': {source}")]
    InvalidData {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A response needed for verification is absent
    #[error("test data '{id}' has no {which}")]
    MissingResponse { id: String, which: &'static str },

    /// The verifier rejected its configuration
    #[error(transparent)]
    Verifier(#[from] VerifyError),
}
