//! Structural verification of expected vs actual response trees
//!
//! An expected template is compared with an actual decoded value and every
//! discrepancy is reported at once, aggregated per level:
//!
//! ```text
//! actualResponse.body has unexpected field(s): [extra]
//! actualResponse.body lacks [missing] field(s) that was/were actually expected to be there.
//! actualResponse.body contains 1 bad value(s): [status: expected 'open' but got 'closed']
//! ```
//!
//! Expected scalars may be wildcard placeholders such as
//! `[[ANY_INTEGER_NOT_NULLABLE]]`, and sequences are compared under
//! configurable [`CollectionOptions`].
//!
//! # Example
//!
//! ```
//! use rv_core::MapVerifier;
//! use serde_json::json;
//!
//! let verifier = MapVerifier::new("actualResponse.body");
//! let result = verifier
//!     .verify(
//!         &json!({"id": "[[ANY_INTEGER_NOT_NULLABLE]]", "state": "open"}),
//!         &json!({"id": 42, "state": "open"}),
//!     )
//!     .unwrap();
//! assert!(result.is_verified());
//! ```

mod collection_verifier;
mod error;
mod map_verifier;
mod options;
mod result;
pub mod value;
pub mod wildcard;

pub use collection_verifier::verify_collection;
pub use error::{VerificationFailure, VerifyError, VerifyResult};
pub use map_verifier::{verify, MapVerifier, DEFAULT_MAX_DEPTH};
pub use options::{
    split_directive, CollectionOperator, CollectionOptions, CollectionPolicies, ElementOrdering,
    DEFAULT_ELEMENT_ID, ELEMENT_ID_DIRECTIVE, OPERATOR_DIRECTIVE, ORDERING_DIRECTIVE,
};
pub use result::VerificationResult;
pub use wildcard::{Nullability, Placeholder, PlaceholderKind, Resolution};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
