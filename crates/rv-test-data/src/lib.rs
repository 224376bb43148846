//! HTTP test data and whole-response verification
//!
//! Test data files (`*.td.json`) describe one HTTP call: the response it is
//! expected to produce and, once run, the response it actually produced.
//!
//! ```text
//! {
//!   "_guid_": "S-001",
//!   "_extends_": "Base_Case_Response",
//!   "expectedResponse": {
//!     "responseCode": 200,
//!     "headers": {"Content-Type": "application/json"},
//!     "body": {"id": "[[ANY_INTEGER_NOT_NULLABLE]]"}
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rv_test_data::{HttpTestDataSource, JsonStoreHttpTestDataSource, ResponseVerifier};
//!
//! let store = JsonStoreHttpTestDataSource::new(["test-data"])?;
//! let data = store.get_data_for_test_call("S-001")?;
//! let result = ResponseVerifier::new().verify_test_data(&data)?;
//! ```

mod error;
mod model;
mod response;
mod store;

pub use error::{TestDataError, TestDataResult};
pub use model::{HttpTestData, ResponseData};
pub use response::{
    ResponseVerifier, BODY_PATH, HEADERS_PATH, RESPONSE_CODE_PATH, RESPONSE_MESSAGE_PATH,
    RESPONSE_PATH,
};
pub use store::{deep_merge, HttpTestDataSource, JsonStoreHttpTestDataSource, TEST_DATA_SUFFIX};
