//! Whole-response verification
//!
//! Checks an actual [`ResponseData`] against an expected one: the status code
//! and message when expected, then the headers, then the body. Header names
//! and values compare case-insensitively, and only headers named in the
//! expected response are checked. A part the expected response leaves out is
//! not checked.

use crate::error::{TestDataError, TestDataResult};
use crate::model::{HttpTestData, ResponseData};
use rv_core::{verify, CollectionPolicies, MapVerifier, VerificationResult, VerifyResult};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

pub const RESPONSE_PATH: &str = "actualResponse";
pub const RESPONSE_CODE_PATH: &str = "actualResponse.responseCode";
pub const RESPONSE_MESSAGE_PATH: &str = "actualResponse.responseMessage";
pub const HEADERS_PATH: &str = "actualResponse.headers";
pub const BODY_PATH: &str = "actualResponse.body";

/// Verifies complete HTTP responses
#[derive(Debug, Clone)]
pub struct ResponseVerifier {
    headers: MapVerifier,
    body: MapVerifier,
}

impl Default for ResponseVerifier {
    fn default() -> Self {
        Self {
            headers: MapVerifier::new(HEADERS_PATH).with_case_sensitivity(false),
            body: MapVerifier::new(BODY_PATH),
        }
    }
}

impl ResponseVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier with explicit body settings; headers stay case-insensitive
    pub fn with_settings(
        max_depth: i64,
        case_sensitive: bool,
        collections: CollectionPolicies,
    ) -> VerifyResult<Self> {
        Ok(Self {
            headers: MapVerifier::with_max_depth(HEADERS_PATH, max_depth)?
                .with_case_sensitivity(false),
            body: MapVerifier::with_max_depth(BODY_PATH, max_depth)?
                .with_case_sensitivity(case_sensitive)
                .with_collection_policies(collections),
        })
    }

    pub fn body_verifier(&self) -> &MapVerifier {
        &self.body
    }

    /// Verify one actual response against the expected one
    pub fn verify(
        &self,
        expected: &ResponseData,
        actual: &ResponseData,
    ) -> VerifyResult<VerificationResult> {
        debug!(
            expected_code = ?expected.response_code,
            actual_code = ?actual.response_code,
            "Verifying response"
        );
        let mut result = VerificationResult::verified(RESPONSE_PATH);

        if let Some(code) = &expected.response_code {
            let actual_code = actual.response_code.as_ref().unwrap_or(&Value::Null);
            result.merge(verify(RESPONSE_CODE_PATH, 0, true, code, actual_code)?);
        }

        if let Some(message) = &expected.response_message {
            let expected_message = Value::String(message.clone());
            let actual_message = actual
                .response_message
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null);
            result.merge(verify(
                RESPONSE_MESSAGE_PATH,
                0,
                true,
                &expected_message,
                &actual_message,
            )?);
        }

        if let Some(expected_headers) = &expected.headers {
            let actual_headers = expected_subset(expected_headers, actual.headers.as_ref());
            result.merge(
                self.headers
                    .verify_map(Some(expected_headers), Some(&actual_headers))?,
            );
        }

        if let Some(expected_body) = &expected.body {
            let actual_body = actual.body.as_ref().unwrap_or(&Value::Null);
            result.merge(self.body.verify(expected_body, actual_body)?);
        }

        Ok(result)
    }

    /// Verify the actual response recorded in a test data against its expected one
    pub fn verify_test_data(&self, data: &HttpTestData) -> TestDataResult<VerificationResult> {
        let id = || data.guid.clone().unwrap_or_default();
        let expected = data
            .expected_response
            .as_ref()
            .ok_or_else(|| TestDataError::MissingResponse {
                id: id(),
                which: "expectedResponse",
            })?;
        let actual = data
            .actual_response
            .as_ref()
            .ok_or_else(|| TestDataError::MissingResponse {
                id: id(),
                which: "actualResponse",
            })?;
        Ok(self.verify(expected, actual)?)
    }
}

/// The actual headers whose names appear in the expected ones
fn expected_subset(
    expected: &Map<String, Value>,
    actual: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let wanted: HashSet<String> = expected.keys().map(|k| k.to_lowercase()).collect();
    actual
        .into_iter()
        .flatten()
        .filter(|(name, _)| wanted.contains(&name.to_lowercase()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
