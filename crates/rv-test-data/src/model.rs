//! Test data model
//!
//! Field names follow the JSON test data files (`expectedResponse`,
//! `responseCode`, ...). Unknown fields are kept so nothing is lost when a
//! file carries data for other tools.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One HTTP response, expected or actual
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Status code, or a placeholder such as `[[ANY_INTEGER_NOT_NULLABLE]]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResponseData {
    /// Numeric status code, if one is present
    pub fn status_code(&self) -> Option<u16> {
        self.response_code
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    /// Whether the status code is 2xx
    pub fn is_positive(&self) -> bool {
        matches!(self.status_code(), Some(200..=299))
    }

    /// Whether a status code is present and is not 2xx
    pub fn is_negative(&self) -> bool {
        matches!(self.status_code(), Some(code) if !(200..=299).contains(&code))
    }
}

/// Test data for one HTTP call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTestData {
    #[serde(rename = "_guid_", default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    /// Id of the test data this one inherits from
    #[serde(rename = "_extends_", default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_response: Option<ResponseData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_response: Option<ResponseData>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize() {
        let data: HttpTestData = serde_json::from_value(json!({
            "_guid_": "S-001",
            "_extends_": "Base",
            "title": "Get a case",
            "specs": ["an active profile"],
            "expectedResponse": {
                "responseCode": 200,
                "headers": {"Content-Type": "application/json"},
                "body": {"id": "[[ANY_INTEGER_NOT_NULLABLE]]"}
            }
        }))
        .unwrap();

        assert_eq!(data.guid.as_deref(), Some("S-001"));
        assert_eq!(data.extends.as_deref(), Some("Base"));
        assert!(data.extra.contains_key("specs"));
        let expected = data.expected_response.unwrap();
        assert_eq!(expected.status_code(), Some(200));
        assert!(expected.headers.unwrap().contains_key("Content-Type"));
        assert!(data.actual_response.is_none());
    }

    #[test]
    fn test_positive_and_negative() {
        let response = |code: Value| ResponseData {
            response_code: Some(code),
            ..ResponseData::default()
        };

        assert!(response(json!(200)).is_positive());
        assert!(response(json!(204)).is_positive());
        assert!(response(json!(404)).is_negative());
        assert!(!response(json!(404)).is_positive());
        assert!(response(json!(302)).is_negative());

        let placeholder = response(json!("[[ANY_INTEGER_NOT_NULLABLE]]"));
        assert!(!placeholder.is_positive());
        assert!(!placeholder.is_negative());
        assert!(!ResponseData::default().is_negative());
    }
}
