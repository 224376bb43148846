//! Value model helpers
//!
//! Expected and actual trees are plain [`serde_json::Value`]s (built with
//! `preserve_order`, so mappings iterate in insertion order). This module
//! classifies values and implements the type-aware equality used by the
//! verifiers: numbers compare by numeric value regardless of representation,
//! and strings may optionally compare case-insensitively.

use serde_json::{Number, Value};
use std::fmt;

pub use serde_json::Map;

/// Coarse runtime shape of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    /// Classify a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Sequence,
            Value::Object(_) => ValueKind::Mapping,
        }
    }

    /// Whether values of this kind are leaves (null counts as a leaf)
    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueKind::Sequence | ValueKind::Mapping)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Sequence => write!(f, "sequence"),
            ValueKind::Mapping => write!(f, "mapping"),
        }
    }
}

/// Compare two numbers by value, so `400` equals `400.0`
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether a number has no fractional part
pub fn is_integral(number: &Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }
    number
        .as_f64()
        .map(|f| f.is_finite() && f.fract() == 0.0)
        .unwrap_or(false)
}

/// Scalar equality. Containers never compare equal here.
pub fn scalars_equal(expected: &Value, actual: &Value, case_sensitive: bool) -> bool {
    match (expected, actual) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => {
            if case_sensitive {
                a == b
            } else {
                a.to_lowercase() == b.to_lowercase()
            }
        }
        _ => false,
    }
}

/// Deep equality built on [`scalars_equal`]
///
/// Mapping keys are matched exactly and their order is ignored.
pub fn values_equal(expected: &Value, actual: &Value, case_sensitive: bool) -> bool {
    match (expected, actual) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|(x, y)| values_equal(x, y, case_sensitive))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| {
                    b.get(key)
                        .map(|y| values_equal(x, y, case_sensitive))
                        .unwrap_or(false)
                })
        }
        _ => scalars_equal(expected, actual, case_sensitive),
    }
}

/// Render a value as it appears inside issue messages
///
/// Strings are rendered raw (no JSON quoting), everything else as compact JSON.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
