//! Wildcard placeholders for expected values
//!
//! An expected string such as `[[ANY_INTEGER_NOT_NULLABLE]]` is not compared
//! literally. It stands for a predicate over the actual value: a type
//! constraint plus a nullability flag.
//!
//! | placeholder                     | accepts (non-null)                          |
//! |---------------------------------|---------------------------------------------|
//! | `ANYTHING_PRESENT`              | anything, never null                        |
//! | `ANY_[NOT_]NULLABLE`            | anything                                    |
//! | `ANY_STRING_[NOT_]NULLABLE`     | strings                                     |
//! | `ANY_INTEGER_[NOT_]NULLABLE`    | numbers without a fractional part           |
//! | `ANY_NUMBER_[NOT_]NULLABLE`     | any number                                  |
//! | `ANY_FLOATING_[NOT_]NULLABLE`   | any number                                  |
//! | `ANY_DATE_[NOT_]NULLABLE`       | `yyyy-MM-dd` strings                        |
//! | `ANY_TIMESTAMP_[NOT_]NULLABLE`  | `yyyy-MM-ddTHH:mm:ss.SSS` strings           |
//! | `ANY_OBJECT_[NOT_]NULLABLE`     | mappings, sequences and opaque scalars      |

use crate::value::{is_integral, literal};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Type constraint encoded by a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    AnythingPresent,
    Any,
    String,
    Integer,
    Number,
    Floating,
    Date,
    Timestamp,
    Object,
}

/// Whether a placeholder accepts `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullability {
    Nullable,
    NotNullable,
}

/// A recognised wildcard placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    kind: PlaceholderKind,
    nullability: Nullability,
    name: &'static str,
}

macro_rules! placeholders {
    ($($ident:ident => ($kind:ident, $nullability:ident)),+ $(,)?) => {
        impl Placeholder {
            $(
                pub const $ident: Placeholder = Placeholder {
                    kind: PlaceholderKind::$kind,
                    nullability: Nullability::$nullability,
                    name: stringify!($ident),
                };
            )+

            /// Every placeholder the resolver recognises
            pub const ALL: &'static [Placeholder] = &[$(Placeholder::$ident),+];
        }
    };
}

placeholders! {
    ANYTHING_PRESENT => (AnythingPresent, NotNullable),
    ANY_NULLABLE => (Any, Nullable),
    ANY_NOT_NULLABLE => (Any, NotNullable),
    ANY_STRING_NULLABLE => (String, Nullable),
    ANY_STRING_NOT_NULLABLE => (String, NotNullable),
    ANY_INTEGER_NULLABLE => (Integer, Nullable),
    ANY_INTEGER_NOT_NULLABLE => (Integer, NotNullable),
    ANY_NUMBER_NULLABLE => (Number, Nullable),
    ANY_NUMBER_NOT_NULLABLE => (Number, NotNullable),
    ANY_FLOATING_NULLABLE => (Floating, Nullable),
    ANY_FLOATING_NOT_NULLABLE => (Floating, NotNullable),
    ANY_DATE_NULLABLE => (Date, Nullable),
    ANY_DATE_NOT_NULLABLE => (Date, NotNullable),
    ANY_TIMESTAMP_NULLABLE => (Timestamp, Nullable),
    ANY_TIMESTAMP_NOT_NULLABLE => (Timestamp, NotNullable),
    ANY_OBJECT_NULLABLE => (Object, Nullable),
    ANY_OBJECT_NOT_NULLABLE => (Object, NotNullable),
}

impl Placeholder {
    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    pub fn is_nullable(&self) -> bool {
        self.nullability == Nullability::Nullable
    }

    /// Bare name, e.g. `ANY_STRING_NULLABLE`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The string that stands for this placeholder in expected data
    pub fn sentinel(&self) -> String {
        format!("[[{}]]", self.name)
    }

    /// Recognise a sentinel string
    pub fn parse(text: &str) -> Option<Self> {
        let name = text.strip_prefix("[[")?.strip_suffix("]]")?;
        Self::ALL.iter().copied().find(|p| p.name == name)
    }

    /// Recognise a sentinel in an expected value
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    /// Check an actual value against this placeholder
    pub fn accepts(&self, actual: &Value) -> bool {
        match actual {
            Value::Null => self.is_nullable(),
            value => self.kind.matches(value),
        }
    }

    /// Entry text for a rejected value, without path context
    pub fn describe_rejection(&self, actual: &Value) -> String {
        format!("expected {} but got {}", self.name, literal(actual))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PlaceholderKind {
    /// Type check for a non-null value
    fn matches(self, value: &Value) -> bool {
        match self {
            PlaceholderKind::AnythingPresent | PlaceholderKind::Any | PlaceholderKind::Object => {
                true
            }
            PlaceholderKind::String => value.is_string(),
            PlaceholderKind::Integer => matches!(value, Value::Number(n) if is_integral(n)),
            PlaceholderKind::Number | PlaceholderKind::Floating => value.is_number(),
            PlaceholderKind::Date => value.as_str().map(is_date).unwrap_or(false),
            PlaceholderKind::Timestamp => value.as_str().map(is_timestamp).unwrap_or(false),
        }
    }
}

/// Outcome of checking an expected value for a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The expected value is an ordinary literal
    NotPlaceholder,
    Accepted(Placeholder),
    Rejected(Placeholder),
}

/// Resolve an expected value against an actual one
pub fn resolve(expected: &Value, actual: &Value) -> Resolution {
    match Placeholder::from_value(expected) {
        None => Resolution::NotPlaceholder,
        Some(p) if p.accepts(actual) => Resolution::Accepted(p),
        Some(p) => Resolution::Rejected(p),
    }
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"))
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{1,9}$")
            .expect("timestamp pattern compiles")
    })
}

fn is_date(text: &str) -> bool {
    date_pattern().is_match(text) && NaiveDate::parse_from_str(text, DATE_FORMAT).is_ok()
}

fn is_timestamp(text: &str) -> bool {
    timestamp_pattern().is_match(text)
        && NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sentinels() {
        assert_eq!(
            Placeholder::parse("[[ANY_STRING_NULLABLE]]"),
            Some(Placeholder::ANY_STRING_NULLABLE)
        );
        assert_eq!(
            Placeholder::parse("[[ANYTHING_PRESENT]]"),
            Some(Placeholder::ANYTHING_PRESENT)
        );
        assert_eq!(Placeholder::parse("ANY_STRING_NULLABLE"), None);
        assert_eq!(Placeholder::parse("[[ANY_UNICORN]]"), None);
        assert_eq!(Placeholder::ALL.len(), 17);
    }

    #[test]
    fn test_sentinel_round_trip_for_all() {
        for placeholder in Placeholder::ALL {
            assert_eq!(Placeholder::parse(&placeholder.sentinel()), Some(*placeholder));
        }
    }

    #[test]
    fn test_nullability() {
        assert!(Placeholder::ANY_STRING_NULLABLE.accepts(&json!(null)));
        assert!(!Placeholder::ANY_STRING_NOT_NULLABLE.accepts(&json!(null)));
        assert!(!Placeholder::ANYTHING_PRESENT.accepts(&json!(null)));
        assert!(Placeholder::ANY_NULLABLE.accepts(&json!(null)));
    }

    #[test]
    fn test_integer() {
        let p = Placeholder::ANY_INTEGER_NOT_NULLABLE;
        assert!(p.accepts(&json!(400)));
        assert!(p.accepts(&json!(400.0)));
        assert!(!p.accepts(&json!(400.5)));
        assert!(!p.accepts(&json!("400")));
        assert!(!p.accepts(&json!(null)));
    }

    #[test]
    fn test_number_and_floating() {
        for p in [
            Placeholder::ANY_NUMBER_NOT_NULLABLE,
            Placeholder::ANY_FLOATING_NOT_NULLABLE,
        ] {
            assert!(p.accepts(&json!(600)));
            assert!(p.accepts(&json!(700.5)));
            assert!(!p.accepts(&json!("700.5")));
        }
    }

    #[test]
    fn test_date() {
        let p = Placeholder::ANY_DATE_NOT_NULLABLE;
        assert!(p.accepts(&json!("2019-11-23")));
        assert!(!p.accepts(&json!("2019-13-23")));
        assert!(!p.accepts(&json!("2019-1-3")));
        assert!(!p.accepts(&json!("2019-11-13T14:02:43.431")));
        assert!(!p.accepts(&json!(20191123)));
    }

    #[test]
    fn test_timestamp() {
        let p = Placeholder::ANY_TIMESTAMP_NOT_NULLABLE;
        assert!(p.accepts(&json!("2019-11-13T14:02:43.431")));
        assert!(p.accepts(&json!("2019-11-13T14:02:43.431123456")));
        assert!(!p.accepts(&json!("2019-11-13T14:02:43")));
        assert!(!p.accepts(&json!("2019-11-13T25:02:43.431")));
        assert!(!p.accepts(&json!("2019-11-13")));
    }

    #[test]
    fn test_object_accepts_any_shape() {
        let p = Placeholder::ANY_OBJECT_NOT_NULLABLE;
        assert!(p.accepts(&json!({"a": 1})));
        assert!(p.accepts(&json!([1, 2])));
        assert!(p.accepts(&json!(400)));
        assert!(!p.accepts(&json!(null)));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(&json!("literal"), &json!("x")), Resolution::NotPlaceholder);
        assert_eq!(
            resolve(&json!("[[ANY_STRING_NOT_NULLABLE]]"), &json!("x")),
            Resolution::Accepted(Placeholder::ANY_STRING_NOT_NULLABLE)
        );
        assert_eq!(
            resolve(&json!("[[ANY_STRING_NOT_NULLABLE]]"), &json!(1)),
            Resolution::Rejected(Placeholder::ANY_STRING_NOT_NULLABLE)
        );
    }

    #[test]
    fn test_describe_rejection() {
        assert_eq!(
            Placeholder::ANY_INTEGER_NOT_NULLABLE.describe_rejection(&json!(null)),
            "expected ANY_INTEGER_NOT_NULLABLE but got null"
        );
    }
}
