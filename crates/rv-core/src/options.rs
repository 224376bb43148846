//! Collection comparison options
//!
//! How two sequences are compared is decided per field. Options come from, in
//! order of precedence:
//!
//! 1. an in-band directive: a leading expected element such as
//!    `{"__ordering__": "unordered", "__elementId__": "id,name"}`
//! 2. [`CollectionPolicies`] entries keyed by field path or field name
//! 3. the policies' default (`ordered`, `equivalent-of`, identity by `id`)

use crate::error::{VerifyError, VerifyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Field used to pair elements when no element id is configured
pub const DEFAULT_ELEMENT_ID: &str = "id";

pub const ORDERING_DIRECTIVE: &str = "__ordering__";
pub const OPERATOR_DIRECTIVE: &str = "__operator__";
pub const ELEMENT_ID_DIRECTIVE: &str = "__elementId__";

/// Whether elements are paired by position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementOrdering {
    #[default]
    Ordered,
    Unordered,
}

impl FromStr for ElementOrdering {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ordered" => Ok(ElementOrdering::Ordered),
            "unordered" => Ok(ElementOrdering::Unordered),
            other => Err(VerifyError::UnknownOption {
                option: "ordering",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ElementOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementOrdering::Ordered => write!(f, "ordered"),
            ElementOrdering::Unordered => write!(f, "unordered"),
        }
    }
}

/// Required relation of the expected collection to the actual one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionOperator {
    /// Same elements, same size
    #[default]
    EquivalentOf,
    /// Every expected element must appear in actual; actual may hold more
    SubsetOf,
    /// Every actual element must appear in expected; expected may hold more
    SupersetOf,
}

impl CollectionOperator {
    /// Whether an expected element without a counterpart is an issue
    pub fn requires_every_expected(self) -> bool {
        matches!(
            self,
            CollectionOperator::EquivalentOf | CollectionOperator::SubsetOf
        )
    }

    /// Whether an actual element without a counterpart is an issue
    pub fn requires_every_actual(self) -> bool {
        matches!(
            self,
            CollectionOperator::EquivalentOf | CollectionOperator::SupersetOf
        )
    }
}

impl FromStr for CollectionOperator {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "equivalent-of" => Ok(CollectionOperator::EquivalentOf),
            "subset-of" => Ok(CollectionOperator::SubsetOf),
            "superset-of" => Ok(CollectionOperator::SupersetOf),
            other => Err(VerifyError::UnknownOption {
                option: "operator",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CollectionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionOperator::EquivalentOf => write!(f, "equivalent-of"),
            CollectionOperator::SubsetOf => write!(f, "subset-of"),
            CollectionOperator::SupersetOf => write!(f, "superset-of"),
        }
    }
}

/// Options for comparing one pair of sequences
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    pub ordering: ElementOrdering,
    pub operator: CollectionOperator,
    /// Fields whose values identify an element. `None` means [`DEFAULT_ELEMENT_ID`].
    pub element_id: Option<Vec<String>>,
}

impl CollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unordered() -> Self {
        Self {
            ordering: ElementOrdering::Unordered,
            ..Self::default()
        }
    }

    pub fn with_ordering(mut self, ordering: ElementOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_operator(mut self, operator: CollectionOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_element_id<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element_id = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Fields used to pair elements
    pub fn identity_fields(&self) -> Vec<&str> {
        match &self.element_id {
            Some(fields) if !fields.is_empty() => fields.iter().map(String::as_str).collect(),
            _ => vec![DEFAULT_ELEMENT_ID],
        }
    }

    /// Interpret a directive element
    fn from_directive(path: &str, directive: &serde_json::Map<String, Value>) -> VerifyResult<Self> {
        let mut options = Self::default();
        for (key, value) in directive {
            let invalid = |reason: String| VerifyError::InvalidDirective {
                path: path.to_string(),
                reason,
            };
            match key.as_str() {
                ORDERING_DIRECTIVE => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| invalid(format!("{} must be a string", key)))?;
                    options.ordering = text
                        .parse()
                        .map_err(|e: VerifyError| invalid(e.to_string()))?;
                }
                OPERATOR_DIRECTIVE => {
                    let text = value
                        .as_str()
                        .ok_or_else(|| invalid(format!("{} must be a string", key)))?;
                    options.operator = text
                        .parse()
                        .map_err(|e: VerifyError| invalid(e.to_string()))?;
                }
                ELEMENT_ID_DIRECTIVE => {
                    let fields: Vec<String> = match value {
                        Value::String(s) => s
                            .split(',')
                            .map(str::trim)
                            .filter(|f| !f.is_empty())
                            .map(String::from)
                            .collect(),
                        Value::Array(items) => items
                            .iter()
                            .map(|item| {
                                item.as_str().map(String::from).ok_or_else(|| {
                                    invalid(format!("{} entries must be strings", key))
                                })
                            })
                            .collect::<VerifyResult<_>>()?,
                        _ => {
                            return Err(invalid(format!(
                                "{} must be a string or a list of strings",
                                key
                            )))
                        }
                    };
                    if fields.is_empty() {
                        return Err(invalid(format!("{} names no fields", key)));
                    }
                    options.element_id = Some(fields);
                }
                other => return Err(invalid(format!("unknown directive '{}'", other))),
            }
        }
        Ok(options)
    }
}

fn is_directive_key(key: &str) -> bool {
    key.len() > 4 && key.starts_with("__") && key.ends_with("__")
}

/// Split a leading directive element off an expected sequence
pub fn split_directive<'a>(
    path: &str,
    expected: &'a [Value],
) -> VerifyResult<(Option<CollectionOptions>, &'a [Value])> {
    match expected.split_first() {
        Some((Value::Object(first), rest))
            if !first.is_empty() && first.keys().all(|k| is_directive_key(k)) =>
        {
            let options = CollectionOptions::from_directive(path, first)?;
            Ok((Some(options), rest))
        }
        _ => Ok((None, expected)),
    }
}

/// Collection options for the fields of one verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionPolicies {
    /// Used when no field entry applies
    pub default: CollectionOptions,
    /// Keyed by dotted field path relative to the root (indices omitted) or by bare field name
    pub fields: HashMap<String, CollectionOptions>,
}

impl CollectionPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, options: CollectionOptions) -> Self {
        self.default = options;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, options: CollectionOptions) -> Self {
        self.fields.insert(field.into(), options);
        self
    }

    /// Options for a field, given its path relative to the root
    pub fn lookup(&self, relative_path: &str) -> &CollectionOptions {
        let path = strip_indices(relative_path);
        if let Some(options) = self.fields.get(&path) {
            return options;
        }
        path.rsplit('.')
            .next()
            .and_then(|name| self.fields.get(name))
            .unwrap_or(&self.default)
    }
}

/// `a.b[0].c[12]` -> `a.b.c`
fn strip_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = CollectionOptions::default();
        assert_eq!(options.ordering, ElementOrdering::Ordered);
        assert_eq!(options.operator, CollectionOperator::EquivalentOf);
        assert_eq!(options.identity_fields(), vec!["id"]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "superset-of".parse::<CollectionOperator>().unwrap(),
            CollectionOperator::SupersetOf
        );
        assert_eq!(
            "unordered".parse::<ElementOrdering>().unwrap(),
            ElementOrdering::Unordered
        );
        assert!(matches!(
            "sideways".parse::<ElementOrdering>(),
            Err(VerifyError::UnknownOption { option: "ordering", .. })
        ));
    }

    #[test]
    fn test_serde_names() {
        let options: CollectionOptions = serde_json::from_value(json!({
            "ordering": "unordered",
            "operator": "subset-of",
            "element_id": ["id", "name"]
        }))
        .unwrap();
        assert_eq!(options.ordering, ElementOrdering::Unordered);
        assert_eq!(options.operator, CollectionOperator::SubsetOf);
        assert_eq!(options.identity_fields(), vec!["id", "name"]);
    }

    #[test]
    fn test_split_directive() {
        let expected = vec![
            json!({"__ordering__": "unordered", "__elementId__": "id, name"}),
            json!({"id": 1}),
        ];
        let (options, rest) = split_directive("body.items", &expected).unwrap();
        let options = options.unwrap();
        assert_eq!(options.ordering, ElementOrdering::Unordered);
        assert_eq!(options.identity_fields(), vec!["id", "name"]);
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_split_without_directive() {
        let expected = vec![json!({"id": 1}), json!({"id": 2})];
        let (options, rest) = split_directive("body.items", &expected).unwrap();
        assert!(options.is_none());
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_invalid_directive() {
        let expected = vec![json!({"__ordering__": "sideways"})];
        match split_directive("body.items", &expected) {
            Err(VerifyError::InvalidDirective { path, reason }) => {
                assert_eq!(path, "body.items");
                assert_eq!(reason, "unknown ordering 'sideways'");
            }
            other => panic!("expected an invalid directive, got {:?}", other),
        }

        let expected = vec![json!({"__colour__": "red"})];
        assert!(matches!(
            split_directive("body.items", &expected),
            Err(VerifyError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn test_lookup_by_path_then_name() {
        let policies = CollectionPolicies::new()
            .with_field("user.idam", CollectionOptions::unordered())
            .with_field(
                "tags",
                CollectionOptions::new().with_operator(CollectionOperator::SubsetOf),
            );

        assert_eq!(
            policies.lookup("user.idam").ordering,
            ElementOrdering::Unordered
        );
        assert_eq!(
            policies.lookup("cases[3].tags").operator,
            CollectionOperator::SubsetOf
        );
        assert_eq!(policies.lookup("other"), &CollectionOptions::default());
    }

    #[test]
    fn test_strip_indices() {
        assert_eq!(strip_indices("a.b[0].c[12]"), "a.b.c");
        assert_eq!(strip_indices("plain"), "plain");
    }
}
