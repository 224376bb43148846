//! Structural verification of mappings
//!
//! Every level of a mapping is triaged into three aggregated issues, always in
//! this order:
//!
//! 1. `<path> has unexpected field(s): [..]`
//! 2. `<path> lacks [..] field(s) that was/were actually expected to be there.`
//! 3. `<path> contains N bad value(s): [..]`
//!
//! Nested mappings and sequences contribute a single entry to the bad value
//! list of their parent. While the parent still has cascade depth budget left
//! the entry reproduces the nested issues, otherwise it only names the
//! offending leaf paths. The budget drops by one for each mapping entered and
//! never gates the triage itself.

use crate::error::{VerifyError, VerifyResult};
use crate::options::CollectionPolicies;
use crate::result::VerificationResult;
use crate::value::{literal, scalars_equal, Map, ValueKind};
use crate::wildcard::Placeholder;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Cascade depth budget used by [`MapVerifier::new`]
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Verifies actual trees against expected templates
#[derive(Debug, Clone)]
pub struct MapVerifier {
    field_prefix: String,
    max_depth: usize,
    case_sensitive: bool,
    collections: CollectionPolicies,
}

impl MapVerifier {
    /// Case-sensitive verifier with the default depth budget
    pub fn new(field_prefix: impl Into<String>) -> Self {
        Self {
            field_prefix: field_prefix.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            case_sensitive: true,
            collections: CollectionPolicies::default(),
        }
    }

    /// Verifier with an explicit depth budget; negative budgets are rejected
    pub fn with_max_depth(field_prefix: impl Into<String>, max_depth: i64) -> VerifyResult<Self> {
        let max_depth = checked_depth(max_depth)?;
        Ok(Self {
            max_depth,
            ..Self::new(field_prefix)
        })
    }

    pub fn with_case_sensitivity(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_collection_policies(mut self, collections: CollectionPolicies) -> Self {
        self.collections = collections;
        self
    }

    pub fn field_prefix(&self) -> &str {
        &self.field_prefix
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn collections(&self) -> &CollectionPolicies {
        &self.collections
    }

    /// Verify two optional mappings
    pub fn verify_map(
        &self,
        expected: Option<&Map<String, Value>>,
        actual: Option<&Map<String, Value>>,
    ) -> VerifyResult<VerificationResult> {
        debug!(
            prefix = %self.field_prefix,
            max_depth = self.max_depth,
            case_sensitive = self.case_sensitive,
            "Verifying map"
        );
        let path = self.field_prefix.as_str();
        match (expected, actual) {
            (None, None) => Ok(VerificationResult::verified(path)),
            (None, Some(_)) => Ok(expected_null_issue(path)),
            (Some(_), None) => Ok(unexpected_null_issue(path)),
            (Some(expected), Some(actual)) => {
                self.walk()
                    .verify_mapping(path, self.max_depth, expected, actual)
            }
        }
    }

    /// Verify two arbitrary values
    pub fn verify(&self, expected: &Value, actual: &Value) -> VerifyResult<VerificationResult> {
        debug!(
            prefix = %self.field_prefix,
            max_depth = self.max_depth,
            case_sensitive = self.case_sensitive,
            "Verifying value"
        );
        self.walk()
            .verify_root(&self.field_prefix, self.max_depth, expected, actual)
    }

    fn walk(&self) -> Walk<'_> {
        Walk {
            root: &self.field_prefix,
            case_sensitive: self.case_sensitive,
            policies: &self.collections,
        }
    }
}

/// Verify `actual` against `expected` under `path`
///
/// Fails only for a negative `max_depth`; mismatches end up in the result.
pub fn verify(
    path: &str,
    max_depth: i64,
    case_sensitive: bool,
    expected: &Value,
    actual: &Value,
) -> VerifyResult<VerificationResult> {
    MapVerifier::with_max_depth(path, max_depth)?
        .with_case_sensitivity(case_sensitive)
        .verify(expected, actual)
}

pub(crate) fn checked_depth(max_depth: i64) -> VerifyResult<usize> {
    usize::try_from(max_depth).map_err(|_| VerifyError::NegativeDepth { depth: max_depth })
}

pub(crate) fn subject(path: &str) -> &str {
    if path.is_empty() {
        "Map"
    } else {
        path
    }
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn expected_null_issue(path: &str) -> VerificationResult {
    VerificationResult::with_issue(
        path,
        format!("{} is expected to be null, but is actually not.", subject(path)),
    )
}

fn unexpected_null_issue(path: &str) -> VerificationResult {
    VerificationResult::with_issue(
        path,
        format!(
            "{} is expected to be non-null, but is actually null.",
            subject(path)
        ),
    )
}

/// One field's contribution to a bad value issue
struct BadValue {
    entry: String,
    offending: Vec<String>,
}

/// State shared by one verification walk
pub(crate) struct Walk<'a> {
    pub(crate) root: &'a str,
    pub(crate) case_sensitive: bool,
    pub(crate) policies: &'a CollectionPolicies,
}

impl Walk<'_> {
    fn verify_root(
        &self,
        path: &str,
        depth: usize,
        expected: &Value,
        actual: &Value,
    ) -> VerifyResult<VerificationResult> {
        if let Some(placeholder) = Placeholder::from_value(expected) {
            if placeholder.accepts(actual) {
                return Ok(VerificationResult::verified(path));
            }
            return Ok(VerificationResult::with_issue(
                path,
                format!(
                    "{}: {}",
                    subject(path),
                    placeholder.describe_rejection(actual)
                ),
            ));
        }

        match (expected, actual) {
            (Value::Null, Value::Null) => Ok(VerificationResult::verified(path)),
            (Value::Null, _) => Ok(expected_null_issue(path)),
            (_, Value::Null) => Ok(unexpected_null_issue(path)),
            (Value::Object(expected), Value::Object(actual)) => {
                self.verify_mapping(path, depth, expected, actual)
            }
            (Value::Array(expected), Value::Array(actual)) => {
                let options = self.policies.lookup(self.relative(path));
                self.verify_sequence(path, depth, options, expected, actual)
            }
            _ if ValueKind::of(expected) != ValueKind::of(actual)
                && !(ValueKind::of(expected).is_scalar() && ValueKind::of(actual).is_scalar()) =>
            {
                Ok(VerificationResult::with_issue(
                    path,
                    format!(
                        "{} contains a bad value: expected a {} but got a {}",
                        subject(path),
                        ValueKind::of(expected),
                        ValueKind::of(actual)
                    ),
                ))
            }
            _ if scalars_equal(expected, actual, self.case_sensitive) => {
                Ok(VerificationResult::verified(path))
            }
            _ => Ok(VerificationResult::with_issue(
                path,
                format!(
                    "{}: expected '{}' but got '{}'",
                    subject(path),
                    literal(expected),
                    literal(actual)
                ),
            )),
        }
    }

    pub(crate) fn verify_mapping(
        &self,
        path: &str,
        depth: usize,
        expected: &Map<String, Value>,
        actual: &Map<String, Value>,
    ) -> VerifyResult<VerificationResult> {
        trace!(path, depth, "Verifying mapping");
        let expected_index = self.index_keys(expected);
        let actual_index = self.index_keys(actual);

        // An actual key shadowed by an earlier one of the same normalised form is unexpected too
        let mut unexpected: Vec<&str> = actual
            .keys()
            .filter(|key| {
                let normalized = self.normalize(key);
                !expected_index.contains_key(&*normalized)
                    || actual_index
                        .get(&*normalized)
                        .map(|(first, _)| *first != key.as_str())
                        .unwrap_or(false)
            })
            .map(String::as_str)
            .collect();
        unexpected.sort_unstable();

        let mut lacking: Vec<&str> = expected
            .keys()
            .filter(|key| !actual_index.contains_key(&*self.normalize(key)))
            .map(String::as_str)
            .collect();
        lacking.sort_unstable();

        let mut bad_values = Vec::new();
        for (key, expected_value) in expected {
            let Some((actual_key, actual_value)) = actual_index.get(&*self.normalize(key))
            else {
                continue;
            };
            if let Some(bad) = self.verify_field(path, depth, actual_key, expected_value, actual_value)? {
                bad_values.push(bad);
            }
        }

        let mut result = VerificationResult::verified(path);
        if !unexpected.is_empty() {
            result.push_issue(
                format!(
                    "{} has unexpected field(s): [{}]",
                    subject(path),
                    unexpected.join(", ")
                ),
                unexpected.iter().map(|key| join_path(path, key)),
            );
        }
        if !lacking.is_empty() {
            result.push_issue(
                format!(
                    "{} lacks [{}] field(s) that was/were actually expected to be there.",
                    subject(path),
                    lacking.join(", ")
                ),
                lacking.iter().map(|key| join_path(path, key)),
            );
        }
        if !bad_values.is_empty() {
            let entries: Vec<&str> = bad_values.iter().map(|b| b.entry.as_str()).collect();
            let issue = format!(
                "{} contains {} bad value(s): [{}]",
                subject(path),
                bad_values.len(),
                entries.join(", ")
            );
            let offending: Vec<String> = bad_values.into_iter().flat_map(|b| b.offending).collect();
            result.push_issue(issue, offending);
        }
        Ok(result)
    }

    /// Compare the values held under one key present on both sides
    fn verify_field(
        &self,
        parent: &str,
        depth: usize,
        key: &str,
        expected: &Value,
        actual: &Value,
    ) -> VerifyResult<Option<BadValue>> {
        let path = join_path(parent, key);

        if let Some(placeholder) = Placeholder::from_value(expected) {
            trace!(path = %path, placeholder = %placeholder, "Resolving placeholder");
            if placeholder.accepts(actual) {
                return Ok(None);
            }
            return Ok(Some(BadValue {
                entry: format!("{}: {}", key, placeholder.describe_rejection(actual)),
                offending: vec![path],
            }));
        }

        let nested = match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                self.verify_mapping(&path, depth.saturating_sub(1), expected, actual)?
            }
            (Value::Array(expected), Value::Array(actual)) => {
                let options = self.policies.lookup(self.relative(&path));
                self.verify_sequence(&path, depth, options, expected, actual)?
            }
            _ if scalars_equal(expected, actual, self.case_sensitive) => return Ok(None),
            _ => {
                return Ok(Some(BadValue {
                    entry: format!(
                        "{}: expected '{}' but got '{}'",
                        key,
                        literal(expected),
                        literal(actual)
                    ),
                    offending: vec![path],
                }))
            }
        };

        if nested.is_verified() {
            return Ok(None);
        }
        Ok(Some(BadValue {
            entry: nested.fold_into_entry(depth > 0),
            offending: nested.offending_paths().to_vec(),
        }))
    }

    /// Normalised key -> (original key, value); the first occurrence wins
    fn index_keys<'m>(&self, map: &'m Map<String, Value>) -> HashMap<Cow<'m, str>, (&'m str, &'m Value)> {
        let mut index = HashMap::with_capacity(map.len());
        for (key, value) in map {
            index
                .entry(self.normalize(key))
                .or_insert((key.as_str(), value));
        }
        index
    }

    fn normalize<'k>(&self, key: &'k str) -> Cow<'k, str> {
        if self.case_sensitive {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(key.to_lowercase())
        }
    }

    /// Path without the root prefix, used for policy lookups
    pub(crate) fn relative<'p>(&self, path: &'p str) -> &'p str {
        if self.root.is_empty() {
            return path;
        }
        path.strip_prefix(self.root)
            .map(|rest| rest.trim_start_matches('.'))
            .unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn walk(policies: &CollectionPolicies) -> Walk<'_> {
        Walk {
            root: "response.body",
            case_sensitive: true,
            policies,
        }
    }

    #[test]
    fn test_negative_depth_rejected() {
        assert_eq!(
            MapVerifier::with_max_depth("", -1).unwrap_err(),
            VerifyError::NegativeDepth { depth: -1 }
        );
        assert!(MapVerifier::with_max_depth("", 0).is_ok());
    }

    #[test]
    fn test_relative_path() {
        let policies = CollectionPolicies::default();
        let walk = walk(&policies);
        assert_eq!(walk.relative("response.body.user.idam"), "user.idam");
        assert_eq!(walk.relative("response.body"), "");
        assert_eq!(walk.relative("elsewhere.idam"), "elsewhere.idam");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "key"), "key");
        assert_eq!(join_path("a.b", "key"), "a.b.key");
    }

    #[test]
    fn test_field_entry_for_scalar() {
        let policies = CollectionPolicies::default();
        let bad = walk(&policies)
            .verify_field("response.body", 0, "key2", &json!("value2"), &json!("value2_bad"))
            .unwrap()
            .unwrap();
        assert_eq!(bad.entry, "key2: expected 'value2' but got 'value2_bad'");
        assert_eq!(bad.offending, vec!["response.body.key2"]);
    }

    #[test]
    fn test_field_entry_collapses_without_budget() {
        let policies = CollectionPolicies::default();
        let bad = walk(&policies)
            .verify_field(
                "response.body",
                0,
                "sub",
                &json!({"a": 1, "b": 2}),
                &json!({"a": 2, "b": 3}),
            )
            .unwrap()
            .unwrap();
        assert_eq!(bad.entry, "response.body.sub.a, response.body.sub.b");
    }

    #[test]
    fn test_case_insensitive_index() {
        let policies = CollectionPolicies::default();
        let walk = Walk {
            root: "",
            case_sensitive: false,
            policies: &policies,
        };
        let map = json!({"Vary": "x"});
        let index = walk.index_keys(map.as_object().unwrap());
        assert_eq!(index.get("vary").map(|(k, _)| *k), Some("Vary"));
    }
}
