//! Verification of sequences
//!
//! Elements are paired first, then each pair is verified like any other
//! value. `ordered` pairs by position. `unordered` pairs in three passes:
//!
//! 1. by element identity (configured fields, else `id` where declared);
//!    placeholders in expected identities accept any value of their kind
//! 2. by structural equality, for elements without an identity
//! 3. by best structural match among what is left without an identity,
//!    cheapest pair first (fewest offending paths, then lowest indices)
//!
//! Whatever stays unpaired is judged by the operator. Under `ordered` with
//! `equivalent-of` trailing elements are already reported by the size check.

use crate::error::VerifyResult;
use crate::map_verifier::{checked_depth, Walk};
use crate::options::{
    split_directive, CollectionOperator, CollectionOptions, CollectionPolicies, ElementOrdering,
};
use crate::result::VerificationResult;
use crate::value::{literal, scalars_equal, values_equal};
use crate::wildcard::Placeholder;
use serde_json::Value;
use tracing::trace;

/// Verify two sequences under explicit options
///
/// An in-band directive leading `expected` still takes precedence.
pub fn verify_collection(
    path: &str,
    max_depth: i64,
    case_sensitive: bool,
    options: &CollectionOptions,
    expected: &[Value],
    actual: &[Value],
) -> VerifyResult<VerificationResult> {
    let depth = checked_depth(max_depth)?;
    let policies = CollectionPolicies::new().with_default(options.clone());
    let walk = Walk {
        root: path,
        case_sensitive,
        policies: &policies,
    };
    walk.verify_sequence(path, depth, options, expected, actual)
}

/// How the two sides were paired
#[derive(Debug, Default, PartialEq, Eq)]
struct Pairing {
    /// (expected index, actual index), sorted by expected index
    pairs: Vec<(usize, usize)>,
    unpaired_expected: Vec<usize>,
    unpaired_actual: Vec<usize>,
}

impl Pairing {
    fn by_position(expected: usize, actual: usize) -> Self {
        let common = expected.min(actual);
        Self {
            pairs: (0..common).map(|i| (i, i)).collect(),
            unpaired_expected: (common..expected).collect(),
            unpaired_actual: (common..actual).collect(),
        }
    }
}

/// Result of comparing one element pair
enum Comparison {
    Match,
    /// A scalar or placeholder mismatch, already worded
    Leaf(String),
    /// An unverified nested mapping or sequence
    Nested(VerificationResult),
}

impl Comparison {
    fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }

    fn cost(&self) -> usize {
        match self {
            Comparison::Match => 0,
            Comparison::Leaf(_) => 1,
            Comparison::Nested(result) => result.offending_paths().len().max(1),
        }
    }
}

impl Walk<'_> {
    pub(crate) fn verify_sequence(
        &self,
        path: &str,
        depth: usize,
        configured: &CollectionOptions,
        expected: &[Value],
        actual: &[Value],
    ) -> VerifyResult<VerificationResult> {
        let (directive, expected) = split_directive(path, expected)?;
        let options = directive.as_ref().unwrap_or(configured);
        trace!(
            path,
            depth,
            ordering = %options.ordering,
            operator = %options.operator,
            "Verifying sequence"
        );

        let mut result = VerificationResult::verified(path);
        if options.operator == CollectionOperator::EquivalentOf && expected.len() != actual.len() {
            result.push_issue(
                format!(
                    "{} has unexpected number of elements. Expected: {}, but actual: {}.",
                    path,
                    expected.len(),
                    actual.len()
                ),
                [path],
            );
        }

        let pairing = match options.ordering {
            ElementOrdering::Ordered => Pairing::by_position(expected.len(), actual.len()),
            ElementOrdering::Unordered => {
                self.pair_unordered(path, depth, options, expected, actual)?
            }
        };

        for &(i, j) in &pairing.pairs {
            let element_path = format!("{}[{}]", path, j);
            match self.compare_element(&element_path, depth, &expected[i], &actual[j])? {
                Comparison::Match => {}
                Comparison::Leaf(issue) => result.push_issue(issue, [element_path]),
                Comparison::Nested(nested) if depth > 0 => result.merge(nested),
                Comparison::Nested(nested) => result.push_issue(
                    format!(
                        "{} contains bad value(s) at: [{}]",
                        element_path,
                        nested.offending_paths().join(", ")
                    ),
                    nested.offending_paths().to_vec(),
                ),
            }
        }

        let covered_by_size = options.ordering == ElementOrdering::Ordered
            && options.operator == CollectionOperator::EquivalentOf;
        if !covered_by_size {
            if options.operator.requires_every_actual() {
                for &j in &pairing.unpaired_actual {
                    let element_path = format!("{}[{}]", path, j);
                    result.push_issue(
                        format!(
                            "{} is an unexpected element: {}",
                            element_path,
                            literal(&actual[j])
                        ),
                        [element_path],
                    );
                }
            }
            if options.operator.requires_every_expected() {
                for &i in &pairing.unpaired_expected {
                    result.push_issue(
                        format!(
                            "{} lacks the element expected at [{}]: {}",
                            path,
                            i,
                            literal(&expected[i])
                        ),
                        [format!("{}[{}]", path, i)],
                    );
                }
            }
        }

        Ok(result)
    }

    /// Compare one expected element with one actual element
    fn compare_element(
        &self,
        element_path: &str,
        depth: usize,
        expected: &Value,
        actual: &Value,
    ) -> VerifyResult<Comparison> {
        if let Some(placeholder) = Placeholder::from_value(expected) {
            return Ok(if placeholder.accepts(actual) {
                Comparison::Match
            } else {
                Comparison::Leaf(format!(
                    "{}: {}",
                    element_path,
                    placeholder.describe_rejection(actual)
                ))
            });
        }

        let nested = match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                self.verify_mapping(element_path, depth.saturating_sub(1), expected, actual)?
            }
            (Value::Array(expected), Value::Array(actual)) => {
                self.verify_sequence(element_path, depth, &self.policies.default, expected, actual)?
            }
            _ if scalars_equal(expected, actual, self.case_sensitive) => {
                return Ok(Comparison::Match)
            }
            _ => {
                return Ok(Comparison::Leaf(format!(
                    "{}: expected '{}' but got '{}'",
                    element_path,
                    literal(expected),
                    literal(actual)
                )))
            }
        };

        Ok(if nested.is_verified() {
            Comparison::Match
        } else {
            Comparison::Nested(nested)
        })
    }

    fn pair_unordered(
        &self,
        path: &str,
        depth: usize,
        options: &CollectionOptions,
        expected: &[Value],
        actual: &[Value],
    ) -> VerifyResult<Pairing> {
        let fields = options.identity_fields();
        let actual_ids: Vec<Option<Vec<&Value>>> =
            actual.iter().map(|a| identity(a, &fields)).collect();
        let mut taken = vec![false; actual.len()];
        let mut pairs = Vec::new();
        let mut unpaired_expected = Vec::new();
        let mut anonymous = Vec::new();

        let mut keyed = Vec::new();
        for (i, element) in expected.iter().enumerate() {
            match identity(element, &fields) {
                Some(id) => keyed.push((i, id)),
                None => anonymous.push(i),
            }
        }
        // Literal identities claim their counterparts before wildcard ones
        keyed.sort_by_key(|(_, id)| id.iter().any(|v| Placeholder::from_value(v).is_some()));

        for (i, id) in keyed {
            let candidates: Vec<usize> = (0..actual.len())
                .filter(|&j| {
                    !taken[j]
                        && actual_ids[j]
                            .as_ref()
                            .map(|other| self.ids_equal(&id, other))
                            .unwrap_or(false)
                })
                .collect();
            // A wildcard identity may accept several elements; prefer an outright match
            let mut found = candidates.first().copied();
            if candidates.len() > 1 {
                for &j in &candidates {
                    let element_path = format!("{}[{}]", path, j);
                    if self
                        .compare_element(&element_path, depth, &expected[i], &actual[j])?
                        .is_match()
                    {
                        found = Some(j);
                        break;
                    }
                }
            }
            match found {
                Some(j) => {
                    taken[j] = true;
                    pairs.push((i, j));
                }
                None => {
                    trace!(path, index = i, "No element with a matching identity");
                    unpaired_expected.push(i);
                }
            }
        }

        let mut leftover = Vec::new();
        for i in anonymous {
            let mut found = None;
            for j in 0..actual.len() {
                if taken[j] {
                    continue;
                }
                let element_path = format!("{}[{}]", path, j);
                if self
                    .compare_element(&element_path, depth, &expected[i], &actual[j])?
                    .is_match()
                {
                    found = Some(j);
                    break;
                }
            }
            match found {
                Some(j) => {
                    taken[j] = true;
                    pairs.push((i, j));
                }
                None => leftover.push(i),
            }
        }

        // (cost, expected, actual), cheapest first
        let mut candidates = Vec::new();
        for &i in &leftover {
            for j in 0..actual.len() {
                if taken[j] || actual_ids[j].is_some() {
                    continue;
                }
                let element_path = format!("{}[{}]", path, j);
                let cost = self
                    .compare_element(&element_path, depth, &expected[i], &actual[j])?
                    .cost();
                candidates.push((cost, i, j));
            }
        }
        candidates.sort_unstable();

        let mut placed = vec![false; expected.len()];
        for (_, i, j) in candidates {
            if placed[i] || taken[j] {
                continue;
            }
            placed[i] = true;
            taken[j] = true;
            pairs.push((i, j));
        }
        unpaired_expected.extend(leftover.into_iter().filter(|&i| !placed[i]));

        pairs.sort_unstable();
        unpaired_expected.sort_unstable();
        let unpaired_actual = (0..actual.len()).filter(|&j| !taken[j]).collect();

        Ok(Pairing {
            pairs,
            unpaired_expected,
            unpaired_actual,
        })
    }

    /// Expected identity values may be placeholders
    fn ids_equal(&self, a: &[&Value], b: &[&Value]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| match Placeholder::from_value(x) {
                    Some(placeholder) => placeholder.accepts(y),
                    None => values_equal(x, y, self.case_sensitive),
                })
    }
}

/// Values of the identity fields, if the element is a mapping declaring all of them
fn identity<'v>(element: &'v Value, fields: &[&str]) -> Option<Vec<&'v Value>> {
    let map = element.as_object()?;
    fields.iter().map(|field| map.get(*field)).collect()
}
