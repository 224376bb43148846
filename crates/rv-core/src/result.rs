//! Verification results

use crate::error::VerificationFailure;
use std::fmt;

/// Outcome of one verifier call
///
/// Holds the issue messages in the order they were found together with the
/// full paths of every field or element that caused one. Parents use the
/// latter to summarise a child once the cascade depth budget is spent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    path: String,
    issues: Vec<String>,
    offending_paths: Vec<String>,
}

impl VerificationResult {
    /// A result with no issues
    pub fn verified(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            issues: Vec::new(),
            offending_paths: Vec::new(),
        }
    }

    /// A result with a single issue caused by the value at `path`
    pub fn with_issue(path: impl Into<String>, issue: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            offending_paths: vec![path.clone()],
            issues: vec![issue.into()],
            path,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_verified(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<String> {
        self.issues
    }

    /// Full paths of the leaves that produced issues
    pub fn offending_paths(&self) -> &[String] {
        &self.offending_paths
    }

    /// Record an issue and the paths responsible for it
    pub fn push_issue<I>(&mut self, issue: impl Into<String>, offending: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.issues.push(issue.into());
        self.offending_paths
            .extend(offending.into_iter().map(Into::into));
    }

    /// Append every issue of another result, keeping this result's path
    pub fn merge(&mut self, other: VerificationResult) {
        self.issues.extend(other.issues);
        self.offending_paths.extend(other.offending_paths);
    }

    /// Text a parent level uses to refer to this result
    ///
    /// With `inline` the nested issues are reproduced in full, otherwise only
    /// the offending leaf paths are listed.
    pub fn fold_into_entry(&self, inline: bool) -> String {
        if inline {
            self.issues.join("; ")
        } else {
            self.offending_paths.join(", ")
        }
    }

    /// Convert into a `Result` for assertion-style callers
    pub fn into_result(self) -> Result<(), VerificationFailure> {
        if self.is_verified() {
            Ok(())
        } else {
            Err(VerificationFailure {
                path: self.path,
                issues: self.issues,
            })
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_verified() {
            return write!(f, "{}: verified", self.path);
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_has_no_issues() {
        let result = VerificationResult::verified("actualResponse.body");
        assert!(result.is_verified());
        assert!(result.issues().is_empty());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_fold_into_entry() {
        let mut result = VerificationResult::verified("body.sub");
        result.push_issue("body.sub has unexpected field(s): [x]", ["body.sub.x"]);
        result.push_issue(
            "body.sub contains 1 bad value(s): [a: expected '1' but got '2']",
            ["body.sub.a"],
        );

        assert_eq!(
            result.fold_into_entry(true),
            "body.sub has unexpected field(s): [x]; body.sub contains 1 bad value(s): [a: expected '1' but got '2']"
        );
        assert_eq!(result.fold_into_entry(false), "body.sub.x, body.sub.a");
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut parent = VerificationResult::with_issue("a", "first");
        parent.merge(VerificationResult::with_issue("a.b", "second"));
        assert_eq!(parent.issues(), ["first", "second"]);
        assert_eq!(parent.offending_paths(), ["a", "a.b"]);
        assert_eq!(parent.path(), "a");
    }

    #[test]
    fn test_into_result_reports_issues() {
        let failure = VerificationResult::with_issue("body", "body lacks [x] field(s) that was/were actually expected to be there.")
            .into_result()
            .unwrap_err();
        assert_eq!(failure.issues.len(), 1);
        assert!(failure.to_string().starts_with("body failed with 1 issue(s)"));
    }
}
