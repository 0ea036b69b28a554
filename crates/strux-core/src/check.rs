//! # Check Results
//!
//! Side validations return whatever is most natural to write: nothing, a
//! boolean, a message, or a full [`Issue`]. [`CheckResult`] normalizes
//! those shapes so `Getter::check_effect` and node checks can turn them
//! into pass-through-or-fail without touching the checked value.

use crate::issue::Issue;
use crate::value::Value;

/// Outcome of a side validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// The value is acceptable.
    Pass,
    /// The value is rejected without further detail.
    Fail,
    /// The value is rejected with a message.
    Message(String),
    /// The value is rejected with a fully built issue.
    Issue(Issue),
}

impl CheckResult {
    /// `None` when the check passed, otherwise the issue describing `actual`.
    pub fn into_issue(self, actual: &Value) -> Option<Issue> {
        match self {
            CheckResult::Pass => None,
            CheckResult::Fail => Some(Issue::InvalidValue {
                actual: Some(actual.clone()),
                message: None,
            }),
            CheckResult::Message(message) => {
                Some(Issue::invalid_value(Some(actual.clone()), message))
            }
            CheckResult::Issue(issue) => Some(issue),
        }
    }
}

impl From<()> for CheckResult {
    fn from(_: ()) -> Self {
        CheckResult::Pass
    }
}

impl From<bool> for CheckResult {
    fn from(ok: bool) -> Self {
        if ok {
            CheckResult::Pass
        } else {
            CheckResult::Fail
        }
    }
}

impl From<&str> for CheckResult {
    fn from(message: &str) -> Self {
        CheckResult::Message(message.to_string())
    }
}

impl From<String> for CheckResult {
    fn from(message: String) -> Self {
        CheckResult::Message(message)
    }
}

impl From<Issue> for CheckResult {
    fn from(issue: Issue) -> Self {
        CheckResult::Issue(issue)
    }
}

impl<T: Into<CheckResult>> From<Option<T>> for CheckResult {
    fn from(result: Option<T>) -> Self {
        result.map_or(CheckResult::Pass, Into::into)
    }
}
