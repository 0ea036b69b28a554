//! # Issues — Structured Failure Tree
//!
//! Every failure produced by a getter, a transformation or the schema
//! driver is an [`Issue`]. Issues are plain values returned through
//! `Result::Err`; they are never raised as panics and never mutated once
//! built.
//!
//! ## Taxonomy
//!
//! - `MissingKey` / `UnexpectedKey` — structural absence or surplus.
//! - `InvalidType` — the runtime kind does not match the schema node.
//! - `InvalidValue` — the kind matches but a semantic check failed.
//! - `Forbidden` — the operation is intentionally disallowed (for example
//!   writing a non-serializable value to JSON).
//! - `Composite` + `Pointer` — aggregation of child issues with their path.
//! - `OneOf` — more than one union member matched in exclusive mode.
//!
//! Leaves carry the rendered expectation (`expected`) and the observed
//! value, so a message can be produced without walking the schema again.

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// One segment of the path from a container to a nested issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    /// Object property.
    Key(String),
    /// Array / tuple position.
    Index(usize),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Key(k) => write!(f, "[{}]", serde_json::Value::String(k.clone())),
            PathKey::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

/// Structured, located validation or encoding failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Issue {
    /// The value's runtime kind does not match the expected node.
    #[error("Expected {expected}, got {}", render_actual(.actual.as_ref()))]
    InvalidType {
        /// Rendered description of the expected schema node.
        expected: String,
        /// Observed value (`None` when absent).
        actual: Option<Value>,
    },

    /// A required key or element is absent.
    #[error("{}", .message.as_deref().unwrap_or("Missing key"))]
    MissingKey {
        /// Optional custom message.
        message: Option<String>,
    },

    /// A key is present that the schema does not declare.
    #[error("Unexpected key with value {actual}")]
    UnexpectedKey {
        /// The value found under the unexpected key.
        actual: Value,
    },

    /// The operation is disallowed on purpose.
    #[error("{message}")]
    Forbidden {
        /// The value the operation was attempted on.
        actual: Option<Value>,
        /// Why the operation is disallowed.
        message: String,
    },

    /// The value has the right kind but failed a semantic check.
    #[error("{}", render_invalid_value(.actual.as_ref(), .message.as_deref()))]
    InvalidValue {
        /// Observed value.
        actual: Option<Value>,
        /// Optional description of the failed check.
        message: Option<String>,
    },

    /// Aggregation of child issues.
    ///
    /// Structs and tuples wrap each child in an [`Issue::Pointer`] naming
    /// the key or index. Union members and the checks of a single node
    /// fail at the container's own location, so those children are kept
    /// unwrapped and their leaves share the container's path.
    #[error("{}", render_composite(.expected, .issues))]
    Composite {
        /// Rendered description of the container node.
        expected: String,
        /// The container value.
        actual: Option<Value>,
        /// Child issues in discovery order.
        issues: Vec<Issue>,
    },

    /// Locates a nested issue relative to its container.
    #[error("{}", render_pointer(.path, .issue))]
    Pointer {
        /// Path segments from the container to the nested value.
        path: Vec<PathKey>,
        /// The nested issue.
        issue: Box<Issue>,
    },

    /// More than one member of an exclusive union matched.
    #[error("Expected exactly one member of {expected} to match, {matches} matched {actual}")]
    OneOf {
        /// Rendered description of the union.
        expected: String,
        /// The ambiguous value.
        actual: Value,
        /// How many members matched.
        matches: usize,
    },
}

impl Issue {
    pub fn invalid_type(expected: impl Into<String>, actual: Option<Value>) -> Self {
        Issue::InvalidType {
            expected: expected.into(),
            actual,
        }
    }

    pub fn invalid_value(actual: Option<Value>, message: impl Into<String>) -> Self {
        Issue::InvalidValue {
            actual,
            message: Some(message.into()),
        }
    }

    pub fn forbidden(actual: Option<Value>, message: impl Into<String>) -> Self {
        Issue::Forbidden {
            actual,
            message: message.into(),
        }
    }

    pub fn missing_key() -> Self {
        Issue::MissingKey { message: None }
    }

    /// Wrap `issue` with a path. Nested pointers are merged into one.
    pub fn pointer(path: Vec<PathKey>, issue: Issue) -> Self {
        match issue {
            Issue::Pointer {
                path: inner,
                issue,
            } => {
                let mut merged = path;
                merged.extend(inner);
                Issue::Pointer {
                    path: merged,
                    issue,
                }
            }
            other => Issue::Pointer {
                path,
                issue: Box::new(other),
            },
        }
    }

    /// Variant name, for structural inspection by formatters.
    pub fn tag(&self) -> &'static str {
        match self {
            Issue::InvalidType { .. } => "InvalidType",
            Issue::MissingKey { .. } => "MissingKey",
            Issue::UnexpectedKey { .. } => "UnexpectedKey",
            Issue::Forbidden { .. } => "Forbidden",
            Issue::InvalidValue { .. } => "InvalidValue",
            Issue::Composite { .. } => "Composite",
            Issue::Pointer { .. } => "Pointer",
            Issue::OneOf { .. } => "OneOf",
        }
    }

    /// The observed value, when the variant records one.
    pub fn actual(&self) -> Option<&Value> {
        match self {
            Issue::InvalidType { actual, .. }
            | Issue::Forbidden { actual, .. }
            | Issue::InvalidValue { actual, .. }
            | Issue::Composite { actual, .. } => actual.as_ref(),
            Issue::UnexpectedKey { actual } | Issue::OneOf { actual, .. } => Some(actual),
            Issue::MissingKey { .. } | Issue::Pointer { .. } => None,
        }
    }

    /// Flatten the tree into `(path, leaf)` pairs in discovery order.
    pub fn leaves(&self) -> Vec<(Vec<PathKey>, &Issue)> {
        let mut out = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut out);
        out
    }

    /// Whether any leaf of this tree is `Forbidden`.
    pub fn is_forbidden(&self) -> bool {
        self.leaves()
            .iter()
            .any(|(_, leaf)| matches!(leaf, Issue::Forbidden { .. }))
    }
}

fn collect_leaves<'a>(
    issue: &'a Issue,
    path: &mut Vec<PathKey>,
    out: &mut Vec<(Vec<PathKey>, &'a Issue)>,
) {
    match issue {
        Issue::Composite { issues, .. } => {
            for child in issues {
                collect_leaves(child, path, out);
            }
        }
        Issue::Pointer {
            path: segment,
            issue,
        } => {
            let len = path.len();
            path.extend(segment.iter().cloned());
            collect_leaves(issue, path, out);
            path.truncate(len);
        }
        leaf => out.push((path.clone(), leaf)),
    }
}

fn render_actual(actual: Option<&Value>) -> String {
    match actual {
        Some(value) => value.to_string(),
        None => "no value provided".to_string(),
    }
}

fn render_invalid_value(actual: Option<&Value>, message: Option<&str>) -> String {
    match message {
        Some(message) => message.to_string(),
        None => format!("Invalid data {}", render_actual(actual)),
    }
}

fn indent(text: &str) -> String {
    text.replace('\n', "\n   ")
}

fn render_composite(expected: &str, issues: &[Issue]) -> String {
    let mut out = expected.to_string();
    for issue in issues {
        out.push_str("\n└─ ");
        out.push_str(&indent(&issue.to_string()));
    }
    out
}

fn render_pointer(path: &[PathKey], issue: &Issue) -> String {
    let mut out: String = path.iter().map(ToString::to_string).collect();
    out.push_str("\n   └─ ");
    out.push_str(&indent(&indent(&issue.to_string())));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_type_message() {
        let issue = Issue::invalid_type("string", Some(Value::Number(1.0)));
        assert_eq!(issue.to_string(), "Expected string, got 1");
        let absent = Issue::invalid_type("string", None);
        assert_eq!(absent.to_string(), "Expected string, got no value provided");
    }

    #[test]
    fn test_missing_key_default_and_custom() {
        assert_eq!(Issue::missing_key().to_string(), "Missing key");
        let custom = Issue::MissingKey {
            message: Some("name is required".into()),
        };
        assert_eq!(custom.to_string(), "name is required");
    }

    #[test]
    fn test_pointer_merges_nested_paths() {
        let leaf = Issue::invalid_type("number", None);
        let inner = Issue::pointer(vec![PathKey::Index(0)], leaf.clone());
        let outer = Issue::pointer(vec!["items".into()], inner);
        match &outer {
            Issue::Pointer { path, issue } => {
                assert_eq!(path, &vec![PathKey::from("items"), PathKey::Index(0)]);
                assert_eq!(issue.as_ref(), &leaf);
            }
            other => panic!("Expected Pointer, got: {other}"),
        }
    }

    #[test]
    fn test_leaves_collects_paths() {
        let tree = Issue::Composite {
            expected: "{ a: string; b: number }".into(),
            actual: None,
            issues: vec![
                Issue::pointer(vec!["a".into()], Issue::missing_key()),
                Issue::pointer(
                    vec!["b".into()],
                    Issue::forbidden(None, "cannot serialize to JSON"),
                ),
            ],
        };
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].0, vec![PathKey::from("a")]);
        assert_eq!(leaves[1].1.tag(), "Forbidden");
        assert!(tree.is_forbidden());
    }

    #[test]
    fn test_composite_rendering() {
        let tree = Issue::Composite {
            expected: "{ a: string }".into(),
            actual: None,
            issues: vec![Issue::pointer(vec!["a".into()], Issue::missing_key())],
        };
        assert_eq!(tree.to_string(), "{ a: string }\n└─ [\"a\"]\n      └─ Missing key");
    }
}
