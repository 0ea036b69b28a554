//! # Parse Options
//!
//! Policy knobs threaded through every getter and driver call. The policy
//! itself is owned by the caller; getters only read it.
//!
//! Options are plain serde data so they can be loaded from configuration:
//!
//! ```json
//! { "errors": "all", "onExcessProperty": "error" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How many issues a container collects before failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorsMode {
    /// Stop at the first issue.
    #[default]
    First,
    /// Collect every issue into a composite.
    All,
}

/// What a struct does with keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnExcessProperty {
    /// Drop them silently.
    #[default]
    Ignore,
    /// Fail with `UnexpectedKey`.
    Error,
    /// Copy them through unchanged.
    Preserve,
}

/// Options passed to every `run` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Issue collection policy.
    pub errors: ErrorsMode,
    /// Excess property policy.
    pub on_excess_property: OnExcessProperty,
}

impl ParseOptions {
    /// Load options from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn with_errors(mut self, errors: ErrorsMode) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_on_excess_property(mut self, policy: OnExcessProperty) -> Self {
        self.on_excess_property = policy;
        self
    }

    /// Whether containers should keep going after the first issue.
    pub fn collects_all(&self) -> bool {
        self.errors == ErrorsMode::All
    }
}
