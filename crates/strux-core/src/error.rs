//! # Error Types
//!
//! Crate-level errors for `strux-core`. Failures *inside* a codec pipeline
//! are [`Issue`](crate::Issue)s; the errors here cover the boundaries
//! around it: leaving the value model for JSON, and loading configuration.

use thiserror::Error;

/// Top-level error type for `strux-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A value has no JSON representation.
    #[error("value at {path} is not JSON-representable ({kind})")]
    NotJson {
        /// `$`-rooted path to the offending member.
        path: String,
        /// Runtime kind of the offending member.
        kind: &'static str,
    },

    /// Parse options could not be loaded from their configuration source.
    #[error("invalid parse options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}
