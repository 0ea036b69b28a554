//! # Error Types
//!
//! Errors raised by the schema layer. Validation and encoding failures are
//! [`Issue`]s and travel inside [`SchemaError::Issue`]; the remaining
//! variants describe a malformed arena rather than bad input.

use strux_core::{CoreError, Issue};
use thiserror::Error;

use crate::ast::NodeId;

/// Top-level error type for `strux-schema`.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The input did not match the schema, or could not be encoded.
    #[error("{0}")]
    Issue(#[from] Issue),

    /// A value could not leave the value model (for example, not JSON).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A `NodeId` that does not belong to the arena, or was reserved and
    /// never defined.
    #[error("unknown schema node {0}")]
    UnknownNode(NodeId),

    /// [`Ast::define`](crate::Ast::define) was called twice for one id.
    #[error("schema node {0} is already defined")]
    AlreadyDefined(NodeId),

    /// Suspend nodes that only ever resolve to each other.
    #[error("suspended schema {0} never resolves to a concrete node")]
    UnresolvedSuspend(NodeId),

    /// A template literal produced an invalid pattern.
    #[error("invalid template literal pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SchemaError {
    /// The issue tree, when this error is a validation failure.
    pub fn issue(&self) -> Option<&Issue> {
        match self {
            SchemaError::Issue(issue) => Some(issue),
            _ => None,
        }
    }
}
