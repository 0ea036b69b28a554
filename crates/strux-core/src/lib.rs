//! # strux-core — Values, Getters and Transformations
//!
//! The runtime half of strux. This crate knows nothing about schemas; it
//! defines the dynamic [`Value`] model that schemas describe, the
//! [`Issue`] tree every failure is reported as, and the two composable
//! building blocks that encoding chains are made of: [`Getter`] and
//! [`Transformation`].
//!
//! ## Key Design Principles
//!
//! 1. **Absence is a value.** Getters take and return `Option<Value>`.
//!    `None` is a missing struct key or a dropped output, never an error by
//!    itself.
//!
//! 2. **Identity is recognizable.** [`Getter::Passthrough`] is a distinct
//!    variant, so composition can skip it and callers can test for it
//!    without running anything.
//!
//! 3. **Issues are data.** Failures are [`Issue`] values returned through
//!    `Result`, carrying the observed value and a path.
//!
//! 4. **Services are explicit.** Getters that need capabilities read them
//!    from a [`Context`] passed to every run.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `strux-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod check;
pub mod context;
pub mod error;
pub mod getter;
pub mod issue;
pub mod options;
pub mod symbol;
pub mod transformation;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use check::CheckResult;
pub use context::Context;
pub use error::CoreError;
pub use getter::{Getter, GetterResult, KeyValueOptions, Step};
pub use issue::{Issue, PathKey};
pub use options::{ErrorsMode, OnExcessProperty, ParseOptions};
pub use symbol::Symbol;
pub use transformation::Transformation;
pub use value::{format_date, format_number, OpaqueValue, Value};
