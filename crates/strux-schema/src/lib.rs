//! # strux-schema — Schema AST, Driver and JSON Serializer
//!
//! Builds on `strux-core` with the schema side of strux:
//!
//! - [`ast`] — arena of schema nodes with encoding chains.
//! - [`parser`] — tree-walking decode/encode driver.
//! - [`serializer`] — memoized rewriter that derives JSON encodings.
//! - [`codec`] — [`Codec`] entry points and [`json`].
//!
//! ## Example
//!
//! ```
//! use strux_core::Value;
//! use strux_schema::{json, Ast, Codec, PropertySignature};
//!
//! let ast = Ast::new();
//! let id = ast.bigint();
//! let name = ast.string();
//! let user = ast.struct_(
//!     vec![
//!         PropertySignature::required("id", id),
//!         PropertySignature::required("name", name),
//!     ],
//!     vec![],
//! );
//! let codec = json(&Codec::new(ast, user)).unwrap();
//! let encoded = codec
//!     .encode_json(Value::object([
//!         ("id", Value::BigInt(42)),
//!         ("name", Value::from("Ada")),
//!     ]))
//!     .unwrap();
//! assert_eq!(encoded, serde_json::json!({ "id": "42", "name": "Ada" }));
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `strux-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod annotations;
pub mod ast;
pub mod codec;
pub mod error;
pub mod parser;
pub mod serializer;

// Re-export primary types for ergonomic imports.
pub use annotations::{Annotations, DeclarationSerializer, SerializerRegistry};
pub use ast::{
    Ast, Check, Declaration, Element, IndexSignature, Link, Literal, Node, NodeId, NodeKind,
    PropertySignature, Suspension, TemplatePart, UnionMode,
};
pub use codec::{json, json_with, Codec};
pub use error::SchemaError;
pub use parser::{Direction, Parser};
pub use serializer::{JsonSerializer, MISSING_JSON_SERIALIZER};
