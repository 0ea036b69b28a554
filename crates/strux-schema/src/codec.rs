//! # Codec — Entry Points
//!
//! A [`Codec`] pairs an arena with a root node and exposes decode/encode
//! over dynamic values and over `serde_json::Value`. [`json`] rewrites a
//! codec into one whose encode side always produces JSON.

use strux_core::{Context, Issue, ParseOptions, Value};

use crate::ast::{Ast, NodeId};
use crate::error::SchemaError;
use crate::parser::Parser;
use crate::serializer::JsonSerializer;

/// A schema root in an arena.
#[derive(Debug, Clone)]
pub struct Codec {
    ast: Ast,
    root: NodeId,
}

impl Codec {
    pub fn new(ast: Ast, root: NodeId) -> Self {
        Self { ast, root }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Rendering of the root, as used in issue messages.
    pub fn describe(&self) -> String {
        self.ast.describe(self.root)
    }

    pub fn decode_unknown(&self, input: Value) -> Result<Value, SchemaError> {
        self.decode_unknown_with(input, &ParseOptions::default(), &Context::default())
    }

    pub fn decode_unknown_with(
        &self,
        input: Value,
        options: &ParseOptions,
        context: &Context,
    ) -> Result<Value, SchemaError> {
        Parser::new(&self.ast, options, context)
            .decode(self.root, Some(input))?
            .ok_or_else(|| Issue::missing_key().into())
    }

    pub fn encode_unknown(&self, input: Value) -> Result<Value, SchemaError> {
        self.encode_unknown_with(input, &ParseOptions::default(), &Context::default())
    }

    pub fn encode_unknown_with(
        &self,
        input: Value,
        options: &ParseOptions,
        context: &Context,
    ) -> Result<Value, SchemaError> {
        Parser::new(&self.ast, options, context)
            .encode(self.root, Some(input))?
            .ok_or_else(|| Issue::missing_key().into())
    }

    pub fn decode_json(&self, input: serde_json::Value) -> Result<Value, SchemaError> {
        self.decode_unknown(Value::from_json(input))
    }

    pub fn decode_json_with(
        &self,
        input: serde_json::Value,
        options: &ParseOptions,
        context: &Context,
    ) -> Result<Value, SchemaError> {
        self.decode_unknown_with(Value::from_json(input), options, context)
    }

    /// Encode and convert the result to JSON. Fails with
    /// [`SchemaError::Core`] if the encoded value is not JSON-safe.
    pub fn encode_json(&self, input: Value) -> Result<serde_json::Value, SchemaError> {
        Ok(self.encode_unknown(input)?.to_json()?)
    }

    pub fn encode_json_with(
        &self,
        input: Value,
        options: &ParseOptions,
        context: &Context,
    ) -> Result<serde_json::Value, SchemaError> {
        Ok(self.encode_unknown_with(input, options, context)?.to_json()?)
    }

    /// Check a value against the type side of the root.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        Parser::new(&self.ast, &ParseOptions::default(), &Context::default())
            .validate(self.root, value)
    }

    pub fn is(&self, value: &Value) -> Result<bool, SchemaError> {
        Parser::new(&self.ast, &ParseOptions::default(), &Context::default())
            .is(self.root, value)
    }
}

/// Rewrite `codec` so that its encoded side is always JSON.
///
/// The result shares the arena of `codec`. Decoding still accepts every
/// JSON-shaped input the original accepted; encoding fails with
/// `Forbidden` for parts of the schema that have no JSON representation.
pub fn json(codec: &Codec) -> Result<Codec, SchemaError> {
    json_with(codec, &JsonSerializer::new())
}

/// Like [`json`], reusing the memo of `serializer`.
pub fn json_with(codec: &Codec, serializer: &JsonSerializer) -> Result<Codec, SchemaError> {
    let root = serializer.serialize(&codec.ast, codec.root)?;
    Ok(Codec::new(codec.ast.clone(), root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Link;
    use strux_core::{Getter, Transformation};

    #[test]
    fn test_decode_and_encode_json() {
        let ast = Ast::new();
        let s = ast.string();
        let n = ast.number();
        let root = ast
            .transform(s, n, Transformation::number_from_string())
            .expect("transform");
        let codec = Codec::new(ast, root);
        assert_eq!(
            codec.decode_json(serde_json::json!("1.5")).expect("decode"),
            Value::Number(1.5)
        );
        assert_eq!(
            codec.encode_json(Value::Number(1.5)).expect("encode"),
            serde_json::json!("1.5")
        );
    }

    #[test]
    fn test_encode_json_rejects_non_json_output() {
        let ast = Ast::new();
        let root = ast.bigint();
        let codec = Codec::new(ast, root);
        let err = codec.encode_json(Value::BigInt(1)).unwrap_err();
        assert!(matches!(err, SchemaError::Core(_)));

        let serialized = json(&codec).expect("json");
        assert_eq!(
            serialized.encode_json(Value::BigInt(1)).expect("encode"),
            serde_json::json!("1")
        );
    }

    #[test]
    fn test_omitted_root_is_missing() {
        let ast = Ast::new();
        let n = ast.number();
        let root = ast
            .with_encoding(
                n,
                Link::new(n, Transformation::make(Getter::omit(), Getter::omit())),
            )
            .expect("encoding");
        let codec = Codec::new(ast, root);
        let err = codec.decode_unknown(Value::Number(1.0)).unwrap_err();
        assert_eq!(err.issue().map(Issue::tag), Some("MissingKey"));
    }
}
