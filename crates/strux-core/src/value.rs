//! # Dynamic Values — Decoded and Encoded Representations
//!
//! `Value` is the single runtime representation flowing through every
//! [`Getter`](crate::Getter) and [`Transformation`](crate::Transformation).
//! It covers the decoded side (symbols, bigints, dates, byte buffers,
//! opaque instances) as well as the wire side (JSON-shaped data).
//!
//! ## JSON Safety
//!
//! A value is *JSON-safe* when it is built only from:
//!
//! 1. `null`, booleans and strings;
//! 2. finite numbers;
//! 3. arrays and objects whose members are themselves JSON-safe.
//!
//! [`Value::to_json`] is the only conversion path into `serde_json::Value`.
//! It walks the tree once and rejects the first non-JSON-safe member with
//! its location, so an encoder that produced a symbol or a bigint deep in a
//! structure is reported precisely instead of being silently stringified.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use crate::error::CoreError;
use crate::symbol::Symbol;

/// An arbitrary host instance carried through the codec untouched.
///
/// Opaque values are compared by identity: two `OpaqueValue`s are equal only
/// if they share the same allocation.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    /// Wrap a host value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// The (unqualified) Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue<{}>", self.type_name)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Runtime value processed by getters, transformations and the schema driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit `undefined` (present, but carrying nothing).
    Undefined,
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// IEEE-754 double, including NaN and the infinities.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Arbitrary-sign integer that does not fit the number domain.
    BigInt(i128),
    /// Symbol, compared by identity.
    Symbol(Symbol),
    /// UTC instant.
    Date(DateTime<Utc>),
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Ordered list.
    Array(Vec<Value>),
    /// String-keyed record. Keys are kept sorted for deterministic output.
    Object(BTreeMap<String, Value>),
    /// Host instance the codec never looks inside.
    Opaque(OpaqueValue),
}

impl Value {
    /// Build an object from `(key, value)` pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the runtime kind, used in issue messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "Date",
            Value::Bytes(_) => "Uint8Array",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Opaque(o) => o.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a property on an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Whether the whole tree is JSON-representable.
    pub fn is_json_safe(&self) -> bool {
        match self {
            Value::Null | Value::Bool(_) | Value::String(_) => true,
            Value::Number(n) => n.is_finite(),
            Value::Array(items) => items.iter().all(Value::is_json_safe),
            Value::Object(map) => map.values().all(Value::is_json_safe),
            _ => false,
        }
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotJson`] naming the first member (as a
    /// `$.key[index]` path) that has no JSON representation.
    pub fn to_json(&self) -> Result<JsonValue, CoreError> {
        let mut path = String::from("$");
        to_json_at(self, &mut path)
    }

    /// Convert from a `serde_json::Value`. Every JSON value is representable.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            JsonValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

fn to_json_at(value: &Value, path: &mut String) -> Result<JsonValue, CoreError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::String(s) => Ok(JsonValue::String(s.clone())),
        Value::Number(n) => json_number(*n).ok_or_else(|| CoreError::NotJson {
            path: path.clone(),
            kind: "non-finite number",
        }),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                out.push(to_json_at(item, path)?);
                path.truncate(len);
            }
            Ok(JsonValue::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let len = path.len();
                path.push('.');
                path.push_str(k);
                out.insert(k.clone(), to_json_at(v, path)?);
                path.truncate(len);
            }
            Ok(JsonValue::Object(out))
        }
        other => Err(CoreError::NotJson {
            path: path.clone(),
            kind: other.kind(),
        }),
    }
}

/// Integral doubles become JSON integers so `1.0` renders as `1`.
fn json_number(n: f64) -> Option<JsonValue> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Some(JsonValue::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(JsonValue::Number)
}

/// Render a number the way a JavaScript runtime prints it: shortest
/// round-tripping digits, exponent form (`1e+21`, `1.5e-7`) outside
/// `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let rendered = format!("{n:e}");
        match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        }
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// ISO-8601 rendering with millisecond precision and a `Z` suffix.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{}", JsonValue::String(s.clone())),
            Value::BigInt(b) => write!(f, "{b}n"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "Date({})", format_date(d)),
            Value::Bytes(b) => write!(f, "Uint8Array({})", b.len()),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{v}", JsonValue::String(k.clone()))?;
                }
                f.write_str("}")
            }
            Value::Opaque(o) => write!(f, "<{}>", o.type_name()),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from_json(json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_plain_object() {
        let value = Value::object([
            ("name", Value::from("ada")),
            ("age", Value::Number(36.0)),
            ("tags", Value::Array(vec![Value::Bool(true), Value::Null])),
        ]);
        let json = value.to_json().expect("plain values are JSON-safe");
        assert_eq!(
            json,
            serde_json::json!({"name": "ada", "age": 36, "tags": [true, null]})
        );
    }

    #[test]
    fn test_to_json_rejects_bigint_with_path() {
        let value = Value::object([(
            "items",
            Value::Array(vec![Value::Number(1.0), Value::BigInt(7)]),
        )]);
        match value.to_json().unwrap_err() {
            CoreError::NotJson { path, kind } => {
                assert_eq!(path, "$.items[1]");
                assert_eq!(kind, "bigint");
            }
            other => panic!("Expected NotJson, got: {other}"),
        }
    }

    #[test]
    fn test_to_json_rejects_non_finite() {
        assert!(Value::Number(f64::NAN).to_json().is_err());
        assert!(Value::Number(f64::INFINITY).to_json().is_err());
        assert!(!Value::Number(f64::NEG_INFINITY).is_json_safe());
    }

    #[test]
    fn test_from_json_round_trip() {
        let json = serde_json::json!({"a": [1, 2.5, "x"], "b": {"c": false}});
        let value = Value::from_json(json.clone());
        assert!(value.is_json_safe());
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_format_number_matches_js() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-6), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
    }

    #[test]
    fn test_opaque_identity_equality() {
        let a = OpaqueValue::new(vec![1u8, 2, 3]);
        let b = a.clone();
        let c = OpaqueValue::new(vec![1u8, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
        assert_eq!(a.type_name(), "Vec<u8>");
    }

    #[test]
    fn test_display_renders_json_like() {
        let value = Value::object([("k", Value::BigInt(3)), ("s", Value::from("a\"b"))]);
        assert_eq!(value.to_string(), r#"{"k":3n,"s":"a\"b"}"#);
    }
}
