//! # Transformations — Paired Decode/Encode Getters
//!
//! A [`Transformation`] is the edge of an encoding chain: `decode` maps the
//! encoded side to the decoded side, `encode` maps back. Both halves are
//! ordinary [`Getter`]s, so absence handling and failure work the same way
//! in both directions.
//!
//! Composition keeps the two halves mirrored: for `self.compose(next)` the
//! decode direction runs `next` first and `self` last, while encode runs
//! `self` first and `next` last. `self` is the step closer to the decoded
//! type.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::getter::{Getter, KeyValueOptions};
use crate::issue::Issue;
use crate::value::{format_date, Value};

/// A pair of getters with opposite directions.
#[derive(Clone, Default)]
pub struct Transformation {
    name: Option<Cow<'static, str>>,
    decode: Getter,
    encode: Getter,
}

impl Transformation {
    pub fn make(decode: Getter, encode: Getter) -> Self {
        Self {
            name: None,
            decode,
            encode,
        }
    }

    /// Identity in both directions.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Infallible mappings on present values.
    pub fn transform<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(Value) -> Value + Send + Sync + 'static,
        E: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::make(Getter::transform(decode), Getter::transform(encode))
    }

    /// Fallible mappings on present values.
    pub fn transform_or_fail<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(Value) -> Result<Value, Issue> + Send + Sync + 'static,
        E: Fn(Value) -> Result<Value, Issue> + Send + Sync + 'static,
    {
        Self::make(
            Getter::transform_or_fail(move |v, _, _| decode(v)),
            Getter::transform_or_fail(move |v, _, _| encode(v)),
        )
    }

    /// Attach a name used when rendering chains.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn decode(&self) -> &Getter {
        &self.decode
    }

    pub fn encode(&self) -> &Getter {
        &self.encode
    }

    /// Swap the two directions.
    pub fn flip(&self) -> Self {
        Self {
            name: self.name.clone(),
            decode: self.encode.clone(),
            encode: self.decode.clone(),
        }
    }

    /// Chain with a step further from the decoded side.
    pub fn compose(&self, next: &Transformation) -> Self {
        let name = match (&self.name, &next.name) {
            (Some(a), Some(b)) => Some(Cow::Owned(format!("{b} -> {a}"))),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        Self {
            name,
            decode: next.decode.compose(&self.decode),
            encode: self.encode.compose(&next.encode),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.decode.is_passthrough() && self.encode.is_passthrough()
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("name", &self.name)
            .field("decode", &self.decode)
            .field("encode", &self.encode)
            .finish()
    }
}

// ─── Built-in transformations ────────────────────────────────────────

impl Transformation {
    /// String ↔ number. Encoding renders the shortest round-tripping form.
    pub fn number_from_string() -> Self {
        Self::make(Getter::number(), Getter::string()).named("numberFromString")
    }

    /// Decimal string ↔ bigint. Decoding is strict: an optional sign and
    /// digits, no surrounding whitespace.
    pub fn bigint_from_string() -> Self {
        let decode = Getter::transform_or_fail(|value, _, _| match value {
            Value::String(ref s) => s.parse::<i128>().map(Value::BigInt).map_err(|_| {
                Issue::invalid_value(Some(value.clone()), format!("cannot convert {value} to a bigint"))
            }),
            other => Err(Issue::invalid_type("string", Some(other))),
        });
        Self::make(decode, Getter::string()).named("bigintFromString")
    }

    /// RFC 3339 string ↔ date.
    pub fn date_from_string() -> Self {
        Self::transform_or_fail(
            |value| match value {
                Value::String(ref s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(|d| Value::Date(d.with_timezone(&Utc)))
                    .map_err(|_| {
                        Issue::invalid_value(Some(value.clone()), format!("cannot convert {value} to a Date"))
                    }),
                other => Err(Issue::invalid_type("string", Some(other))),
            },
            |value| match value {
                Value::Date(d) => Ok(Value::String(format_date(&d))),
                other => Err(Issue::invalid_type("Date", Some(other))),
            },
        )
        .named("dateFromString")
    }

    /// JSON text ↔ arbitrary JSON value.
    pub fn unknown_from_json_string() -> Self {
        Self::make(Getter::parse_json(), Getter::stringify_json()).named("unknownFromJsonString")
    }

    /// Trims on decode; encode is the identity.
    pub fn trim() -> Self {
        Self::make(Getter::trim(), Getter::passthrough()).named("trim")
    }

    pub fn to_lower_case() -> Self {
        Self::make(Getter::to_lower_case(), Getter::passthrough()).named("toLowerCase")
    }

    pub fn to_upper_case() -> Self {
        Self::make(Getter::to_upper_case(), Getter::passthrough()).named("toUpperCase")
    }

    pub fn capitalize() -> Self {
        Self::make(Getter::capitalize(), Getter::passthrough()).named("capitalize")
    }

    pub fn uncapitalize() -> Self {
        Self::make(Getter::uncapitalize(), Getter::passthrough()).named("uncapitalize")
    }

    /// `a=1,b=2` ↔ `{ a: "1", b: "2" }`.
    pub fn split_key_value(options: KeyValueOptions) -> Self {
        Self::make(
            Getter::split_key_value(options.clone()),
            Getter::join_key_value(options),
        )
        .named("splitKeyValue")
    }

    /// Base64 string ↔ bytes.
    pub fn bytes_from_base64() -> Self {
        Self::make(Getter::decode_base64(), Getter::encode_base64()).named("bytesFromBase64")
    }

    /// Hex string ↔ bytes.
    pub fn bytes_from_hex() -> Self {
        Self::make(Getter::decode_hex(), Getter::encode_hex()).named("bytesFromHex")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::getter::GetterResult;
    use crate::options::ParseOptions;

    fn run(getter: &Getter, input: Value) -> GetterResult {
        getter.run(Some(input), &ParseOptions::default(), &Context::default())
    }

    fn suffix(tag: &'static str) -> Transformation {
        Transformation::transform(
            move |v| match v {
                Value::String(s) => Value::String(format!("{s}{tag}")),
                other => other,
            },
            move |v| match v {
                Value::String(s) => Value::String(s.trim_end_matches(tag).to_string()),
                other => other,
            },
        )
    }

    #[test]
    fn test_passthrough() {
        let t = Transformation::passthrough();
        assert!(t.is_passthrough());
        assert!(t.compose(&Transformation::passthrough()).is_passthrough());
    }

    #[test]
    fn test_flip_swaps_directions() {
        let t = Transformation::number_from_string();
        let flipped = t.flip();
        assert!(Getter::same(flipped.decode(), t.encode()));
        assert!(Getter::same(flipped.encode(), t.decode()));
    }

    #[test]
    fn test_compose_orders_directions() {
        // `outer` is closer to the decoded side.
        let outer = suffix("-a");
        let inner = suffix("-b");
        let chain = outer.compose(&inner);
        assert_eq!(
            run(chain.decode(), Value::from("x")).unwrap(),
            Some(Value::from("x-b-a"))
        );
        assert_eq!(
            run(chain.encode(), Value::from("x-b-a")).unwrap(),
            Some(Value::from("x"))
        );
    }

    #[test]
    fn test_compose_names() {
        let chain = Transformation::trim().compose(&Transformation::number_from_string());
        assert_eq!(chain.name(), Some("numberFromString -> trim"));
    }

    #[test]
    fn test_number_from_string() {
        let t = Transformation::number_from_string();
        assert_eq!(run(t.decode(), Value::from("2.5")).unwrap(), Some(Value::Number(2.5)));
        assert_eq!(run(t.encode(), Value::Number(2.5)).unwrap(), Some(Value::from("2.5")));
        assert!(run(t.decode(), Value::from("two")).is_err());
    }

    #[test]
    fn test_bigint_from_string() {
        let t = Transformation::bigint_from_string();
        assert_eq!(
            run(t.decode(), Value::from("170141183460469231731687303715884105727")).unwrap(),
            Some(Value::BigInt(i128::MAX))
        );
        assert_eq!(run(t.encode(), Value::BigInt(-5)).unwrap(), Some(Value::from("-5")));
        assert_eq!(run(t.decode(), Value::from("-5")).unwrap(), Some(Value::BigInt(-5)));
        for malformed in ["+-5", " 5", "5 ", "", "1e3"] {
            assert_eq!(run(t.decode(), Value::from(malformed)).unwrap_err().tag(), "InvalidValue");
        }
        assert_eq!(run(t.decode(), Value::Number(5.0)).unwrap_err().tag(), "InvalidType");
    }

    #[test]
    fn test_date_from_string() {
        let t = Transformation::date_from_string();
        let decoded = run(t.decode(), Value::from("2020-05-06T07:08:09.010Z"))
            .unwrap()
            .expect("date");
        assert_eq!(decoded.kind(), "Date");
        assert_eq!(
            run(t.encode(), decoded).unwrap(),
            Some(Value::from("2020-05-06T07:08:09.010Z"))
        );
        assert!(run(t.decode(), Value::Number(0.0)).is_err());
    }

    #[test]
    fn test_case_transformations_encode_as_identity() {
        let t = Transformation::to_upper_case();
        assert_eq!(run(t.decode(), Value::from("ab")).unwrap(), Some(Value::from("AB")));
        assert!(t.encode().is_passthrough());
    }

    #[test]
    fn test_bytes_from_hex() {
        let t = Transformation::bytes_from_hex();
        assert_eq!(
            run(t.decode(), Value::from("ff00")).unwrap(),
            Some(Value::Bytes(vec![0xff, 0x00]))
        );
        assert_eq!(
            run(t.encode(), Value::Bytes(vec![0xff, 0x00])).unwrap(),
            Some(Value::from("ff00"))
        );
    }

    #[test]
    fn test_unknown_from_json_string() {
        let t = Transformation::unknown_from_json_string();
        let decoded = run(t.decode(), Value::from("[1,\"a\"]")).unwrap().expect("array");
        assert_eq!(
            decoded,
            Value::Array(vec![Value::Number(1.0), Value::from("a")])
        );
        assert_eq!(run(t.encode(), decoded).unwrap(), Some(Value::from("[1,\"a\"]")));
    }
}
