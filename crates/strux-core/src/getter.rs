//! # Getters — Composable Partial Functions over Optional Values
//!
//! A [`Getter`] maps an optional input to an optional output, or fails with
//! an [`Issue`]. `None` means *absent*: a struct key that was not provided,
//! or an output that should be dropped. Absence is not an error by itself;
//! only [`Getter::required`] (or the containing struct) turns it into one.
//!
//! ## Composition Law
//!
//! [`Getter::passthrough`] is the identity. [`Getter::compose`] recognizes
//! it on either side and hands back the other operand untouched, so long
//! field pipelines built from mostly-identity steps do not accumulate
//! wrappers. Every other composition is flattened into a single
//! [`Getter::Pipeline`]: a chain of `n` steps is one slice of `n` closures,
//! run by one loop, regardless of how the chain was bracketed.
//!
//! ## Convenience Getters
//!
//! Coercions, string operations and encodings are all defined through
//! [`Getter::transform`] or [`Getter::transform_or_fail`]. None of them
//! handle absence themselves.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::check::CheckResult;
use crate::context::Context;
use crate::issue::Issue;
use crate::options::ParseOptions;
use crate::value::{format_date, format_number, Value};

/// Result of running a getter: an optional value or an issue.
pub type GetterResult = Result<Option<Value>, Issue>;

/// A single getter step.
pub type Step = dyn Fn(Option<Value>, &ParseOptions, &Context) -> GetterResult + Send + Sync;

/// Composable, partial, effectful function over optional values.
#[derive(Clone, Default)]
pub enum Getter {
    /// Identity. Absorbed by [`Getter::compose`].
    #[default]
    Passthrough,
    /// A single step.
    Run(Arc<Step>),
    /// Steps run left to right; the first failure stops the pipeline.
    Pipeline(Arc<[Arc<Step>]>),
}

impl Getter {
    /// The identity getter.
    pub fn passthrough() -> Self {
        Getter::Passthrough
    }

    fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Option<Value>, &ParseOptions, &Context) -> GetterResult + Send + Sync + 'static,
    {
        Getter::Run(Arc::new(f))
    }

    /// Always fail with the issue built from the input.
    pub fn fail<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Issue + Send + Sync + 'static,
    {
        Self::from_fn(move |input, _, _| Err(f(input.as_ref())))
    }

    /// Always fail with `Forbidden`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::fail(move |actual| Issue::forbidden(actual.cloned(), message.clone()))
    }

    /// Run `f` only when the input is absent; present values pass through.
    pub fn on_none<F>(f: F) -> Self
    where
        F: Fn(&ParseOptions, &Context) -> GetterResult + Send + Sync + 'static,
    {
        Self::from_fn(move |input, options, ctx| match input {
            None => f(options, ctx),
            present => Ok(present),
        })
    }

    /// Fail with `MissingKey` when the input is absent.
    pub fn required(message: Option<String>) -> Self {
        Self::on_none(move |_, _| {
            Err(Issue::MissingKey {
                message: message.clone(),
            })
        })
    }

    /// Run `f` only when the input is present; absence short-circuits.
    pub fn on_some<F>(f: F) -> Self
    where
        F: Fn(Value, &ParseOptions, &Context) -> GetterResult + Send + Sync + 'static,
    {
        Self::from_fn(move |input, options, ctx| match input {
            Some(value) => f(value, options, ctx),
            None => Ok(None),
        })
    }

    /// Map present values with an infallible function.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::on_some(move |value, _, _| Ok(Some(f(value))))
    }

    /// Map present values with a fallible function.
    pub fn transform_or_fail<F>(f: F) -> Self
    where
        F: Fn(Value, &ParseOptions, &Context) -> Result<Value, Issue> + Send + Sync + 'static,
    {
        Self::on_some(move |value, options, ctx| f(value, options, ctx).map(Some))
    }

    /// Map the optional input itself; may create or drop values.
    pub fn transform_optional<F>(f: F) -> Self
    where
        F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        Self::from_fn(move |input, _, _| Ok(f(input)))
    }

    /// Drop present values; the output is always absent.
    pub fn omit() -> Self {
        Self::on_some(|_, _, _| Ok(None))
    }

    /// Supply a value when the input is absent.
    pub fn with_default<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::on_none(move |_, _| Ok(Some(f())))
    }

    /// Run a side validation on present values without altering them.
    pub fn check_effect<F, R>(f: F) -> Self
    where
        F: Fn(&Value, &ParseOptions, &Context) -> R + Send + Sync + 'static,
        R: Into<CheckResult>,
    {
        Self::on_some(move |value, options, ctx| {
            match f(&value, options, ctx).into().into_issue(&value) {
                None => Ok(Some(value)),
                Some(issue) => Err(issue),
            }
        })
    }

    /// Sequential composition: `self` runs first, then `next`.
    pub fn compose(&self, next: &Getter) -> Getter {
        match (self, next) {
            (Getter::Passthrough, _) => next.clone(),
            (_, Getter::Passthrough) => self.clone(),
            _ => {
                let mut steps = self.steps();
                steps.extend(next.steps());
                Getter::Pipeline(Arc::from(steps))
            }
        }
    }

    fn steps(&self) -> Vec<Arc<Step>> {
        match self {
            Getter::Passthrough => Vec::new(),
            Getter::Run(step) => vec![Arc::clone(step)],
            Getter::Pipeline(steps) => steps.to_vec(),
        }
    }

    /// Number of closures this getter runs. `0` for the identity.
    pub fn step_count(&self) -> usize {
        match self {
            Getter::Passthrough => 0,
            Getter::Run(_) => 1,
            Getter::Pipeline(steps) => steps.len(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Getter::Passthrough)
    }

    /// Identity comparison: both identities, or the same shared allocation.
    pub fn same(a: &Getter, b: &Getter) -> bool {
        match (a, b) {
            (Getter::Passthrough, Getter::Passthrough) => true,
            (Getter::Run(x), Getter::Run(y)) => Arc::ptr_eq(x, y),
            (Getter::Pipeline(x), Getter::Pipeline(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    pub fn run(
        &self,
        input: Option<Value>,
        options: &ParseOptions,
        ctx: &Context,
    ) -> GetterResult {
        match self {
            Getter::Passthrough => Ok(input),
            Getter::Run(step) => step(input, options, ctx),
            Getter::Pipeline(steps) => {
                let mut current = input;
                for step in steps.iter() {
                    current = step(current, options, ctx)?;
                }
                Ok(current)
            }
        }
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Passthrough => f.write_str("Getter::Passthrough"),
            Getter::Run(_) => f.write_str("Getter::Run"),
            Getter::Pipeline(steps) => write!(f, "Getter::Pipeline({})", steps.len()),
        }
    }
}

// ─── Coercions ───────────────────────────────────────────────────────

impl Getter {
    /// Coerce to a number. Strings must parse; `"NaN"` and `"Infinity"`
    /// are accepted.
    pub fn number() -> Self {
        Self::transform_or_fail(|value, _, _| coerce_number(&value).map(Value::Number))
    }

    /// Coerce scalars to their string form.
    pub fn string() -> Self {
        Self::transform_or_fail(|value, _, _| coerce_string(&value).map(Value::String))
    }

    /// Coerce to a boolean using truthiness.
    pub fn boolean() -> Self {
        Self::transform(|value| Value::Bool(truthy(&value)))
    }

    /// Coerce to a bigint. Numbers must be integral.
    pub fn bigint() -> Self {
        Self::transform_or_fail(|value, _, _| coerce_bigint(&value).map(Value::BigInt))
    }

    /// Coerce RFC 3339 strings or epoch milliseconds to a date.
    pub fn date() -> Self {
        Self::transform_or_fail(|value, _, _| coerce_date(&value).map(Value::Date))
    }
}

fn cannot_convert(value: &Value, target: &str) -> Issue {
    Issue::invalid_value(
        Some(value.clone()),
        format!("cannot convert {value} to {target}"),
    )
}

fn coerce_number(value: &Value) -> Result<f64, Issue> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        Value::BigInt(b) => Ok(*b as f64),
        Value::Date(d) => Ok(d.timestamp_millis() as f64),
        Value::String(s) => match s.trim() {
            "NaN" => Ok(f64::NAN),
            "Infinity" | "+Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            "" => Err(cannot_convert(value, "a number")),
            trimmed => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| cannot_convert(value, "a number")),
        },
        _ => Err(cannot_convert(value, "a number")),
    }
}

fn coerce_string(value: &Value) -> Result<String, Issue> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::BigInt(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Undefined => Ok("undefined".to_string()),
        Value::Symbol(s) => Ok(s.to_string()),
        Value::Date(d) => Ok(format_date(d)),
        _ => Err(cannot_convert(value, "a string")),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::BigInt(b) => *b != 0,
        _ => true,
    }
}

fn coerce_bigint(value: &Value) -> Result<i128, Issue> {
    match value {
        Value::BigInt(b) => Ok(*b),
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1.7e38 => {
            Ok(*n as i128)
        }
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| cannot_convert(value, "a bigint")),
        _ => Err(cannot_convert(value, "a bigint")),
    }
}

fn coerce_date(value: &Value) -> Result<DateTime<Utc>, Issue> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| cannot_convert(value, "a Date")),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => {
            DateTime::<Utc>::from_timestamp_millis(*n as i64)
                .ok_or_else(|| cannot_convert(value, "a Date"))
        }
        _ => Err(cannot_convert(value, "a Date")),
    }
}

// ─── String operations ───────────────────────────────────────────────

/// Separators used by [`Getter::split_key_value`] / [`Getter::join_key_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueOptions {
    /// Between pairs. Default `,`.
    pub separator: String,
    /// Between a key and its value. Default `=`.
    pub key_value_separator: String,
}

impl Default for KeyValueOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            key_value_separator: "=".to_string(),
        }
    }
}

fn map_string<F>(f: F) -> Getter
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Getter::transform(move |value| match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    })
}

fn expect_string(value: Value) -> Result<String, Issue> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Issue::invalid_type("string", Some(other))),
    }
}

impl Getter {
    pub fn trim() -> Self {
        map_string(|s| s.trim().to_string())
    }

    pub fn to_lower_case() -> Self {
        map_string(str::to_lowercase)
    }

    pub fn to_upper_case() -> Self {
        map_string(str::to_uppercase)
    }

    /// Upper-case the first character.
    pub fn capitalize() -> Self {
        map_string(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
    }

    /// Lower-case the first character.
    pub fn uncapitalize() -> Self {
        map_string(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        })
    }

    /// Split a string into an array of strings. The empty string splits
    /// into an empty array.
    pub fn split(separator: impl Into<String>) -> Self {
        let separator = separator.into();
        Self::transform_or_fail(move |value, _, _| {
            let s = expect_string(value)?;
            if s.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            Ok(Value::Array(
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ))
        })
    }

    /// Parse `a=1,b=2` into `{ "a": "1", "b": "2" }`. Pairs without a
    /// key/value separator are skipped.
    pub fn split_key_value(options: KeyValueOptions) -> Self {
        Self::transform_or_fail(move |value, _, _| {
            let s = expect_string(value)?;
            let entries = s
                .split(options.separator.as_str())
                .filter_map(|pair| pair.split_once(options.key_value_separator.as_str()))
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())));
            Ok(Value::Object(entries.collect()))
        })
    }

    /// Inverse of [`Getter::split_key_value`]. Values must be strings.
    pub fn join_key_value(options: KeyValueOptions) -> Self {
        Self::transform_or_fail(move |value, _, _| {
            let Value::Object(map) = value else {
                return Err(Issue::invalid_type("object", Some(value)));
            };
            let mut pairs = Vec::with_capacity(map.len());
            for (k, v) in map {
                let v = expect_string(v)?;
                pairs.push(format!("{k}{}{v}", options.key_value_separator));
            }
            Ok(Value::String(pairs.join(&options.separator)))
        })
    }
}

// ─── Encodings ───────────────────────────────────────────────────────

fn bytes_of(value: Value) -> Result<Vec<u8>, Issue> {
    match value {
        Value::Bytes(bytes) => Ok(bytes),
        Value::String(s) => Ok(s.into_bytes()),
        other => Err(Issue::invalid_type("Uint8Array | string", Some(other))),
    }
}

fn utf8(bytes: Vec<u8>, original: &str) -> Result<Value, Issue> {
    String::from_utf8(bytes).map(Value::String).map_err(|_| {
        Issue::invalid_value(
            Some(Value::String(original.to_string())),
            "decoded bytes are not valid UTF-8",
        )
    })
}

impl Getter {
    /// Bytes (or a string's UTF-8 bytes) to standard base64.
    pub fn encode_base64() -> Self {
        Self::transform_or_fail(|value, _, _| Ok(Value::String(BASE64.encode(bytes_of(value)?))))
    }

    /// Base64 to bytes.
    pub fn decode_base64() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let s = expect_string(value)?;
            BASE64
                .decode(s.as_bytes())
                .map(Value::Bytes)
                .map_err(|e| Issue::invalid_value(Some(Value::String(s)), format!("invalid base64: {e}")))
        })
    }

    /// Base64 to a UTF-8 string.
    pub fn decode_base64_string() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let s = expect_string(value)?;
            match BASE64.decode(s.as_bytes()) {
                Ok(bytes) => utf8(bytes, &s),
                Err(e) => Err(Issue::invalid_value(
                    Some(Value::String(s)),
                    format!("invalid base64: {e}"),
                )),
            }
        })
    }

    /// Bytes (or a string's UTF-8 bytes) to lowercase hex.
    pub fn encode_hex() -> Self {
        Self::transform_or_fail(|value, _, _| Ok(Value::String(hex::encode(bytes_of(value)?))))
    }

    /// Hex to bytes.
    pub fn decode_hex() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let s = expect_string(value)?;
            hex::decode(&s)
                .map(Value::Bytes)
                .map_err(|e| Issue::invalid_value(Some(Value::String(s)), format!("invalid hex: {e}")))
        })
    }

    /// Hex to a UTF-8 string.
    pub fn decode_hex_string() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let s = expect_string(value)?;
            match hex::decode(&s) {
                Ok(bytes) => utf8(bytes, &s),
                Err(e) => Err(Issue::invalid_value(
                    Some(Value::String(s)),
                    format!("invalid hex: {e}"),
                )),
            }
        })
    }

    /// Parse a JSON document into a value.
    pub fn parse_json() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let s = expect_string(value)?;
            serde_json::from_str::<serde_json::Value>(&s)
                .map(Value::from_json)
                .map_err(|e| Issue::invalid_value(Some(Value::String(s)), e.to_string()))
        })
    }

    /// Render a JSON-safe value as a compact JSON document.
    pub fn stringify_json() -> Self {
        Self::transform_or_fail(|value, _, _| {
            let json = value
                .to_json()
                .map_err(|e| Issue::invalid_value(Some(value.clone()), e.to_string()))?;
            serde_json::to_string(&json)
                .map(Value::String)
                .map_err(|e| Issue::invalid_value(Some(value), e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn run(getter: &Getter, input: Option<Value>) -> GetterResult {
        getter.run(input, &ParseOptions::default(), &Context::default())
    }

    fn s(text: &str) -> Option<Value> {
        Some(Value::from(text))
    }

    #[test]
    fn test_passthrough_is_identity() {
        let g = Getter::passthrough();
        assert_eq!(run(&g, s("x")).unwrap(), s("x"));
        assert_eq!(run(&g, None).unwrap(), None);
    }

    #[test]
    fn test_compose_absorbs_passthrough() {
        let g = Getter::trim();
        assert!(Getter::same(&Getter::passthrough().compose(&g), &g));
        assert!(Getter::same(&g.compose(&Getter::passthrough()), &g));
        assert!(Getter::passthrough()
            .compose(&Getter::passthrough())
            .is_passthrough());
    }

    #[test]
    fn test_compose_flattens() {
        let g = Getter::trim()
            .compose(&Getter::to_upper_case())
            .compose(&Getter::capitalize());
        assert_eq!(g.step_count(), 3);
        let nested = Getter::trim().compose(&Getter::to_upper_case().compose(&Getter::capitalize()));
        assert_eq!(nested.step_count(), 3);
        assert_eq!(run(&g, s("  ab ")).unwrap(), s("AB"));
    }

    #[test]
    fn test_compose_runs_left_to_right_and_stops_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let g = Getter::fail(|_| Issue::forbidden(None, "stop")).compose(&Getter::transform(
            move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                v
            },
        ));
        assert!(run(&g, s("x")).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_on_some_skips_absent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let g = Getter::on_some(move |v, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(v))
        });
        assert_eq!(run(&g, None).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(run(&g, s("a")).unwrap(), s("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_none_and_required() {
        let g = Getter::with_default(|| Value::Number(0.0));
        assert_eq!(run(&g, None).unwrap(), Some(Value::Number(0.0)));
        assert_eq!(run(&g, s("kept")).unwrap(), s("kept"));

        let required = Getter::required(Some("name is required".into()));
        let issue = run(&required, None).unwrap_err();
        assert_eq!(issue.to_string(), "name is required");
        assert_eq!(run(&required, s("n")).unwrap(), s("n"));
    }

    #[test]
    fn test_omit_and_transform_optional() {
        assert_eq!(run(&Getter::omit(), s("x")).unwrap(), None);
        assert_eq!(run(&Getter::omit(), None).unwrap(), None);

        let g = Getter::transform_optional(|input| match input {
            None => Some(Value::Null),
            Some(Value::Null) => None,
            other => other,
        });
        assert_eq!(run(&g, None).unwrap(), Some(Value::Null));
        assert_eq!(run(&g, Some(Value::Null)).unwrap(), None);
        assert_eq!(run(&g, s("v")).unwrap(), s("v"));
    }

    #[test]
    fn test_check_effect_shapes() {
        let positive = Getter::check_effect(|v, _, _| v.as_f64().map_or(false, |n| n > 0.0));
        assert_eq!(
            run(&positive, Some(Value::Number(2.0))).unwrap(),
            Some(Value::Number(2.0))
        );
        let issue = run(&positive, Some(Value::Number(-1.0))).unwrap_err();
        assert_eq!(issue.tag(), "InvalidValue");

        let message = Getter::check_effect(|v, _, _| {
            if v.as_str() == Some("") {
                Some("must not be empty".to_string())
            } else {
                None
            }
        });
        assert_eq!(
            run(&message, s("")).unwrap_err().to_string(),
            "must not be empty"
        );
        assert_eq!(run(&message, None).unwrap(), None);
    }

    #[test]
    fn test_check_effect_reads_context() {
        struct Limit(usize);
        let g = Getter::check_effect(|v, _, ctx| match ctx.require::<Limit>() {
            Ok(limit) => CheckResult::from(v.as_str().map_or(0, str::len) <= limit.0),
            Err(issue) => CheckResult::Issue(issue),
        });
        let ctx = Context::new().with(Limit(3));
        let options = ParseOptions::default();
        assert!(g.run(s("abc"), &options, &ctx).is_ok());
        assert!(g.run(s("abcd"), &options, &ctx).is_err());
        assert!(g.run(s("a"), &options, &Context::new()).is_err());
    }

    #[test]
    fn test_number_coercion() {
        let g = Getter::number();
        assert_eq!(run(&g, s(" 1.5 ")).unwrap(), Some(Value::Number(1.5)));
        assert_eq!(run(&g, s("-Infinity")).unwrap(), Some(Value::Number(f64::NEG_INFINITY)));
        assert_eq!(run(&g, Some(Value::Bool(true))).unwrap(), Some(Value::Number(1.0)));
        assert!(run(&g, s("abc")).is_err());
        assert!(run(&g, s("")).is_err());
        assert_eq!(run(&g, None).unwrap(), None);
    }

    #[test]
    fn test_string_coercion() {
        let g = Getter::string();
        assert_eq!(run(&g, Some(Value::Number(10.0))).unwrap(), s("10"));
        assert_eq!(run(&g, Some(Value::BigInt(-12))).unwrap(), s("-12"));
        assert_eq!(run(&g, Some(Value::Bool(false))).unwrap(), s("false"));
        assert!(run(&g, Some(Value::Array(vec![]))).is_err());
    }

    #[test]
    fn test_bigint_and_boolean_coercion() {
        let g = Getter::bigint();
        assert_eq!(run(&g, s("123")).unwrap(), Some(Value::BigInt(123)));
        assert_eq!(run(&g, Some(Value::Number(4.0))).unwrap(), Some(Value::BigInt(4)));
        assert!(run(&g, Some(Value::Number(4.5))).is_err());
        assert!(run(&g, s("1.0")).is_err());
        assert_eq!(run(&g, s(" +7 ")).unwrap(), Some(Value::BigInt(7)));
        assert!(run(&g, s("+-5")).is_err());
        assert!(run(&g, s("++5")).is_err());

        let b = Getter::boolean();
        assert_eq!(run(&b, s("")).unwrap(), Some(Value::Bool(false)));
        assert_eq!(run(&b, Some(Value::Number(3.0))).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn test_date_coercion() {
        let g = Getter::date();
        let decoded = run(&g, s("2024-01-02T03:04:05.000Z")).unwrap();
        let Some(Value::Date(d)) = decoded else {
            panic!("Expected a date");
        };
        assert_eq!(format_date(&d), "2024-01-02T03:04:05.000Z");
        assert_eq!(
            run(&g, Some(Value::Number(0.0))).unwrap(),
            Some(Value::Date(DateTime::<Utc>::from_timestamp_millis(0).unwrap()))
        );
        assert!(run(&g, s("yesterday")).is_err());
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(run(&Getter::capitalize(), s("hello")).unwrap(), s("Hello"));
        assert_eq!(run(&Getter::uncapitalize(), s("Hello")).unwrap(), s("hello"));
        assert_eq!(run(&Getter::to_lower_case(), s("AbC")).unwrap(), s("abc"));
        assert_eq!(run(&Getter::capitalize(), s("")).unwrap(), s(""));
    }

    #[test]
    fn test_split_and_key_values() {
        assert_eq!(
            run(&Getter::split(","), s("a,b")).unwrap(),
            Some(Value::Array(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(
            run(&Getter::split(","), s("")).unwrap(),
            Some(Value::Array(vec![]))
        );

        let parsed = run(&Getter::split_key_value(KeyValueOptions::default()), s("a=1,b,c=x=y"))
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            Value::object([("a", Value::from("1")), ("c", Value::from("x=y"))])
        );
        let joined = run(&Getter::join_key_value(KeyValueOptions::default()), Some(parsed)).unwrap();
        assert_eq!(joined, s("a=1,c=x=y"));
    }

    #[test]
    fn test_base64_and_hex() {
        let encoded = run(&Getter::encode_base64(), Some(Value::Bytes(vec![1, 2, 3]))).unwrap();
        assert_eq!(encoded, s("AQID"));
        assert_eq!(
            run(&Getter::decode_base64(), encoded).unwrap(),
            Some(Value::Bytes(vec![1, 2, 3]))
        );
        assert_eq!(run(&Getter::decode_base64_string(), s("aGk=")).unwrap(), s("hi"));
        assert!(run(&Getter::decode_base64(), s("%%%")).is_err());

        assert_eq!(run(&Getter::encode_hex(), s("hi")).unwrap(), s("6869"));
        assert_eq!(run(&Getter::decode_hex_string(), s("6869")).unwrap(), s("hi"));
        assert!(run(&Getter::decode_hex(), s("zz")).is_err());
    }

    #[test]
    fn test_json_parse_and_stringify() {
        let parsed = run(&Getter::parse_json(), s(r#"{"a":[1,true]}"#)).unwrap();
        assert_eq!(
            parsed,
            Some(Value::object([(
                "a",
                Value::Array(vec![Value::Number(1.0), Value::Bool(true)])
            )]))
        );
        assert_eq!(run(&Getter::stringify_json(), parsed).unwrap(), s(r#"{"a":[1,true]}"#));
        assert!(run(&Getter::parse_json(), s("{")).is_err());
        assert!(run(&Getter::stringify_json(), Some(Value::BigInt(1))).is_err());
    }
}
