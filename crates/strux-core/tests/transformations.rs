//! # Transformation Chain Tests
//!
//! Built-in transformations exercised through the public API only: composed
//! chains, flipped directions, and the documented lossy encodes.

use strux_core::{Context, Getter, KeyValueOptions, ParseOptions, Transformation, Value};

fn decode(t: &Transformation, input: Value) -> Option<Value> {
    t.decode()
        .run(Some(input), &ParseOptions::default(), &Context::default())
        .expect("decode should succeed")
}

fn encode(t: &Transformation, input: Value) -> Option<Value> {
    t.encode()
        .run(Some(input), &ParseOptions::default(), &Context::default())
        .expect("encode should succeed")
}

#[test]
fn composed_chain_decodes_outside_in() {
    let chain = Transformation::bytes_from_hex().compose(&Transformation::trim());
    assert_eq!(chain.name(), Some("trim -> bytesFromHex"));

    assert_eq!(
        decode(&chain, Value::from("  68656c6c6f ")),
        Some(Value::Bytes(b"hello".to_vec()))
    );
    assert_eq!(
        encode(&chain, Value::Bytes(b"hello".to_vec())),
        Some(Value::from("68656c6c6f"))
    );
}

#[test]
fn flip_swaps_directions() {
    let t = Transformation::number_from_string().flip();
    assert_eq!(decode(&t, Value::Number(0.1)), Some(Value::from("0.1")));
    assert_eq!(encode(&t, Value::from("0.1")), Some(Value::Number(0.1)));
    assert!(Getter::same(t.flip().flip().decode(), t.decode()));
}

#[test]
fn unknown_from_json_string_round_trips_documents() {
    let t = Transformation::unknown_from_json_string();
    let decoded = decode(&t, Value::from(r#"{"a":[1,true,null]}"#)).expect("present");
    assert_eq!(
        decoded,
        Value::object([(
            "a",
            Value::Array(vec![Value::Number(1.0), Value::Bool(true), Value::Null])
        )])
    );
    assert_eq!(encode(&t, decoded), Some(Value::from(r#"{"a":[1,true,null]}"#)));

    let err = t
        .encode()
        .run(
            Some(Value::BigInt(1)),
            &ParseOptions::default(),
            &Context::default(),
        )
        .unwrap_err();
    assert_eq!(err.tag(), "InvalidValue");
}

#[test]
fn case_conversions_are_lossy_on_encode() {
    for t in [
        Transformation::to_lower_case(),
        Transformation::to_upper_case(),
        Transformation::capitalize(),
        Transformation::uncapitalize(),
    ] {
        assert!(t.encode().is_passthrough(), "{t:?}");
        assert_eq!(encode(&t, Value::from("mIxEd")), Some(Value::from("mIxEd")));
    }
    assert_eq!(
        decode(&Transformation::capitalize(), Value::from("ada")),
        Some(Value::from("Ada"))
    );
}

#[test]
fn key_value_pairs_use_custom_separators() {
    let options = KeyValueOptions {
        separator: ";".to_string(),
        key_value_separator: ":".to_string(),
    };
    let t = Transformation::split_key_value(options);
    let decoded = decode(&t, Value::from("a:1;b:2")).expect("present");
    assert_eq!(
        decoded,
        Value::object([("a", Value::from("1")), ("b", Value::from("2"))])
    );
    assert_eq!(encode(&t, decoded), Some(Value::from("a:1;b:2")));
}

#[test]
fn absent_input_passes_through_every_builtin() {
    let builtins = [
        Transformation::number_from_string(),
        Transformation::bigint_from_string(),
        Transformation::date_from_string(),
        Transformation::unknown_from_json_string(),
        Transformation::bytes_from_base64(),
        Transformation::bytes_from_hex(),
    ];
    for t in builtins {
        let options = ParseOptions::default();
        let ctx = Context::default();
        assert_eq!(t.decode().run(None, &options, &ctx).expect("decode"), None);
        assert_eq!(t.encode().run(None, &options, &ctx).expect("encode"), None);
    }
}
