//! Error taxonomy coverage: schema-level failures fire before any value is
//! touched, value-level failures name the offending field path, and the
//! first error always aborts the whole call.

use serde_json::json;
use treebind::{
    decode_value, decode_value_with, encode_value, CodecValue, ConstructorSpec, DecodeError,
    EncodeError, EnumSpec, Environment, ParamSpec, SchemaError, SchemaRegistry, TypeExpr, TypeSpec,
};

fn registry() -> SchemaRegistry {
    let mut reg = SchemaRegistry::new();
    reg.register_enum(EnumSpec::new("Color", vec!["Red", "Green", "Blue"]));
    reg.register(TypeSpec::new(
        "Point",
        ConstructorSpec::codec(vec![
            ParamSpec::field("x", TypeExpr::name("f64")),
            ParamSpec::field("y", TypeExpr::name("f64")),
        ]),
    ));
    reg.register(TypeSpec::new(
        "Outer",
        ConstructorSpec::codec(vec![
            ParamSpec::field("label", TypeExpr::name("String")),
            ParamSpec::field("origin", TypeExpr::name("Point")),
        ]),
    ));
    reg.register(TypeSpec::new(
        "Flags",
        ConstructorSpec::codec(vec![
            ParamSpec::field("enabled", TypeExpr::name("bool")),
            ParamSpec::field("initial", TypeExpr::name("char")),
        ]),
    ));
    reg.register(TypeSpec::new(
        "Narrow",
        ConstructorSpec::codec(vec![
            ParamSpec::field("small", TypeExpr::name("u8")),
            ParamSpec::field("exact", TypeExpr::name("f32")).nullable(),
            ParamSpec::field("whole", TypeExpr::name("i32")).nullable(),
            ParamSpec::field("unsigned", TypeExpr::name("u64")).nullable(),
        ]),
    ));
    reg.register(TypeSpec::new(
        "Painted",
        ConstructorSpec::codec(vec![ParamSpec::field("color", TypeExpr::name("Color"))]),
    ));
    reg.register(TypeSpec::new(
        "Session",
        ConstructorSpec::codec(vec![
            ParamSpec::field("id", TypeExpr::name("String")),
            ParamSpec::implicit("user", TypeExpr::name("String"), "session.user"),
        ]),
    ));
    reg.register(TypeSpec::new(
        "Range",
        ConstructorSpec::codec(vec![
            ParamSpec::field("lo", TypeExpr::name("i32")),
            ParamSpec::field("hi", TypeExpr::name("i32")),
        ])
        .with_guard(|fields| {
            let lo = fields.iter().find(|(n, _)| n == "lo").and_then(|(_, v)| v.as_i32());
            let hi = fields.iter().find(|(n, _)| n == "hi").and_then(|(_, v)| v.as_i32());
            match (lo, hi) {
                (Some(lo), Some(hi)) if lo <= hi => Ok(()),
                _ => Err("lo must not exceed hi".to_string()),
            }
        }),
    ));
    reg.register(TypeSpec::new(
        "Node",
        ConstructorSpec::codec(vec![
            ParamSpec::field("name", TypeExpr::name("String")),
            ParamSpec::field("children", TypeExpr::vec(TypeExpr::name("Node"))),
        ]),
    ));
    reg
}

// ── Schema-level failures ────────────────────────────────────────────────────

#[test]
fn unmarked_constructors_fail_fast_in_both_directions() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "Plain",
        ConstructorSpec::plain(vec![ParamSpec::field("x", TypeExpr::name("i32"))]),
    ));

    let value = CodecValue::struct_of("Plain", vec![("x", CodecValue::I32(1))]);
    assert_eq!(
        encode_value(&value, &reg),
        Err(EncodeError::Schema(SchemaError::NoCodecConstructor {
            type_name: "Plain".to_string(),
        }))
    );
    assert_eq!(
        decode_value(&json!({ "x": 1 }), "Plain", &reg),
        Err(DecodeError::Schema(SchemaError::NoCodecConstructor {
            type_name: "Plain".to_string(),
        }))
    );
}

#[test]
fn two_marked_constructors_are_ambiguous() {
    let mut reg = registry();
    reg.register(TypeSpec::with_constructors(
        "Torn",
        vec![
            ConstructorSpec::codec(vec![ParamSpec::field("a", TypeExpr::name("i32"))]),
            ConstructorSpec::codec(vec![ParamSpec::field("b", TypeExpr::name("i32"))]),
        ],
    ));
    assert_eq!(
        decode_value(&json!({}), "Torn", &reg),
        Err(DecodeError::Schema(SchemaError::AmbiguousCodecConstructor {
            type_name: "Torn".to_string(),
            count: 2,
        }))
    );
}

#[test]
fn untagged_parameter_is_a_schema_error() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "Loose",
        ConstructorSpec::codec(vec![
            ParamSpec::field("a", TypeExpr::name("i32")),
            ParamSpec::untagged("b", TypeExpr::name("i32")),
        ]),
    ));
    assert_eq!(
        encode_value(
            &CodecValue::struct_of("Loose", vec![("a", CodecValue::I32(1))]),
            &reg,
        ),
        Err(EncodeError::Schema(SchemaError::MissingFieldTag {
            type_name: "Loose".to_string(),
            param: "b".to_string(),
        }))
    );
}

#[test]
fn duplicate_tree_keys_fail_before_any_value_is_read() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "Twice",
        ConstructorSpec::codec(vec![
            ParamSpec::field("a", TypeExpr::name("i32")),
            ParamSpec::field("b", TypeExpr::name("i32")).with_alias("a"),
        ]),
    ));
    let expected = SchemaError::DuplicateField {
        type_name: "Twice".to_string(),
        key: "a".to_string(),
    };
    // Both directions, and even an empty struct/tree: the error is raised
    // during resolution, before the first field is processed.
    assert_eq!(
        encode_value(&CodecValue::struct_of::<&str, &str>("Twice", vec![]), &reg),
        Err(EncodeError::Schema(expected.clone()))
    );
    assert_eq!(
        decode_value(&json!({}), "Twice", &reg),
        Err(DecodeError::Schema(expected))
    );
}

#[test]
fn map_keys_must_be_text() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "BadMap",
        ConstructorSpec::codec(vec![ParamSpec::field(
            "m",
            TypeExpr::map(TypeExpr::name("i32"), TypeExpr::name("String")),
        )]),
    ));
    assert_eq!(
        decode_value(&json!({ "m": {} }), "BadMap", &reg),
        Err(DecodeError::Schema(SchemaError::NonStringMapKey {
            found: "i32".to_string(),
        }))
    );
}

#[test]
fn raw_parameterized_types_are_rejected() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "RawVec",
        ConstructorSpec::codec(vec![ParamSpec::field("items", TypeExpr::name("Vec"))]),
    ));
    assert_eq!(
        decode_value(&json!({ "items": [] }), "RawVec", &reg),
        Err(DecodeError::Schema(SchemaError::MissingTypeArguments {
            name: "Vec".to_string(),
            expected: 1,
            found: 0,
        }))
    );
}

#[test]
fn unknown_type_names_are_rejected() {
    let reg = registry();
    assert_eq!(
        decode_value(&json!({}), "Mystery", &reg),
        Err(DecodeError::Schema(SchemaError::UnsupportedType {
            name: "Mystery".to_string(),
        }))
    );
}

// ── Nullability ──────────────────────────────────────────────────────────────

#[test]
fn encoding_a_missing_non_nullable_field_fails() {
    let reg = registry();
    let value = CodecValue::struct_of("Point", vec![("x", CodecValue::F64(1.0))]);
    let err = encode_value(&value, &reg).unwrap_err();
    assert!(matches!(err, EncodeError::NonNullableNull { .. }));
    assert!(err.to_string().contains('y'));
}

#[test]
fn decoding_a_missing_non_nullable_field_fails() {
    let reg = registry();
    let err = decode_value(&json!({ "x": 1.0 }), "Point", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NonNullableNull { .. }));
    assert!(err.to_string().contains('y'));
}

#[test]
fn tree_null_is_the_same_as_absence_for_non_nullable_fields() {
    let reg = registry();
    let err = decode_value(&json!({ "x": 1.0, "y": null }), "Point", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NonNullableNull { .. }));
}

// ── Value-level mismatches ───────────────────────────────────────────────────

#[test]
fn mismatch_errors_carry_the_nested_path() {
    let reg = registry();
    let tree = json!({ "label": "origin", "origin": { "x": "not a number", "y": 0.0 } });
    let err = decode_value(&tree, "Outer", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    assert!(err.to_string().contains("origin.x"), "got: {}", err);
}

#[test]
fn mismatch_errors_carry_list_positions() {
    let reg = registry();
    let tree = json!({ "name": "root", "children": [{ "name": 7, "children": [] }] });
    let err = decode_value(&tree, "Node", &reg).unwrap_err();
    assert!(err.to_string().contains("children[0].name"), "got: {}", err);
}

#[test]
fn decoding_a_non_object_tree_fails() {
    let reg = registry();
    let err = decode_value(&json!([1, 2, 3]), "Point", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::TypeMismatch { .. }));
}

#[test]
fn booleans_do_not_accept_numbers() {
    let reg = registry();
    let err = decode_value(&json!({ "enabled": 1, "initial": "a" }), "Flags", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedNumericTarget { .. }));
}

#[test]
fn characters_only_accept_single_length_text() {
    let reg = registry();
    let err = decode_value(&json!({ "enabled": true, "initial": "ab" }), "Flags", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    assert!(err.to_string().contains("length 2"));

    let err = decode_value(&json!({ "enabled": true, "initial": 7 }), "Flags", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedNumericTarget { .. }));
}

// ── Numeric range policy ─────────────────────────────────────────────────────

#[test]
fn out_of_range_numbers_are_rejected() {
    let reg = registry();
    let err = decode_value(&json!({ "small": 256 }), "Narrow", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NumberOutOfRange { .. }));
    assert!(err.to_string().contains("u8"));
}

#[test]
fn negative_numbers_do_not_fit_unsigned_targets() {
    let reg = registry();
    let err = decode_value(&json!({ "small": 0, "unsigned": -1 }), "Narrow", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NumberOutOfRange { .. }));
}

#[test]
fn fractional_numbers_do_not_fit_integer_targets() {
    let reg = registry();
    let err = decode_value(&json!({ "small": 0, "whole": 3.5 }), "Narrow", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NumberOutOfRange { .. }));
}

#[test]
fn doubles_beyond_f32_precision_are_rejected() {
    let reg = registry();
    let err = decode_value(&json!({ "small": 0, "exact": 1.0e300 }), "Narrow", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::NumberOutOfRange { .. }));
}

// ── Enumerations ─────────────────────────────────────────────────────────────

#[test]
fn unknown_enum_constants_are_rejected() {
    let reg = registry();
    let err = decode_value(&json!({ "color": "Purple" }), "Painted", &reg).unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnknownEnumValue {
            path: treebind::TreePath::root().field("color"),
            ty: "Color".to_string(),
            variant: "Purple".to_string(),
        }
    );
}

#[test]
fn enum_lookup_is_case_sensitive() {
    let reg = registry();
    let err = decode_value(&json!({ "color": "red" }), "Painted", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownEnumValue { .. }));
}

// ── Implicit fields ──────────────────────────────────────────────────────────

#[test]
fn missing_implicit_value_fails() {
    let reg = registry();
    let err = decode_value(&json!({ "id": "abc" }), "Session", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::MissingImplicitValue { .. }));
    assert!(err.to_string().contains("session.user"));
}

#[test]
fn missing_implicit_key_fails_even_with_an_environment() {
    let reg = registry();
    let env = Environment::new().with("unrelated", CodecValue::from("x"));
    let err = decode_value_with(&json!({ "id": "abc" }), "Session", &reg, &env).unwrap_err();
    assert!(matches!(err, DecodeError::MissingImplicitValue { .. }));
}

#[test]
fn wrong_kind_implicit_value_fails() {
    let reg = registry();
    let env = Environment::new().with("session.user", CodecValue::I32(7));
    let err = decode_value_with(&json!({ "id": "abc" }), "Session", &reg, &env).unwrap_err();
    assert_eq!(
        err,
        DecodeError::ImplicitTypeMismatch {
            path: treebind::TreePath::root().field("user"),
            key: "session.user".to_string(),
            expected: "text".to_string(),
            found: "i32".to_string(),
        }
    );
}

// ── Construction guards ──────────────────────────────────────────────────────

#[test]
fn guard_rejection_surfaces_as_construction_failure() {
    let reg = registry();
    let err = decode_value(&json!({ "lo": 9, "hi": 3 }), "Range", &reg).unwrap_err();
    assert_eq!(
        err,
        DecodeError::ConstructionFailed {
            ty: "Range".to_string(),
            reason: "lo must not exceed hi".to_string(),
        }
    );
}

#[test]
fn guard_acceptance_builds_the_instance() {
    let reg = registry();
    let back = decode_value(&json!({ "lo": 3, "hi": 9 }), "Range", &reg).unwrap();
    assert_eq!(back.field("lo"), Some(&CodecValue::I32(3)));
    assert_eq!(back.field("hi"), Some(&CodecValue::I32(9)));
}

// ── Encoder-specific failures ────────────────────────────────────────────────

#[test]
fn top_level_value_must_be_a_struct() {
    let reg = registry();
    let err = encode_value(&CodecValue::I32(7), &reg).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedType { .. }));
}

#[test]
fn mismatched_value_kind_fails_encode() {
    let reg = registry();
    let value = CodecValue::struct_of(
        "Point",
        vec![("x", CodecValue::from("east")), ("y", CodecValue::F64(0.0))],
    );
    let err = encode_value(&value, &reg).unwrap_err();
    assert!(matches!(err, EncodeError::TypeMismatch { .. }));
    assert!(err.to_string().contains('x'));
}

#[test]
fn non_finite_floats_cannot_be_encoded() {
    let reg = registry();
    let value = CodecValue::struct_of(
        "Point",
        vec![("x", CodecValue::F64(f64::NAN)), ("y", CodecValue::F64(0.0))],
    );
    let err = encode_value(&value, &reg).unwrap_err();
    assert!(matches!(err, EncodeError::NonFiniteNumber { .. }));
}

#[test]
fn structurally_duplicated_map_keys_are_caught() {
    let mut reg = registry();
    reg.register(TypeSpec::new(
        "Keyed",
        ConstructorSpec::codec(vec![ParamSpec::field(
            "m",
            TypeExpr::map(TypeExpr::name("String"), TypeExpr::name("i64")),
        )]),
    ));
    let value = CodecValue::struct_of(
        "Keyed",
        vec![(
            "m",
            CodecValue::Map(vec![
                ("k".to_string(), CodecValue::I64(1)),
                ("k".to_string(), CodecValue::I64(2)),
            ]),
        )],
    );
    let err = encode_value(&value, &reg).unwrap_err();
    assert_eq!(
        err,
        EncodeError::DuplicateKey {
            path: treebind::TreePath::root().field("m"),
            key: "k".to_string(),
        }
    );
}

#[test]
fn unknown_enum_constant_fails_encode() {
    let reg = registry();
    let value = CodecValue::struct_of(
        "Painted",
        vec![("color", CodecValue::enum_of("Color", "Purple"))],
    );
    let err = encode_value(&value, &reg).unwrap_err();
    assert!(matches!(err, EncodeError::TypeMismatch { .. }));
}

// ── Depth guard ──────────────────────────────────────────────────────────────

fn node(name: &str, children: Vec<CodecValue>) -> CodecValue {
    CodecValue::struct_of(
        "Node",
        vec![
            ("name", CodecValue::from(name)),
            ("children", CodecValue::List(children)),
        ],
    )
}

#[test]
fn deep_object_graphs_hit_the_depth_limit_on_encode() {
    let reg = registry();
    let mut value = node("leaf", vec![]);
    for _ in 0..200 {
        value = node("level", vec![value]);
    }
    let err = encode_value(&value, &reg).unwrap_err();
    assert!(matches!(err, EncodeError::DepthLimitExceeded { .. }));
}

#[test]
fn deep_trees_hit_the_depth_limit_on_decode() {
    let reg = registry();
    let mut tree = json!({ "name": "leaf", "children": [] });
    for _ in 0..200 {
        tree = json!({ "name": "level", "children": [tree] });
    }
    let err = decode_value(&tree, "Node", &reg).unwrap_err();
    assert!(matches!(err, DecodeError::DepthLimitExceeded { .. }));
}

#[test]
fn shallow_recursive_types_still_roundtrip() {
    let reg = registry();
    let value = node("root", vec![node("a", vec![node("b", vec![])]), node("c", vec![])]);
    let tree = encode_value(&value, &reg).unwrap();
    assert_eq!(decode_value(&tree, "Node", &reg).unwrap(), value);
}
