//! Decoder — the mirror image of the encoder: walks a type's metadata model
//! and reconstructs a [`CodecValue`] struct from a JSON tree, injecting
//! implicit values from the caller's environment.

use serde_json::Value;

use crate::env::Environment;
use crate::path::TreePath;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaError;
use crate::shape::{ScalarKind, Shape};
use crate::value::CodecValue;
use crate::MAX_DEPTH;

/// Errors raised while decoding a tree into an object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("non-nullable field '{path}' has no value in the input tree")]
    NonNullableNull { path: TreePath },
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: TreePath,
        expected: String,
        found: String,
    },
    #[error("tree number at '{path}' cannot target scalar kind '{target}'")]
    UnsupportedNumericTarget { path: TreePath, target: String },
    #[error("number {value} at '{path}' does not fit in {target}")]
    NumberOutOfRange {
        path: TreePath,
        target: String,
        value: String,
    },
    #[error("unknown constant '{variant}' for enum '{ty}' at '{path}'")]
    UnknownEnumValue {
        path: TreePath,
        ty: String,
        variant: String,
    },
    #[error("missing value for implicit field '{key}' at '{path}'")]
    MissingImplicitValue { path: TreePath, key: String },
    #[error("wrong kind for implicit field '{key}' at '{path}': expected {expected}, got {found}")]
    ImplicitTypeMismatch {
        path: TreePath,
        key: String,
        expected: String,
        found: String,
    },
    #[error("constructor for type '{ty}' rejected decoded values: {reason}")]
    ConstructionFailed { ty: String, reason: String },
    #[error("nesting depth limit exceeded at '{path}'")]
    DepthLimitExceeded { path: TreePath },
}

/// Decode a JSON tree into a struct value of the named type, without an
/// environment. Implicit fields, if any, fail with `MissingImplicitValue`.
pub fn decode_value(
    tree: &Value,
    ty: &str,
    registry: &SchemaRegistry,
) -> Result<CodecValue, DecodeError> {
    decode_struct(tree, ty, registry, None, &TreePath::root(), 0)
}

/// Decode a JSON tree into a struct value of the named type, drawing
/// implicit-field values from `environment`.
pub fn decode_value_with(
    tree: &Value,
    ty: &str,
    registry: &SchemaRegistry,
    environment: &Environment,
) -> Result<CodecValue, DecodeError> {
    decode_struct(tree, ty, registry, Some(environment), &TreePath::root(), 0)
}

fn decode_struct(
    tree: &Value,
    ty: &str,
    registry: &SchemaRegistry,
    environment: Option<&Environment>,
    path: &TreePath,
    depth: usize,
) -> Result<CodecValue, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthLimitExceeded { path: path.clone() });
    }
    let schema = registry.resolve(ty)?;
    let object = match tree {
        Value::Object(object) => object,
        other => {
            return Err(DecodeError::TypeMismatch {
                path: path.clone(),
                expected: format!("object for type '{}'", ty),
                found: json_kind(other).to_string(),
            })
        }
    };

    // Positional arguments for the codec constructor, in parameter order.
    let mut arguments = Vec::with_capacity(schema.fields.len());
    for descriptor in &schema.fields {
        let field_path = path.field(&descriptor.name);

        if let Some(env_key) = &descriptor.implicit {
            let supplied = environment.and_then(|env| env.get(env_key)).ok_or_else(|| {
                DecodeError::MissingImplicitValue {
                    path: field_path.clone(),
                    key: env_key.clone(),
                }
            })?;
            if !value_fits_shape(supplied, &descriptor.shape) {
                return Err(DecodeError::ImplicitTypeMismatch {
                    path: field_path,
                    key: env_key.clone(),
                    expected: descriptor.shape.kind().to_string(),
                    found: supplied.kind().to_string(),
                });
            }
            arguments.push((descriptor.name.clone(), supplied.clone()));
            continue;
        }

        // Absence in the tree is the null sentinel.
        let node = object.get(&descriptor.key).unwrap_or(&Value::Null);
        let value = decode_field(
            node,
            &descriptor.shape,
            descriptor.nullable,
            registry,
            environment,
            &field_path,
            depth + 1,
        )?;
        arguments.push((descriptor.name.clone(), value));
    }

    if let Some(guard) = &schema.guard {
        guard(&arguments).map_err(|reason| DecodeError::ConstructionFailed {
            ty: ty.to_string(),
            reason,
        })?;
    }

    Ok(CodecValue::Struct {
        ty: ty.to_string(),
        fields: arguments,
    })
}

fn decode_field(
    node: &Value,
    shape: &Shape,
    nullable: bool,
    registry: &SchemaRegistry,
    environment: Option<&Environment>,
    path: &TreePath,
    depth: usize,
) -> Result<CodecValue, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthLimitExceeded { path: path.clone() });
    }

    // Optionals absorb absence before the nullability contract applies.
    if let Shape::Optional(inner) = shape {
        if node.is_null() {
            return Ok(CodecValue::Opt(None));
        }
        let value = decode_field(node, inner, true, registry, environment, path, depth + 1)?;
        return Ok(CodecValue::Opt(Some(Box::new(value))));
    }

    if node.is_null() {
        if nullable {
            return Ok(CodecValue::Null);
        }
        return Err(DecodeError::NonNullableNull { path: path.clone() });
    }

    match shape {
        Shape::Optional(_) => unreachable!("handled above"),
        Shape::Scalar(kind) => decode_scalar(node, *kind, path),
        Shape::Text => match node {
            Value::String(s) => Ok(CodecValue::Str(s.clone())),
            other => Err(mismatch(path, "text", other)),
        },
        Shape::Enum(name) => match node {
            Value::String(s) => {
                let spec = registry
                    .enum_spec(name)
                    .ok_or_else(|| SchemaError::UnsupportedType { name: name.clone() })?;
                // Exact, case-sensitive constant lookup.
                if !spec.has_variant(s) {
                    return Err(DecodeError::UnknownEnumValue {
                        path: path.clone(),
                        ty: name.clone(),
                        variant: s.clone(),
                    });
                }
                Ok(CodecValue::Enum {
                    ty: name.clone(),
                    variant: s.clone(),
                })
            }
            other => Err(mismatch(path, &format!("enum '{}'", name), other)),
        },
        Shape::Array(element) => {
            let items = decode_elements(node, element, registry, environment, path, depth)?;
            Ok(CodecValue::Array(items))
        }
        Shape::Ordered(element) => {
            let items = decode_elements(node, element, registry, environment, path, depth)?;
            Ok(CodecValue::List(items))
        }
        Shape::Unordered(element) => {
            let items = decode_elements(node, element, registry, environment, path, depth)?;
            // Set semantics: equal elements collapse to the first occurrence.
            let mut unique = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Ok(CodecValue::Set(unique))
        }
        Shape::Map(value_shape) => match node {
            Value::Object(object) => {
                let mut pairs = Vec::with_capacity(object.len());
                for (key, entry) in object {
                    let entry_path = path.key(key);
                    let value = decode_field(
                        entry,
                        value_shape,
                        true,
                        registry,
                        environment,
                        &entry_path,
                        depth + 1,
                    )?;
                    pairs.push((key.clone(), value));
                }
                Ok(CodecValue::Map(pairs))
            }
            other => Err(mismatch(path, "map", other)),
        },
        Shape::Nested(name) => match node {
            Value::Object(_) => decode_struct(node, name, registry, environment, path, depth + 1),
            other => Err(mismatch(path, &format!("struct '{}'", name), other)),
        },
    }
}

fn decode_elements(
    node: &Value,
    element: &Shape,
    registry: &SchemaRegistry,
    environment: Option<&Environment>,
    path: &TreePath,
    depth: usize,
) -> Result<Vec<CodecValue>, DecodeError> {
    let items = match node {
        Value::Array(items) => items,
        other => return Err(mismatch(path, "list", other)),
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = path.index(index);
        out.push(decode_field(
            item,
            element,
            true,
            registry,
            environment,
            &item_path,
            depth + 1,
        )?);
    }
    Ok(out)
}

fn decode_scalar(node: &Value, kind: ScalarKind, path: &TreePath) -> Result<CodecValue, DecodeError> {
    match node {
        Value::Bool(b) => {
            if kind == ScalarKind::Bool {
                Ok(CodecValue::Bool(*b))
            } else {
                Err(mismatch(path, kind.as_str(), node))
            }
        }
        Value::String(s) => {
            // One-character text unwraps to a character.
            if kind == ScalarKind::Char {
                let mut chars = s.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    return Ok(CodecValue::Char(c));
                }
                return Err(DecodeError::TypeMismatch {
                    path: path.clone(),
                    expected: "char".to_string(),
                    found: format!("text of length {}", s.chars().count()),
                });
            }
            Err(mismatch(path, kind.as_str(), node))
        }
        Value::Number(number) => {
            if !kind.is_numeric() {
                return Err(DecodeError::UnsupportedNumericTarget {
                    path: path.clone(),
                    target: kind.as_str().to_string(),
                });
            }
            coerce_number(number, kind, path)
        }
        other => Err(mismatch(path, kind.as_str(), other)),
    }
}

/// The numeric coercion table: value-preserving conversion from the tree's
/// number to the exact target kind. Conversions never go through text; a
/// value the target cannot represent exactly is rejected.
fn coerce_number(
    number: &serde_json::Number,
    kind: ScalarKind,
    path: &TreePath,
) -> Result<CodecValue, DecodeError> {
    let out_of_range = || DecodeError::NumberOutOfRange {
        path: path.clone(),
        target: kind.as_str().to_string(),
        value: number.to_string(),
    };

    // Integer-valued trees unify through i128; float-valued trees must
    // convert back without loss.
    let integer: Option<i128> = if let Some(i) = number.as_i64() {
        Some(i128::from(i))
    } else if let Some(u) = number.as_u64() {
        Some(i128::from(u))
    } else {
        None
    };

    match kind {
        ScalarKind::F64 => {
            let f = number.as_f64().ok_or_else(out_of_range)?;
            Ok(CodecValue::F64(f))
        }
        ScalarKind::F32 => {
            let f = number.as_f64().ok_or_else(out_of_range)?;
            let narrowed = f as f32;
            if f64::from(narrowed) != f {
                return Err(out_of_range());
            }
            Ok(CodecValue::F32(narrowed))
        }
        _ => {
            let i = match integer {
                Some(i) => i,
                None => {
                    let f = number.as_f64().ok_or_else(out_of_range)?;
                    if f.fract() != 0.0 || f < i128::MIN as f64 || f > i128::MAX as f64 {
                        return Err(out_of_range());
                    }
                    f as i128
                }
            };
            integer_to_kind(i, kind).ok_or_else(out_of_range)
        }
    }
}

fn integer_to_kind(i: i128, kind: ScalarKind) -> Option<CodecValue> {
    Some(match kind {
        ScalarKind::I8 => CodecValue::I8(i8::try_from(i).ok()?),
        ScalarKind::I16 => CodecValue::I16(i16::try_from(i).ok()?),
        ScalarKind::I32 => CodecValue::I32(i32::try_from(i).ok()?),
        ScalarKind::I64 => CodecValue::I64(i64::try_from(i).ok()?),
        ScalarKind::U8 => CodecValue::U8(u8::try_from(i).ok()?),
        ScalarKind::U16 => CodecValue::U16(u16::try_from(i).ok()?),
        ScalarKind::U32 => CodecValue::U32(u32::try_from(i).ok()?),
        ScalarKind::U64 => CodecValue::U64(u64::try_from(i).ok()?),
        _ => return None,
    })
}

/// Shallow kind check for implicit values: the supplied value's category
/// must match the declared shape. Container elements are not inspected.
fn value_fits_shape(value: &CodecValue, shape: &Shape) -> bool {
    match (shape, value) {
        (Shape::Scalar(ScalarKind::Bool), CodecValue::Bool(_)) => true,
        (Shape::Scalar(ScalarKind::Char), CodecValue::Char(_)) => true,
        (Shape::Scalar(ScalarKind::I8), CodecValue::I8(_)) => true,
        (Shape::Scalar(ScalarKind::I16), CodecValue::I16(_)) => true,
        (Shape::Scalar(ScalarKind::I32), CodecValue::I32(_)) => true,
        (Shape::Scalar(ScalarKind::I64), CodecValue::I64(_)) => true,
        (Shape::Scalar(ScalarKind::U8), CodecValue::U8(_)) => true,
        (Shape::Scalar(ScalarKind::U16), CodecValue::U16(_)) => true,
        (Shape::Scalar(ScalarKind::U32), CodecValue::U32(_)) => true,
        (Shape::Scalar(ScalarKind::U64), CodecValue::U64(_)) => true,
        (Shape::Scalar(ScalarKind::F32), CodecValue::F32(_)) => true,
        (Shape::Scalar(ScalarKind::F64), CodecValue::F64(_)) => true,
        (Shape::Text, CodecValue::Str(_)) => true,
        (Shape::Enum(name), CodecValue::Enum { ty, .. }) => ty == name,
        (Shape::Optional(inner), CodecValue::Opt(value)) => value
            .as_deref()
            .map(|v| value_fits_shape(v, inner))
            .unwrap_or(true),
        (Shape::Array(_), CodecValue::Array(_)) => true,
        (Shape::Ordered(_), CodecValue::List(_)) => true,
        (Shape::Unordered(_), CodecValue::Set(_)) => true,
        (Shape::Map(_), CodecValue::Map(_)) => true,
        (Shape::Nested(name), CodecValue::Struct { ty, .. }) => ty == name,
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &TreePath, expected: &str, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        found: json_kind(found).to_string(),
    }
}
