//! Encoder — walks a type's metadata model and renders a [`CodecValue`]
//! struct into a JSON tree.

use serde_json::{Map, Number, Value};

use crate::path::TreePath;
use crate::registry::SchemaRegistry;
use crate::schema::SchemaError;
use crate::shape::{ScalarKind, Shape};
use crate::value::CodecValue;
use crate::MAX_DEPTH;

/// Errors raised while encoding an object into a tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("non-nullable field '{path}' holds no value")]
    NonNullableNull { path: TreePath },
    #[error("type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        path: TreePath,
        expected: String,
        found: String,
    },
    #[error("cannot encode value of kind '{found}' at '{path}'")]
    UnsupportedType { path: TreePath, found: String },
    #[error("float at '{path}' is not finite")]
    NonFiniteNumber { path: TreePath },
    #[error("duplicate map key '{key}' at '{path}'")]
    DuplicateKey { path: TreePath, key: String },
    #[error("nesting depth limit exceeded at '{path}'")]
    DepthLimitExceeded { path: TreePath },
}

/// Encode a struct value into a JSON tree.
///
/// The value must be a [`CodecValue::Struct`] of a registered type. Fields
/// are processed in metadata-model order; the first error aborts the call.
pub fn encode_value(value: &CodecValue, registry: &SchemaRegistry) -> Result<Value, EncodeError> {
    let path = TreePath::root();
    match value {
        CodecValue::Struct { ty, fields } => encode_struct(ty, fields, registry, &path, 0),
        other => Err(EncodeError::UnsupportedType {
            path,
            found: other.kind().to_string(),
        }),
    }
}

fn encode_struct(
    ty: &str,
    fields: &[(String, CodecValue)],
    registry: &SchemaRegistry,
    path: &TreePath,
    depth: usize,
) -> Result<Value, EncodeError> {
    if depth > MAX_DEPTH {
        return Err(EncodeError::DepthLimitExceeded { path: path.clone() });
    }
    let schema = registry.resolve(ty)?;
    let mut out = Map::new();

    for descriptor in &schema.fields {
        // Implicit fields never appear in the tree.
        if descriptor.implicit.is_some() {
            continue;
        }
        let field_path = path.field(&descriptor.name);
        let value = fields
            .iter()
            .find(|(name, _)| *name == descriptor.name)
            .map(|(_, v)| v)
            .unwrap_or(&CodecValue::Null);

        if matches!(value, CodecValue::Null) {
            if descriptor.nullable {
                // Absence, not a null entry.
                continue;
            }
            return Err(EncodeError::NonNullableNull { path: field_path });
        }

        if let Some(encoded) =
            encode_field(value, &descriptor.shape, registry, &field_path, depth + 1)?
        {
            out.insert(descriptor.key.clone(), encoded);
        }
    }

    Ok(Value::Object(out))
}

/// Encode one value against its declared shape. Returns `None` for absent
/// values (empty optionals, nulls), which field-level callers omit, list
/// callers render as tree nulls and map callers drop.
fn encode_field(
    value: &CodecValue,
    shape: &Shape,
    registry: &SchemaRegistry,
    path: &TreePath,
    depth: usize,
) -> Result<Option<Value>, EncodeError> {
    if depth > MAX_DEPTH {
        return Err(EncodeError::DepthLimitExceeded { path: path.clone() });
    }
    if matches!(value, CodecValue::Null) {
        return Ok(None);
    }
    match shape {
        Shape::Scalar(kind) => encode_scalar(value, *kind, path).map(Some),
        Shape::Text => match value {
            CodecValue::Str(s) => Ok(Some(Value::String(s.clone()))),
            other => Err(mismatch(path, "text", other)),
        },
        Shape::Enum(name) => match value {
            CodecValue::Enum { ty, variant } if ty == name => {
                let spec = registry
                    .enum_spec(name)
                    .ok_or_else(|| SchemaError::UnsupportedType { name: name.clone() })?;
                if !spec.has_variant(variant) {
                    return Err(EncodeError::TypeMismatch {
                        path: path.clone(),
                        expected: format!("constant of enum '{}'", name),
                        found: format!("'{}'", variant),
                    });
                }
                Ok(Some(Value::String(variant.clone())))
            }
            other => Err(mismatch(path, &format!("enum '{}'", name), other)),
        },
        Shape::Optional(inner) => match value {
            CodecValue::Opt(None) => Ok(None),
            CodecValue::Opt(Some(boxed)) => encode_field(boxed, inner, registry, path, depth + 1),
            other => Err(mismatch(path, "optional", other)),
        },
        Shape::Array(element) => match value {
            CodecValue::Array(items) => {
                encode_elements(items, element, registry, path, depth).map(Some)
            }
            other => Err(mismatch(path, "array", other)),
        },
        Shape::Ordered(element) => match value {
            CodecValue::List(items) => {
                encode_elements(items, element, registry, path, depth).map(Some)
            }
            other => Err(mismatch(path, "list", other)),
        },
        Shape::Unordered(element) => match value {
            CodecValue::Set(items) => {
                encode_elements(items, element, registry, path, depth).map(Some)
            }
            other => Err(mismatch(path, "set", other)),
        },
        Shape::Map(value_shape) => match value {
            CodecValue::Map(pairs) => {
                let mut out = Map::new();
                for (key, entry) in pairs {
                    // Structurally impossible for a well-formed map value;
                    // checked because the dynamic model cannot enforce it.
                    if out.contains_key(key) {
                        return Err(EncodeError::DuplicateKey {
                            path: path.clone(),
                            key: key.clone(),
                        });
                    }
                    let entry_path = path.key(key);
                    if let Some(encoded) =
                        encode_field(entry, value_shape, registry, &entry_path, depth + 1)?
                    {
                        out.insert(key.clone(), encoded);
                    }
                }
                Ok(Some(Value::Object(out)))
            }
            other => Err(mismatch(path, "map", other)),
        },
        Shape::Nested(name) => match value {
            CodecValue::Struct { ty, fields } if ty == name => {
                encode_struct(ty, fields, registry, path, depth + 1).map(Some)
            }
            other => Err(mismatch(path, &format!("struct '{}'", name), other)),
        },
    }
}

fn encode_elements(
    items: &[CodecValue],
    element: &Shape,
    registry: &SchemaRegistry,
    path: &TreePath,
    depth: usize,
) -> Result<Value, EncodeError> {
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = path.index(index);
        // Absent elements are permitted mid-list and render as tree nulls.
        match encode_field(item, element, registry, &item_path, depth + 1)? {
            Some(encoded) => out.push(encoded),
            None => out.push(Value::Null),
        }
    }
    Ok(Value::Array(out))
}

fn encode_scalar(
    value: &CodecValue,
    kind: ScalarKind,
    path: &TreePath,
) -> Result<Value, EncodeError> {
    let out = match (kind, value) {
        (ScalarKind::Bool, CodecValue::Bool(b)) => Value::Bool(*b),
        // Characters are carried as one-character text.
        (ScalarKind::Char, CodecValue::Char(c)) => Value::String(c.to_string()),
        (ScalarKind::I8, CodecValue::I8(i)) => Value::Number((*i).into()),
        (ScalarKind::I16, CodecValue::I16(i)) => Value::Number((*i).into()),
        (ScalarKind::I32, CodecValue::I32(i)) => Value::Number((*i).into()),
        (ScalarKind::I64, CodecValue::I64(i)) => Value::Number((*i).into()),
        (ScalarKind::U8, CodecValue::U8(u)) => Value::Number((*u).into()),
        (ScalarKind::U16, CodecValue::U16(u)) => Value::Number((*u).into()),
        (ScalarKind::U32, CodecValue::U32(u)) => Value::Number((*u).into()),
        (ScalarKind::U64, CodecValue::U64(u)) => Value::Number((*u).into()),
        (ScalarKind::F32, CodecValue::F32(f)) => float_number(f64::from(*f), path)?,
        (ScalarKind::F64, CodecValue::F64(f)) => float_number(*f, path)?,
        (_, other) => return Err(mismatch(path, kind.as_str(), other)),
    };
    Ok(out)
}

fn float_number(f: f64, path: &TreePath) -> Result<Value, EncodeError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EncodeError::NonFiniteNumber { path: path.clone() })
}

fn mismatch(path: &TreePath, expected: &str, found: &CodecValue) -> EncodeError {
    EncodeError::TypeMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}
