//! Typed entry points — the thin bridge between concrete Rust types and the
//! value-level engine.

use serde_json::Value;

use crate::decoder::{decode_value, decode_value_with, DecodeError};
use crate::encoder::{encode_value, EncodeError};
use crate::env::Environment;
use crate::registry::SchemaRegistry;
use crate::value::CodecValue;

/// Implemented by application types that opt into the codec.
///
/// `NAME` must match a [`crate::schema::TypeSpec`] registered with the
/// registry passed to [`encode`]/[`decode`]; `to_value` and `from_value`
/// reflect the object through the dynamic value model in the same field
/// order as the registered codec constructor.
pub trait TreeBind: Sized {
    /// Registered schema name for this type.
    const NAME: &'static str;

    /// Reflect the object into the dynamic value model.
    fn to_value(&self) -> CodecValue;

    /// Rebuild the object from a decoded struct value. Invariant violations
    /// surface as [`DecodeError::ConstructionFailed`].
    fn from_value(value: CodecValue) -> Result<Self, DecodeError>;
}

/// Serialize an object to a JSON tree.
pub fn encode<T: TreeBind>(object: &T, registry: &SchemaRegistry) -> Result<Value, EncodeError> {
    encode_value(&object.to_value(), registry)
}

/// Deserialize an object from a JSON tree.
pub fn decode<T: TreeBind>(tree: &Value, registry: &SchemaRegistry) -> Result<T, DecodeError> {
    T::from_value(decode_value(tree, T::NAME, registry)?)
}

/// Deserialize an object from a JSON tree, supplying implicit-field values
/// from `environment`.
pub fn decode_with<T: TreeBind>(
    tree: &Value,
    registry: &SchemaRegistry,
    environment: &Environment,
) -> Result<T, DecodeError> {
    T::from_value(decode_value_with(tree, T::NAME, registry, environment)?)
}
