//! `treebind` — bidirectional codec between typed application objects and
//! generic JSON trees.
//!
//! A type opts in by registering a single codec constructor: an ordered list
//! of named parameters, each tagged with the tree key it maps to, an
//! optional output alias, a nullability flag, or an implicit environment
//! key. The engine walks that metadata recursively in both directions:
//!
//! - [`encode`] renders an object into a [`serde_json::Value`] tree;
//! - [`decode`] reconstructs the object from a tree, injecting implicit
//!   values from a caller-supplied [`Environment`].
//!
//! Schema resolution is memoized per type in the [`SchemaRegistry`];
//! encode/decode calls are synchronous, reentrant and hold no locks.

pub mod bind;
pub mod decoder;
pub mod encoder;
pub mod env;
pub mod path;
pub mod registry;
pub mod schema;
pub mod shape;
pub mod value;

pub use bind::{decode, decode_with, encode, TreeBind};
pub use decoder::{decode_value, decode_value_with, DecodeError};
pub use encoder::{encode_value, EncodeError};
pub use env::Environment;
pub use path::TreePath;
pub use registry::SchemaRegistry;
pub use schema::{
    ConstructorSpec, EnumSpec, FieldDescriptor, ParamSpec, ParamTag, SchemaError, TypeSchema,
    TypeSpec,
};
pub use shape::{classify, ScalarKind, Shape, TypeExpr};
pub use value::CodecValue;

/// Maximum nesting depth for encode and decode traversals. Deeper object
/// graphs or trees (including self-referential graphs, which the engine
/// does not cycle-detect) fail with a depth-limit error instead of
/// exhausting the native stack.
pub const MAX_DEPTH: usize = 128;
