//! Codec-constructor metadata — the raw specs a type registers and the
//! resolved per-type schema the traversal engine consumes.
//!
//! A type opts into the codec by registering a [`TypeSpec`] carrying exactly
//! one marked [`ConstructorSpec`]. The resolver turns that spec into an
//! immutable [`TypeSchema`] of ordered [`FieldDescriptor`]s.

use std::fmt;
use std::sync::Arc;

use crate::shape::{Shape, TypeExpr};
use crate::value::CodecValue;

/// Schema-level errors, raised before any value is touched. Shared by both
/// directions: a type that fails resolution can neither encode nor decode.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("type '{name}' is not codec-enabled")]
    UnsupportedType { name: String },
    #[error("no codec constructor registered for type '{type_name}'")]
    NoCodecConstructor { type_name: String },
    #[error("type '{type_name}' declares {count} codec constructors, expected exactly one")]
    AmbiguousCodecConstructor { type_name: String, count: usize },
    #[error("parameter '{param}' of type '{type_name}' carries neither a field nor an implicit tag")]
    MissingFieldTag { type_name: String, param: String },
    #[error("duplicate tree key '{key}' in type '{type_name}'")]
    DuplicateField { type_name: String, key: String },
    #[error("map key type must be text, got '{found}'")]
    NonStringMapKey { found: String },
    #[error("'{name}' requires {expected} type argument(s), found {found}")]
    MissingTypeArguments {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Invariant hook run after all positional arguments have been decoded.
/// A rejection surfaces as a construction failure.
pub type ConstructorGuard =
    Arc<dyn Fn(&[(String, CodecValue)]) -> Result<(), String> + Send + Sync>;

/// Tag attached to a constructor parameter, describing where its value
/// comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamTag {
    /// The value maps to a tree field. The tree key is the parameter name
    /// unless `alias` overrides it.
    Field {
        alias: Option<String>,
        nullable: bool,
    },
    /// The value is supplied by the caller's environment at decode time
    /// and never appears in the tree.
    Implicit { key: String },
}

/// A single constructor parameter: name, declared type and tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeExpr,
    pub tag: Option<ParamTag>,
}

impl ParamSpec {
    /// A tree-mapped parameter; tree key defaults to the parameter name.
    pub fn field(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: Some(ParamTag::Field {
                alias: None,
                nullable: false,
            }),
        }
    }

    /// An environment-supplied parameter, looked up under `key`.
    pub fn implicit(name: impl Into<String>, ty: TypeExpr, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: Some(ParamTag::Implicit { key: key.into() }),
        }
    }

    /// A parameter with no tag at all. Resolution rejects it; this exists so
    /// a spec can faithfully describe a mistagged constructor.
    pub fn untagged(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: None,
        }
    }

    /// Override the tree key for a field-tagged parameter.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        if let Some(ParamTag::Field { alias: a, .. }) = &mut self.tag {
            *a = Some(alias.into());
        }
        self
    }

    /// Mark a field-tagged parameter as nullable.
    pub fn nullable(mut self) -> Self {
        if let Some(ParamTag::Field { nullable, .. }) = &mut self.tag {
            *nullable = true;
        }
        self
    }
}

/// A constructor of a registered type. Only the one carrying the codec
/// marker defines the wire shape.
#[derive(Clone)]
pub struct ConstructorSpec {
    pub codec: bool,
    pub params: Vec<ParamSpec>,
    pub guard: Option<ConstructorGuard>,
}

impl ConstructorSpec {
    /// The designated codec constructor.
    pub fn codec(params: Vec<ParamSpec>) -> Self {
        Self {
            codec: true,
            params,
            guard: None,
        }
    }

    /// An ordinary constructor, ignored by the codec.
    pub fn plain(params: Vec<ParamSpec>) -> Self {
        Self {
            codec: false,
            params,
            guard: None,
        }
    }

    /// Attach an invariant guard, run after decode computes all arguments.
    pub fn with_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&[(String, CodecValue)]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.guard = Some(Arc::new(guard));
        self
    }
}

impl fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("codec", &self.codec)
            .field("params", &self.params)
            .field("has_guard", &self.guard.is_some())
            .finish()
    }
}

/// A registered codec-enabled type: a name plus its constructors.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub constructors: Vec<ConstructorSpec>,
}

impl TypeSpec {
    /// The common case: a type with a single constructor.
    pub fn new(name: impl Into<String>, constructor: ConstructorSpec) -> Self {
        Self {
            name: name.into(),
            constructors: vec![constructor],
        }
    }

    pub fn with_constructors(name: impl Into<String>, constructors: Vec<ConstructorSpec>) -> Self {
        Self {
            name: name.into(),
            constructors,
        }
    }
}

/// A registered enumeration: a name plus its constant names.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumSpec {
    pub fn new<V: Into<String>>(name: impl Into<String>, variants: Vec<V>) -> Self {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

/// Resolved per-parameter metadata, the unit the encoder and decoder walk.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// In-memory field name; also the constructor slot filled during decode.
    pub name: String,
    /// Tree key (output alias applied). Unused for implicit fields.
    pub key: String,
    pub nullable: bool,
    /// Environment key for implicit fields; `None` for tree-mapped fields.
    pub implicit: Option<String>,
    pub shape: Shape,
}

/// The resolved, immutable metadata model of one codec-enabled type.
/// Derived once per type and shared behind an `Arc` across all calls.
#[derive(Clone)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub guard: Option<ConstructorGuard>,
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("has_guard", &self.guard.is_some())
            .finish()
    }
}
