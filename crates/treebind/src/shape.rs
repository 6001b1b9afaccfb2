//! Declared-type classification — maps a [`TypeExpr`] to the [`Shape`] that
//! drives encode/decode dispatch.
//!
//! Classification happens once per field at schema resolution time; the
//! resulting `Shape` tree is cached inside the resolved [`crate::schema::TypeSchema`]
//! and reused across all subsequent calls.

use crate::registry::SchemaRegistry;
use crate::schema::SchemaError;

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Whether this kind participates in the numeric coercion table.
    /// Booleans and characters do not.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => return None,
        })
    }
}

/// The declared type of a constructor parameter, as written in a type spec.
///
/// A small surface syntax for field types: plain names resolve against
/// scalar kinds, `String`, registered enums and registered codec types;
/// parameterized names form optionals, collections, arrays and maps.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name(String),
    Generic(String, Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::Generic(name.into(), args)
    }

    /// `Option<inner>`
    pub fn option(inner: TypeExpr) -> Self {
        Self::generic("Option", vec![inner])
    }

    /// `Vec<element>` — ordered collection.
    pub fn vec(element: TypeExpr) -> Self {
        Self::generic("Vec", vec![element])
    }

    /// `Set<element>` — unordered collection.
    pub fn set(element: TypeExpr) -> Self {
        Self::generic("Set", vec![element])
    }

    /// `Array<element>` — fixed-size array.
    pub fn array(element: TypeExpr) -> Self {
        Self::generic("Array", vec![element])
    }

    /// `Map<key, value>` — string-keyed map.
    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        Self::generic("Map", vec![key, value])
    }
}

/// Structural category of a declared type, recursively nested for
/// parameterized shapes. Nested codec types and enums are referenced by
/// registered name and resolved through the registry during traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    Text,
    Enum(String),
    Optional(Box<Shape>),
    Array(Box<Shape>),
    Ordered(Box<Shape>),
    Unordered(Box<Shape>),
    Map(Box<Shape>),
    Nested(String),
}

impl Shape {
    /// Returns the kind name of this shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(k) => k.as_str(),
            Self::Text => "text",
            Self::Enum(_) => "enum",
            Self::Optional(_) => "optional",
            Self::Array(_) => "array",
            Self::Ordered(_) => "list",
            Self::Unordered(_) => "set",
            Self::Map(_) => "map",
            Self::Nested(_) => "struct",
        }
    }
}

/// Number of type arguments each parameterized constructor requires.
fn arity(name: &str) -> Option<usize> {
    match name {
        "Option" | "Vec" | "Set" | "Array" => Some(1),
        "Map" => Some(2),
        _ => None,
    }
}

/// Classify a declared type into its [`Shape`].
///
/// Fails with a [`SchemaError`] when the type cannot participate in the
/// codec: unknown names, raw parameterized types, wrong argument counts,
/// or maps whose key type is not text.
pub fn classify(expr: &TypeExpr, registry: &SchemaRegistry) -> Result<Shape, SchemaError> {
    match expr {
        TypeExpr::Name(name) => {
            if let Some(expected) = arity(name) {
                return Err(SchemaError::MissingTypeArguments {
                    name: name.clone(),
                    expected,
                    found: 0,
                });
            }
            if let Some(kind) = ScalarKind::from_name(name) {
                return Ok(Shape::Scalar(kind));
            }
            if name == "String" {
                return Ok(Shape::Text);
            }
            if registry.has_enum(name) {
                return Ok(Shape::Enum(name.clone()));
            }
            if registry.has_type(name) {
                return Ok(Shape::Nested(name.clone()));
            }
            Err(SchemaError::UnsupportedType { name: name.clone() })
        }
        TypeExpr::Generic(name, args) => {
            let expected = arity(name).ok_or_else(|| SchemaError::UnsupportedType {
                name: name.clone(),
            })?;
            if args.len() != expected {
                return Err(SchemaError::MissingTypeArguments {
                    name: name.clone(),
                    expected,
                    found: args.len(),
                });
            }
            match name.as_str() {
                "Option" => Ok(Shape::Optional(Box::new(classify(&args[0], registry)?))),
                "Vec" => Ok(Shape::Ordered(Box::new(classify(&args[0], registry)?))),
                "Set" => Ok(Shape::Unordered(Box::new(classify(&args[0], registry)?))),
                "Array" => Ok(Shape::Array(Box::new(classify(&args[0], registry)?))),
                "Map" => {
                    let key = classify(&args[0], registry)?;
                    if key != Shape::Text {
                        return Err(SchemaError::NonStringMapKey {
                            found: key.kind().to_string(),
                        });
                    }
                    Ok(Shape::Map(Box::new(classify(&args[1], registry)?)))
                }
                _ => unreachable!("arity covers exactly the parameterized names"),
            }
        }
    }
}
