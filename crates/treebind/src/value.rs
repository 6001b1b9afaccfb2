//! [`CodecValue`] — the dynamic in-memory value model for codec-enabled types.
//!
//! Application objects are reflected into this enum before encoding and
//! rebuilt from it after decoding. The traversal engine only ever sees
//! `CodecValue`, never the host type itself.

/// Dynamic representation of an in-memory application value.
///
/// Covers every category the codec can map to a JSON tree:
/// - fixed-width scalars (booleans, characters, integers, floats)
/// - text
/// - enumeration constants
/// - optional values
/// - ordered and unordered collections, fixed arrays
/// - string-keyed maps (ordered key-value pairs)
/// - codec-enabled structs
#[derive(Debug, Clone, PartialEq)]
pub enum CodecValue {
    /// Absent value (the null sentinel).
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    /// A constant of a registered enumeration.
    Enum { ty: String, variant: String },
    /// Optional wrapper. `Opt(None)` is an empty optional, distinct from `Null`.
    Opt(Option<Box<CodecValue>>),
    /// Ordered collection.
    List(Vec<CodecValue>),
    /// Unordered collection. Element order is incidental; elements are unique.
    Set(Vec<CodecValue>),
    /// Fixed-size array.
    Array(Vec<CodecValue>),
    /// String-keyed map, keys unique.
    Map(Vec<(String, CodecValue)>),
    /// An instance of a registered codec-enabled type.
    Struct {
        ty: String,
        fields: Vec<(String, CodecValue)>,
    },
}

impl CodecValue {
    /// Returns the kind name of this value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::Enum { .. } => "enum",
            Self::Opt(_) => "optional",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Struct { .. } => "struct",
        }
    }

    /// Shorthand for a struct value.
    pub fn struct_of<T: Into<String>, K: Into<String>>(ty: T, fields: Vec<(K, CodecValue)>) -> Self {
        Self::Struct {
            ty: ty.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Shorthand for a map value.
    pub fn map_of<K: Into<String>>(pairs: Vec<(K, CodecValue)>) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Shorthand for an enum constant.
    pub fn enum_of(ty: impl Into<String>, variant: impl Into<String>) -> Self {
        Self::Enum {
            ty: ty.into(),
            variant: variant.into(),
        }
    }

    /// A populated optional.
    pub fn some(value: CodecValue) -> Self {
        Self::Opt(Some(Box::new(value)))
    }

    /// An empty optional.
    pub fn none() -> Self {
        Self::Opt(None)
    }

    /// Looks up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&CodecValue> {
        match self {
            Self::Struct { fields, .. } => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Unwraps an optional value; `None` for empty optionals.
    pub fn as_opt(&self) -> Option<&CodecValue> {
        match self {
            Self::Opt(inner) => inner.as_deref(),
            _ => None,
        }
    }
}

impl From<bool> for CodecValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for CodecValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for CodecValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for CodecValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for CodecValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for CodecValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<char> for CodecValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}
