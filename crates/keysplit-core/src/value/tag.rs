use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// TypeCode
///
/// Column type tag as reported by the store's metadata and query APIs.
/// Covers every tag the store can emit, including the ones the value model
/// cannot represent (`Json`, `Numeric`, `Struct`).
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCode {
    Array,
    Bool,
    Bytes,
    Date,
    Float64,
    Int64,
    Json,
    Numeric,
    String,
    Struct,
    Timestamp,
}

impl TypeCode {
    /// Wire label, matching the store's own spelling.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Array => "ARRAY",
            Self::Bool => "BOOL",
            Self::Bytes => "BYTES",
            Self::Date => "DATE",
            Self::Float64 => "FLOAT64",
            Self::Int64 => "INT64",
            Self::Json => "JSON",
            Self::Numeric => "NUMERIC",
            Self::String => "STRING",
            Self::Struct => "STRUCT",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Scalar shape this tag decodes into, if it is a supported scalar.
    #[must_use]
    pub const fn scalar_type(self) -> Option<ScalarType> {
        match self {
            Self::Bool => Some(ScalarType::Bool),
            Self::Bytes => Some(ScalarType::Bytes),
            Self::Date => Some(ScalarType::Date),
            Self::Float64 => Some(ScalarType::Float64),
            Self::Int64 => Some(ScalarType::Int64),
            Self::String => Some(ScalarType::Text),
            Self::Timestamp => Some(ScalarType::Timestamp),
            Self::Array | Self::Json | Self::Numeric | Self::Struct => None,
        }
    }
}

impl Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// ColumnType
///
/// Full column type: a tag plus, for arrays, the element type.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnType {
    pub code: TypeCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<Self>>,
}

impl ColumnType {
    #[must_use]
    pub const fn scalar(code: TypeCode) -> Self {
        Self {
            code,
            element: None,
        }
    }

    #[must_use]
    pub fn array(element: Self) -> Self {
        Self {
            code: TypeCode::Array,
            element: Some(Box::new(element)),
        }
    }

    /// Shorthand for `ARRAY<code>`.
    #[must_use]
    pub fn array_of(code: TypeCode) -> Self {
        Self::array(Self::scalar(code))
    }

    #[must_use]
    pub fn element_code(&self) -> Option<TypeCode> {
        self.element.as_ref().map(|element| element.code)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "{}<{element}>", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl From<TypeCode> for ColumnType {
    fn from(code: TypeCode) -> Self {
        Self::scalar(code)
    }
}

///
/// ScalarType
///
/// Decoded scalar shape. Carried by typed nulls and typed arrays so a null
/// never loses the type it was declared with.
///
/// IMPORTANT:
/// Discriminants double as the cross-type ordering rank and must stay fixed.
///

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarType {
    Bool = 1,
    Int64 = 2,
    Float64 = 3,
    Text = 4,
    Bytes = 5,
    Date = 6,
    Timestamp = 7,
}

impl ScalarType {
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn type_code(self) -> TypeCode {
        match self {
            Self::Bool => TypeCode::Bool,
            Self::Int64 => TypeCode::Int64,
            Self::Float64 => TypeCode::Float64,
            Self::Text => TypeCode::String,
            Self::Bytes => TypeCode::Bytes,
            Self::Date => TypeCode::Date,
            Self::Timestamp => TypeCode::Timestamp,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        self.type_code().label()
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
