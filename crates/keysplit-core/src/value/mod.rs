//! Null-aware typed values decoded from untyped column payloads.
//!
//! A `DecodedValue` is built fresh for every decoded cell and owned by its
//! caller. Nulls keep their declared type; arrays decide their plain or
//! nullable element shape once, at decode time.

mod codec;
mod compare;
mod float;
mod tag;
mod wire;


use chrono::{DateTime, Utc};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

// re-exports
pub use codec::{DecodeError, RawCell, decode};
pub use compare::canonical_cmp;
pub use float::Float64;
pub use tag::{ColumnType, ScalarType, TypeCode};

///
/// Scalar
///
/// One non-null column value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int64(i64),
    Float64(Float64),
    Text(String),
    Bytes(Vec<u8>),
    Date(time::Date),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    #[must_use]
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::Int64(_) => ScalarType::Int64,
            Self::Float64(_) => ScalarType::Float64,
            Self::Text(_) => ScalarType::Text,
            Self::Bytes(_) => ScalarType::Bytes,
            Self::Date(_) => ScalarType::Date,
            Self::Timestamp(_) => ScalarType::Timestamp,
        }
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        compare::cmp_scalar(self, other)
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "b{:?}", wire::encode_bytes(v)),
            Self::Date(v) => write!(f, "{}", wire::format_date(*v)),
            Self::Timestamp(v) => write!(f, "{}", wire::format_timestamp(v)),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float64(Float64::new(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<time::Date> for Scalar {
    fn from(v: time::Date) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

///
/// ArrayItems
///
/// Element shape of a decoded array. `Nullable` is chosen for the whole array
/// as soon as one element is null; otherwise every element is `Plain`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArrayItems {
    /// The array itself was null: empty, but still typed.
    Null,
    Plain(Vec<Scalar>),
    Nullable(Vec<Option<Scalar>>),
}

impl ArrayItems {
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Plain(items) => items.len(),
            Self::Nullable(items) => items.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }
}

///
/// ArrayValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArrayValue {
    pub element: ScalarType,
    pub items: ArrayItems,
}

impl ArrayValue {
    #[must_use]
    pub const fn null(element: ScalarType) -> Self {
        Self {
            element,
            items: ArrayItems::Null,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.items, ArrayItems::Null)
    }
}

///
/// DecodedValue
///
/// Tagged, null-aware result of decoding one column value.
///
/// Null(ty)  → a null scalar declared as `ty`
/// Array     → typed array, possibly null itself
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodedValue {
    Scalar(Scalar),
    Null(ScalarType),
    Array(ArrayValue),
}

impl DecodedValue {
    /// Declared scalar type; for arrays, the element type.
    #[must_use]
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Scalar(v) => v.scalar_type(),
            Self::Null(ty) => *ty,
            Self::Array(array) => array.element,
        }
    }

    /// Column type this value re-encodes as.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Scalar(_) | Self::Null(_) => ColumnType::scalar(self.scalar_type().type_code()),
            Self::Array(array) => ColumnType::array_of(array.element.type_code()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Null(_) => true,
            Self::Array(array) => array.is_null(),
            Self::Scalar(_) => false,
        }
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Re-encode into the wire payload this value was decoded from.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        wire::value_payload(self)
    }

    /// Re-encode into a full scan cell.
    #[must_use]
    pub fn to_cell(&self) -> RawCell {
        RawCell {
            ty: self.column_type(),
            payload: self.to_payload(),
            is_null: self.is_null(),
        }
    }
}

impl Ord for DecodedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(self, other)
    }
}

impl PartialOrd for DecodedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Null(ty) => write!(f, "NULL::{ty}"),
            Self::Array(array) => match &array.items {
                ArrayItems::Null => write!(f, "NULL::ARRAY<{}>", array.element),
                ArrayItems::Plain(items) => {
                    let items = items.iter().map(ToString::to_string).collect::<Vec<_>>();
                    write!(f, "[{}]", items.join(", "))
                }
                ArrayItems::Nullable(items) => {
                    let items = items
                        .iter()
                        .map(|item| {
                            item.as_ref()
                                .map_or_else(|| "NULL".to_string(), ToString::to_string)
                        })
                        .collect::<Vec<_>>();
                    write!(f, "[{}]", items.join(", "))
                }
            },
        }
    }
}

impl From<Scalar> for DecodedValue {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

macro_rules! impl_decoded_from_scalar {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for DecodedValue {
                fn from(v: $ty) -> Self {
                    Self::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

impl_decoded_from_scalar!(
    bool,
    i64,
    f64,
    &str,
    String,
    Vec<u8>,
    time::Date,
    DateTime<Utc>
);
