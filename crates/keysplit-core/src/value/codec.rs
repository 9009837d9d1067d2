use crate::{
    error::ErrorClass,
    value::{
        ArrayItems, ArrayValue, ColumnType, DecodedValue, Float64, Scalar, ScalarType, TypeCode,
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde_json::Value as Payload;
use thiserror::Error as ThisError;
use time::{format_description::BorrowedFormatItem, macros::format_description};

///
/// DecodeError
///
/// Failures raised while decoding one column value.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DecodeError {
    #[error("unsupported column type: {}", render_type(*code, *element))]
    UnsupportedType {
        code: TypeCode,
        element: Option<TypeCode>,
    },

    #[error("column type ARRAY is missing its element type")]
    MissingElementType,

    #[error("malformed {code} payload: {reason}")]
    MalformedPayload { code: TypeCode, reason: String },
}

impl DecodeError {
    /// Internal classification for this failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedType { .. } | Self::MissingElementType => ErrorClass::Unsupported,
            Self::MalformedPayload { .. } => ErrorClass::Corruption,
        }
    }

    fn malformed(code: TypeCode, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            code,
            reason: reason.into(),
        }
    }
}

fn render_type(code: TypeCode, element: Option<TypeCode>) -> String {
    match element {
        Some(element) => format!("{code}<{element}>"),
        None => code.to_string(),
    }
}

///
/// RawCell
///
/// One untyped column value as streamed by a scan: type tag, wire payload,
/// and the out-of-band null flag.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RawCell {
    pub ty: ColumnType,
    pub payload: Payload,
    pub is_null: bool,
}

impl RawCell {
    /// Build a cell whose null flag follows the payload.
    #[must_use]
    pub fn new(ty: impl Into<ColumnType>, payload: Payload) -> Self {
        let is_null = payload.is_null();

        Self {
            ty: ty.into(),
            payload,
            is_null,
        }
    }

    #[must_use]
    pub fn null(ty: impl Into<ColumnType>) -> Self {
        Self {
            ty: ty.into(),
            payload: Payload::Null,
            is_null: true,
        }
    }

    pub fn decode(&self) -> Result<DecodedValue, DecodeError> {
        decode(&self.ty, &self.payload, self.is_null)
    }
}

/// Decode one column value into its typed, null-aware representation.
///
/// A JSON `null` payload is treated as null even when `is_null` is unset.
pub fn decode(
    ty: &ColumnType,
    payload: &Payload,
    is_null: bool,
) -> Result<DecodedValue, DecodeError> {
    let is_null = is_null || payload.is_null();

    if ty.code == TypeCode::Array {
        return decode_array(ty, payload, is_null).map(DecodedValue::Array);
    }

    let scalar_type = ty.code.scalar_type().ok_or(DecodeError::UnsupportedType {
        code: ty.code,
        element: None,
    })?;
    if is_null {
        return Ok(DecodedValue::Null(scalar_type));
    }

    decode_scalar(scalar_type, payload).map(DecodedValue::Scalar)
}

fn decode_array(
    ty: &ColumnType,
    payload: &Payload,
    is_null: bool,
) -> Result<ArrayValue, DecodeError> {
    let element = ty.element.as_deref().ok_or(DecodeError::MissingElementType)?;
    let element_type = element.code.scalar_type().ok_or(DecodeError::UnsupportedType {
        code: TypeCode::Array,
        element: Some(element.code),
    })?;
    if is_null {
        return Ok(ArrayValue::null(element_type));
    }

    let Payload::Array(list) = payload else {
        return Err(DecodeError::malformed(
            TypeCode::Array,
            format!("expected a list, found {payload}"),
        ));
    };

    // Shape is all-or-nothing: one null element makes every element nullable.
    let items = if list.iter().any(Payload::is_null) {
        let items = list
            .iter()
            .map(|item| {
                if item.is_null() {
                    Ok(None)
                } else {
                    decode_scalar(element_type, item).map(Some)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        ArrayItems::Nullable(items)
    } else {
        let items = list
            .iter()
            .map(|item| decode_scalar(element_type, item))
            .collect::<Result<Vec<_>, _>>()?;

        ArrayItems::Plain(items)
    };

    Ok(ArrayValue {
        element: element_type,
        items,
    })
}

fn decode_scalar(ty: ScalarType, payload: &Payload) -> Result<Scalar, DecodeError> {
    let code = ty.type_code();

    match ty {
        ScalarType::Bool => payload.as_bool().map(Scalar::Bool).ok_or_else(|| {
            DecodeError::malformed(code, format!("expected a bool, found {payload}"))
        }),
        ScalarType::Int64 => decode_int64(payload).map(Scalar::Int64),
        ScalarType::Float64 => decode_float64(payload).map(|v| Scalar::Float64(Float64::new(v))),
        ScalarType::Text => expect_str(code, payload).map(|s| Scalar::Text(s.to_string())),
        ScalarType::Bytes => {
            let encoded = expect_str(code, payload)?;
            STANDARD
                .decode(encoded)
                .map(Scalar::Bytes)
                .map_err(|err| DecodeError::malformed(code, format!("invalid base64: {err}")))
        }
        ScalarType::Date => decode_date(expect_str(code, payload)?).map(Scalar::Date),
        ScalarType::Timestamp => {
            decode_timestamp(expect_str(code, payload)?).map(Scalar::Timestamp)
        }
    }
}

fn expect_str(code: TypeCode, payload: &Payload) -> Result<&str, DecodeError> {
    payload.as_str().ok_or_else(|| {
        DecodeError::malformed(code, format!("expected a string, found {payload}"))
    })
}

// INT64 travels as a decimal string; plain JSON integers are accepted too.
fn decode_int64(payload: &Payload) -> Result<i64, DecodeError> {
    match payload {
        Payload::String(s) => s.parse::<i64>().map_err(|err| {
            DecodeError::malformed(TypeCode::Int64, format!("'{s}' is not an int64: {err}"))
        }),
        Payload::Number(n) => n.as_i64().ok_or_else(|| {
            DecodeError::malformed(TypeCode::Int64, format!("{n} is not an int64"))
        }),
        _ => Err(DecodeError::malformed(
            TypeCode::Int64,
            format!("expected a string or integer, found {payload}"),
        )),
    }
}

// FLOAT64 travels as a JSON number, except the non-finite values.
fn decode_float64(payload: &Payload) -> Result<f64, DecodeError> {
    match payload {
        Payload::Number(n) => n.as_f64().ok_or_else(|| {
            DecodeError::malformed(TypeCode::Float64, format!("{n} is not a float64"))
        }),
        Payload::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(DecodeError::malformed(
                TypeCode::Float64,
                format!("'{s}' is not a float64"),
            )),
        },
        _ => Err(DecodeError::malformed(
            TypeCode::Float64,
            format!("expected a number, found {payload}"),
        )),
    }
}

/// `YYYY-MM-DD`; negative years carry a leading `-`.
pub(super) const DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

pub(super) fn decode_date(s: &str) -> Result<time::Date, DecodeError> {
    time::Date::parse(s, DATE_FORMAT).map_err(
        |err| DecodeError::malformed(TypeCode::Date, format!("'{s}' is not a date: {err}")),
    )
}

pub(super) fn decode_timestamp(s: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            DecodeError::malformed(
                TypeCode::Timestamp,
                format!("'{s}' is not a timestamp: {err}"),
            )
        })
}
