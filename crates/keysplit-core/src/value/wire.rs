use crate::value::{ArrayItems, DecodedValue, Scalar, codec::DATE_FORMAT};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value as Payload};

// Encode one decoded value back into its wire payload.
pub(super) fn value_payload(value: &DecodedValue) -> Payload {
    match value {
        DecodedValue::Scalar(v) => scalar_payload(v),
        DecodedValue::Null(_) => Payload::Null,
        DecodedValue::Array(array) => match &array.items {
            ArrayItems::Null => Payload::Null,
            ArrayItems::Plain(items) => Payload::Array(items.iter().map(scalar_payload).collect()),
            ArrayItems::Nullable(items) => Payload::Array(
                items
                    .iter()
                    .map(|item| item.as_ref().map_or(Payload::Null, scalar_payload))
                    .collect(),
            ),
        },
    }
}

// Encode one scalar using the store's JSON wire conventions.
pub(super) fn scalar_payload(value: &Scalar) -> Payload {
    match value {
        Scalar::Bool(v) => Payload::Bool(*v),
        Scalar::Int64(v) => Payload::String(v.to_string()),
        Scalar::Float64(v) => float_payload(v.get()),
        Scalar::Text(v) => Payload::String(v.clone()),
        Scalar::Bytes(v) => Payload::String(encode_bytes(v)),
        Scalar::Date(v) => Payload::String(format_date(*v)),
        Scalar::Timestamp(v) => Payload::String(format_timestamp(v)),
    }
}

fn float_payload(v: f64) -> Payload {
    if v.is_nan() {
        return Payload::String("NaN".to_string());
    }

    match Number::from_f64(v) {
        Some(n) => Payload::Number(n),
        None if v.is_sign_negative() => Payload::String("-Infinity".to_string()),
        None => Payload::String("Infinity".to_string()),
    }
}

pub(super) fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(super) fn format_date(date: time::Date) -> String {
    // Formatting into a String only fails on writer errors.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub(super) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Scalar {
    /// Re-encode into the wire payload.
    #[must_use]
    pub fn to_payload(&self) -> Payload {
        scalar_payload(self)
    }
}
