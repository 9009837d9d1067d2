use crate::value::{ArrayItems, ArrayValue, DecodedValue, Scalar};
use std::cmp::Ordering;

// Arrays rank after every scalar type.
const ARRAY_RANK_BASE: u8 = 0x80;

/// Total canonical comparator matching the store's ascending key order.
///
/// Ordering rules:
/// 1. Declared type rank (arrays after scalars)
/// 2. A typed null before every non-null value of the same type
/// 3. Variant-specific comparison for same-typed values
///
/// Mixed-type comparisons are rank-only and must remain deterministic.
#[must_use]
pub fn canonical_cmp(left: &DecodedValue, right: &DecodedValue) -> Ordering {
    let rank = value_rank(left).cmp(&value_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (DecodedValue::Null(_), DecodedValue::Null(_)) => Ordering::Equal,
        (DecodedValue::Null(_), _) => Ordering::Less,
        (_, DecodedValue::Null(_)) => Ordering::Greater,
        (DecodedValue::Scalar(a), DecodedValue::Scalar(b)) => cmp_scalar(a, b),
        (DecodedValue::Array(a), DecodedValue::Array(b)) => cmp_array(a, b),
        _ => Ordering::Equal,
    }
}

const fn value_rank(value: &DecodedValue) -> u8 {
    match value {
        DecodedValue::Scalar(v) => v.scalar_type().rank(),
        DecodedValue::Null(ty) => ty.rank(),
        DecodedValue::Array(array) => ARRAY_RANK_BASE + array.element.rank(),
    }
}

pub(super) fn cmp_scalar(left: &Scalar, right: &Scalar) -> Ordering {
    #[allow(clippy::match_same_arms)]
    match (left, right) {
        (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
        (Scalar::Int64(a), Scalar::Int64(b)) => a.cmp(b),
        (Scalar::Float64(a), Scalar::Float64(b)) => a.cmp(b),
        (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
        (Scalar::Bytes(a), Scalar::Bytes(b)) => a.cmp(b),
        (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
        (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
        _ => left.scalar_type().cmp(&right.scalar_type()),
    }
}

// Null arrays first, then element-wise (null elements first), then length,
// then plain shape before nullable shape.
fn cmp_array(left: &ArrayValue, right: &ArrayValue) -> Ordering {
    match (&left.items, &right.items) {
        (ArrayItems::Null, ArrayItems::Null) => return Ordering::Equal,
        (ArrayItems::Null, _) => return Ordering::Less,
        (_, ArrayItems::Null) => return Ordering::Greater,
        _ => {}
    }

    let left_items = optional_items(&left.items);
    let right_items = optional_items(&right.items);
    for (a, b) in left_items.iter().zip(right_items.iter()) {
        let cmp = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => cmp_scalar(a, b),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left_items
        .len()
        .cmp(&right_items.len())
        .then_with(|| left.items.is_nullable().cmp(&right.items.is_nullable()))
}

fn optional_items(items: &ArrayItems) -> Vec<Option<&Scalar>> {
    match items {
        ArrayItems::Null => Vec::new(),
        ArrayItems::Plain(items) => items.iter().map(Some).collect(),
        ArrayItems::Nullable(items) => items.iter().map(Option::as_ref).collect(),
    }
}
