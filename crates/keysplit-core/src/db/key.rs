use crate::value::{DecodedValue, RawCell};
use derive_more::{Deref, IntoIterator};
use serde::{Serialize, Serializer, ser::SerializeSeq};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

///
/// KeyValue
///
/// Composite key: one decoded value per key column, in key-column order.
/// Ordering is lexicographic under the canonical value order, which matches
/// the store's ascending key order.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, Ord, PartialEq, PartialOrd)]
pub struct KeyValue(Vec<DecodedValue>);

impl KeyValue {
    #[must_use]
    pub const fn new(values: Vec<DecodedValue>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<DecodedValue> {
        self.0
    }

    /// Leading `len` components. Returns the whole key when it is shorter.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Compare only the leading components both keys share.
    #[must_use]
    pub fn cmp_prefix(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a.cmp(b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Wire payloads, one per component, for range-delete arguments.
    #[must_use]
    pub fn to_payloads(&self) -> Vec<serde_json::Value> {
        self.0.iter().map(DecodedValue::to_payload).collect()
    }

    #[must_use]
    pub fn to_cells(&self) -> Vec<RawCell> {
        self.0.iter().map(DecodedValue::to_cell).collect()
    }
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.0.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "({})", parts.join(", "))
    }
}

impl From<Vec<DecodedValue>> for KeyValue {
    fn from(values: Vec<DecodedValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<DecodedValue> for KeyValue {
    fn from_iter<I: IntoIterator<Item = DecodedValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// Serialized as the list of wire payloads the store accepts as a key.
impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in &self.0 {
            seq.serialize_element(&value.to_payload())?;
        }
        seq.end()
    }
}

///
/// CountedKeyRange
///
/// Inclusive-inclusive key range plus the exact number of rows the scan
/// observed inside it. Bounds have as many components as the columns the
/// range was partitioned on, which may be a prefix of the primary key.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CountedKeyRange {
    pub start: KeyValue,
    pub end: KeyValue,
    pub row_count: u64,
}

impl CountedKeyRange {
    /// Number of key components the bounds carry.
    #[must_use]
    pub fn width(&self) -> usize {
        self.start.len()
    }

    /// Whether a key (full or prefix) falls inside the range, comparing on
    /// the components the bounds carry.
    #[must_use]
    pub fn contains(&self, key: &KeyValue) -> bool {
        key.cmp_prefix(&self.start).is_ge() && key.cmp_prefix(&self.end).is_le()
    }

    /// Whether the two ranges share any key.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.cmp_prefix(&other.end).is_le() && other.start.cmp_prefix(&self.end).is_le()
    }
}

impl Display for CountedKeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] ({} rows)", self.start, self.end, self.row_count)
    }
}
