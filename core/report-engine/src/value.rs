//! FILENAME: core/report-engine/src/value.rs
//! PURPOSE: Value model for report records and group keys.
//! CONTEXT: `Value` is what a record field holds and what an aggregate
//! produces. `GroupValue` is its hashable counterpart, used as the key of
//! grouped tree nodes and as the elements of a `Path`.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Insertion-ordered map used throughout the engine.
pub type OrderedMap<K, V> = IndexMap<K, V, FxBuildHasher>;

// ============================================================================
// VALUE
// ============================================================================

/// A field value or a computed aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Any other JSON value (objects, arrays). Carried through, never
    /// aggregated.
    Other(serde_json::Value),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Lenient float conversion used by the builtin aggregates.
    ///
    /// Numbers pass through, text contributes its longest leading numeric
    /// prefix, everything else is 0.
    pub fn coerce_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_leading_float(s),
            Value::Empty | Value::Boolean(_) | Value::Other(_) => 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Other(json) => write!(f, "{}", json),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Parses the longest prefix of `s` (after leading whitespace) that forms a
/// decimal number. Returns 0 when there is none.
fn parse_leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            end = frac_end;
            has_digits = true;
        }
    }

    if !has_digits {
        return 0.0;
    }

    // Optional exponent, only taken when it is complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

// ============================================================================
// RECORD
// ============================================================================

/// A flat record: field name to value, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: OrderedMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the field value, `Value::Empty` when the field is absent.
    pub fn get(&self, field: &str) -> &Value {
        static EMPTY: Value = Value::Empty;
        self.fields.get(field).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

// ============================================================================
// GROUP VALUE
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal.
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A normalized, hashable representation of a grouping field's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    /// Compact JSON text of an opaque value.
    Other(String),
}

impl GroupValue {
    pub fn text(s: impl Into<String>) -> Self {
        GroupValue::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        GroupValue::Number(OrderedFloat(n))
    }

    /// Display label for group headers.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl From<&Value> for GroupValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Empty => GroupValue::Empty,
            Value::Number(n) => GroupValue::Number(OrderedFloat(*n)),
            Value::Text(s) => GroupValue::Text(s.clone()),
            Value::Boolean(b) => GroupValue::Boolean(*b),
            Value::Other(json) => GroupValue::Other(json.to_string()),
        }
    }
}

impl From<&str> for GroupValue {
    fn from(s: &str) -> Self {
        GroupValue::Text(s.to_string())
    }
}

impl From<&GroupValue> for Value {
    fn from(value: &GroupValue) -> Self {
        match value {
            GroupValue::Empty => Value::Empty,
            GroupValue::Number(n) => Value::Number(n.as_f64()),
            GroupValue::Text(s) => Value::Text(s.clone()),
            GroupValue::Boolean(b) => Value::Boolean(*b),
            GroupValue::Other(json) => serde_json::from_str(json)
                .map(Value::Other)
                .unwrap_or_else(|_| Value::Text(json.clone())),
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Empty => Ok(()),
            GroupValue::Number(n) => write!(f, "{}", n.as_f64()),
            GroupValue::Text(s) | GroupValue::Other(s) => f.write_str(s),
            GroupValue::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

/// Group values from the root level down to a node.
pub type Path = SmallVec<[GroupValue; 4]>;

/// Builds a path from anything convertible into group values.
pub fn path<I, T>(values: I) -> Path
where
    I: IntoIterator<Item = T>,
    T: Into<GroupValue>,
{
    values.into_iter().map(Into::into).collect()
}
