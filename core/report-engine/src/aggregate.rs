//! FILENAME: core/report-engine/src/aggregate.rs
//! Builtin aggregate functions over one column of a record slice.
//!
//! Every value is coerced with `Value::coerce_f64`, so non-numeric input
//! counts as 0 instead of failing the aggregate.

use crate::definition::AggregateFunction;
use crate::value::{Record, Value};

/// Sum of the coerced column values. 0 for an empty slice.
pub fn sum(records: &[&Record], column: &str) -> f64 {
    records
        .iter()
        .map(|r| r.get(column).coerce_f64())
        .fold(0.0, |acc, v| acc + v)
}

/// Arithmetic mean. 0 for an empty slice.
pub fn avg(records: &[&Record], column: &str) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    sum(records, column) / records.len() as f64
}

/// Largest coerced value.
///
/// The slice must not be empty; an empty slice yields `None`.
pub fn max(records: &[&Record], column: &str) -> Option<f64> {
    records
        .iter()
        .map(|r| r.get(column).coerce_f64())
        .reduce(f64::max)
}

/// Smallest coerced value.
///
/// The slice must not be empty; an empty slice yields `None`.
pub fn min(records: &[&Record], column: &str) -> Option<f64> {
    records
        .iter()
        .map(|r| r.get(column).coerce_f64())
        .reduce(f64::min)
}

impl AggregateFunction {
    /// Applies the function to `column` of `records`.
    ///
    /// `max`/`min` over an empty slice give `Value::Empty`.
    pub fn apply(&self, records: &[&Record], column: &str) -> Value {
        match self {
            AggregateFunction::Sum => Value::Number(sum(records, column)),
            AggregateFunction::Avg => Value::Number(avg(records, column)),
            AggregateFunction::Max => max(records, column).map_or(Value::Empty, Value::Number),
            AggregateFunction::Min => min(records, column).map_or(Value::Empty, Value::Number),
        }
    }
}
