//! FILENAME: core/report-engine/src/lib.rs
//! Grouped report calculation for flat record collections.
//!
//! Records are grouped hierarchically by one or more fields (in the order the
//! values are first seen), and aggregate rows are computed per group
//! (subtotals), per ancestor group (parent roll-ups) and over the whole
//! collection (totals). Aggregates are builtins, caller-supplied callables,
//! builtins with a post-process step, or lists of those.
//!
//! Layers:
//! - `value`: Record and group-key value model
//! - `definition`: What the report IS (columns, grouping, aggregate rows)
//! - `config`: JSON form of the definition
//! - `aggregate` / `dispatch`: Builtins and function-spec evaluation
//! - `grouping` / `subtotal` / `total`: The calculators
//! - `engine`: Prepares a report from records and a definition

pub mod aggregate;
pub mod config;
pub mod definition;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod subtotal;
pub mod total;
pub mod value;

pub use config::{AggregateConfig, GroupLevelConfig, ReportConfig};
pub use definition::*;
pub use dispatch::{evaluate, evaluate_value, Evaluated};
pub use engine::{prepare_report, PreparedReport, ReportEngine};
pub use error::{CallableError, ReportError, Result};
pub use grouping::{group, group_records, GroupedTree};
pub use subtotal::{
    compute_parent_subtotals, compute_subtotals, AggregateCell, AggregateRow, SubtotalTable,
};
pub use total::{compute_totals, compute_totals_flat, TotalRow, TotalTable};
pub use value::{path, GroupValue, OrderedFloat, OrderedMap, Path, Record, Value};

#[cfg(test)]
mod tests;
