//! FILENAME: core/report-engine/src/total.rs
//! Report-wide totals.

use crate::definition::{resolve_column, AggregateRows, Column};
use crate::dispatch::evaluate_value;
use crate::error::Result;
use crate::grouping::GroupedTree;
use crate::value::{OrderedMap, Record, Value};

/// Column -> value for one total row.
pub type TotalRow = OrderedMap<String, Value>;

/// Total rows indexed by row index; gap indices hold empty rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TotalTable {
    rows: Vec<TotalRow>,
}

impl TotalTable {
    pub fn new() -> Self {
        TotalTable::default()
    }

    pub fn row(&self, index: usize) -> Option<&TotalRow> {
        self.rows.get(index)
    }

    pub fn value(&self, index: usize, column: &str) -> Option<&Value> {
        self.row(index)?.get(column)
    }

    pub fn rows(&self) -> &[TotalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Computes every total row over all records of `tree`.
///
/// The tree is flattened first, so a grouped tree and a single leaf holding
/// the same records give identical totals. Composite specs keep the value of
/// their last member.
pub fn compute_totals(
    tree: &GroupedTree<'_>,
    rows: &AggregateRows,
    columns: &[Column],
) -> Result<TotalTable> {
    let records = tree.flatten();
    compute_totals_flat(&records, rows, columns)
}

/// Computes every total row over a flat record slice.
pub fn compute_totals_flat(
    records: &[&Record],
    rows: &AggregateRows,
    columns: &[Column],
) -> Result<TotalTable> {
    let mut table = TotalTable::new();

    for (_, bucket) in rows.iter() {
        let mut row = TotalRow::default();
        for (column_name, spec) in bucket.into_iter().flatten() {
            let column = resolve_column(columns, column_name);
            let value = evaluate_value(spec, records, &column, &[])?;
            row.insert(column_name.clone(), value);
        }
        table.rows.push(row);
    }

    log::debug!("computed {} total rows over {} records", table.len(), records.len());
    Ok(table)
}
