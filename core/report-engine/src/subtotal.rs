//! FILENAME: core/report-engine/src/subtotal.rs
//! Subtotal and parent roll-up calculation.
//!
//! Both tables are keyed by group path. Each path holds one `AggregateRow`
//! per row index of the subtotal definition (gaps included, as empty rows),
//! and each row maps column -> function key -> value.

use crate::definition::{resolve_column, AggregateRows, Column};
use crate::dispatch::evaluate;
use crate::error::{ReportError, Result};
use crate::grouping::{group, GroupedTree};
use crate::value::{GroupValue, OrderedMap, Path, Record, Value};

/// Function key -> value for one column of one aggregate row.
pub type AggregateCell = OrderedMap<String, Value>;

/// Column -> cell for one aggregate row.
pub type AggregateRow = OrderedMap<String, AggregateCell>;

// ============================================================================
// SUBTOTAL TABLE
// ============================================================================

/// Aggregate rows keyed by group path, in computation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtotalTable {
    entries: OrderedMap<Path, Vec<AggregateRow>>,
}

impl SubtotalTable {
    pub fn new() -> Self {
        SubtotalTable::default()
    }

    pub fn insert(&mut self, path: Path, rows: Vec<AggregateRow>) {
        self.entries.insert(path, rows);
    }

    /// All rows for `path`, indexed by row index.
    pub fn rows(&self, path: &[GroupValue]) -> Option<&[AggregateRow]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn row(&self, path: &[GroupValue], index: usize) -> Option<&AggregateRow> {
        self.rows(path)?.get(index)
    }

    pub fn value(&self, path: &[GroupValue], index: usize, column: &str, key: &str) -> Option<&Value> {
        self.row(path, index)?.get(column)?.get(key)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[AggregateRow])> {
        self.entries.iter().map(|(p, rows)| (p, rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ROW EVALUATION
// ============================================================================

/// Evaluates every row of `rows` over `records` for the group at `path`.
/// Gaps and empty buckets become empty rows.
pub(crate) fn evaluate_rows(
    records: &[&Record],
    rows: &AggregateRows,
    columns: &[Column],
    path: &[GroupValue],
) -> Result<Vec<AggregateRow>> {
    let mut out = Vec::with_capacity(rows.len());

    for (_, bucket) in rows.iter() {
        let mut row = AggregateRow::default();
        for (column_name, spec) in bucket.into_iter().flatten() {
            let column = resolve_column(columns, column_name);
            let entries = evaluate(spec, records, &column, path)?;
            if entries.is_empty() {
                continue;
            }
            let cell = row.entry(column_name.clone()).or_default();
            for entry in entries {
                cell.insert(entry.key, entry.value);
            }
        }
        out.push(row);
    }

    Ok(out)
}

// ============================================================================
// CALCULATORS
// ============================================================================

/// Computes the subtotal rows of every leaf group of `tree`.
///
/// `depth` is the configured grouping depth; subtotals over an ungrouped
/// collection are a configuration error.
pub fn compute_subtotals(
    tree: &GroupedTree<'_>,
    rows: &AggregateRows,
    columns: &[Column],
    depth: usize,
) -> Result<SubtotalTable> {
    if depth == 0 {
        return Err(ReportError::SubtotalsRequireGrouping);
    }

    let mut table = SubtotalTable::new();
    if tree.is_empty() {
        return Ok(table);
    }

    for (path, records) in tree.leaves() {
        let evaluated = evaluate_rows(records, rows, columns, &path)?;
        table.insert(path, evaluated);
    }

    log::debug!("computed subtotals for {} groups", table.len());
    Ok(table)
}

/// Computes the subtotal rows of every ancestor group.
///
/// For each level from the second-deepest up to the root the records are
/// regrouped on the fields down to that level, and the rows are evaluated per
/// resulting group. Inner levels are inserted first. Nothing is computed for
/// fewer than two grouping fields.
pub fn compute_parent_subtotals(
    records: &[&Record],
    fields: &[&str],
    rows: &AggregateRows,
    columns: &[Column],
) -> Result<SubtotalTable> {
    let mut table = SubtotalTable::new();
    if fields.len() < 2 || records.is_empty() {
        return Ok(table);
    }

    for level in (0..fields.len() - 1).rev() {
        let tree = group(records, &fields[..=level]);
        for (path, members) in tree.leaves() {
            let evaluated = evaluate_rows(members, rows, columns, &path)?;
            table.insert(path, evaluated);
        }
    }

    log::debug!("computed parent subtotals for {} ancestor groups", table.len());
    Ok(table)
}
