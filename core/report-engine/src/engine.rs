//! FILENAME: core/report-engine/src/engine.rs
//! Report Engine - turns records and a definition into a prepared report.
//!
//! Algorithm:
//! 1. Validate the definition (subtotals need grouping)
//! 2. Group the records into the encounter-ordered tree
//! 3. Compute subtotals for every leaf group
//! 4. Compute parent roll-ups for every ancestor group (two or more levels)
//! 5. Compute totals over the whole collection
//!
//! `prepare` never mutates the engine; each call rebuilds everything from the
//! original records and returns a fresh `PreparedReport`.

use crate::definition::ReportDefinition;
use crate::error::{ReportError, Result};
use crate::grouping::{group, GroupedTree};
use crate::subtotal::{compute_parent_subtotals, compute_subtotals, SubtotalTable};
use crate::total::{compute_totals, TotalTable};
use crate::value::Record;

// ============================================================================
// PREPARED REPORT
// ============================================================================

/// Immutable result of `ReportEngine::prepare`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedReport<'a> {
    /// Records grouped by the definition's levels.
    pub tree: GroupedTree<'a>,

    /// Total rows over the whole collection.
    pub totals: TotalTable,

    /// Subtotal rows per leaf group path.
    pub subtotals: SubtotalTable,

    /// Subtotal rows per ancestor group path.
    pub parent_subtotals: SubtotalTable,

    /// Compacted grouping fields the tree was built with.
    pub grouping: Vec<String>,
}

impl<'a> PreparedReport<'a> {
    pub fn depth(&self) -> usize {
        self.grouping.len()
    }

    pub fn is_grouped(&self) -> bool {
        !self.grouping.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.tree.record_count()
    }
}

// ============================================================================
// REPORT ENGINE
// ============================================================================

/// The unprepared report: borrowed records plus the definition.
pub struct ReportEngine<'a> {
    records: &'a [Record],
    definition: ReportDefinition,
}

impl<'a> ReportEngine<'a> {
    pub fn new(records: &'a [Record], definition: ReportDefinition) -> Self {
        ReportEngine { records, definition }
    }

    pub fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    pub fn definition_mut(&mut self) -> &mut ReportDefinition {
        &mut self.definition
    }

    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    /// Checks the definition without touching the records.
    pub fn validate(&self) -> Result<()> {
        if self.definition.has_subtotals() && !self.definition.is_grouped() {
            return Err(ReportError::SubtotalsRequireGrouping);
        }
        Ok(())
    }

    /// Groups the records and computes every aggregate table.
    pub fn prepare(&self) -> Result<PreparedReport<'a>> {
        self.validate()?;

        let definition = &self.definition;
        let fields = definition.grouping.levels();
        let refs: Vec<&'a Record> = self.records.iter().collect();

        log::debug!(
            "preparing report: {} records, {} grouping levels",
            refs.len(),
            fields.len()
        );

        let tree = group(&refs, &fields);
        let mut prepared = PreparedReport {
            grouping: fields.iter().map(|f| f.to_string()).collect(),
            ..PreparedReport::default()
        };

        if refs.is_empty() {
            log::debug!("empty collection, no aggregates evaluated");
            prepared.tree = tree;
            return Ok(prepared);
        }

        if definition.has_subtotals() {
            prepared.subtotals =
                compute_subtotals(&tree, &definition.subtotals, &definition.columns, fields.len())?;
            prepared.parent_subtotals = compute_parent_subtotals(
                &refs,
                &fields,
                &definition.subtotals,
                &definition.columns,
            )?;
        }

        if definition.has_totals() {
            prepared.totals = compute_totals(&tree, &definition.totals, &definition.columns)?;
        }

        log::debug!(
            "prepared report: {} leaf groups, {} subtotal paths, {} parent paths, {} total rows",
            tree.leaf_count(),
            prepared.subtotals.len(),
            prepared.parent_subtotals.len(),
            prepared.totals.len()
        );

        prepared.tree = tree;
        Ok(prepared)
    }
}

/// Prepares `records` with `definition` in one call.
pub fn prepare_report<'a>(
    records: &'a [Record],
    definition: ReportDefinition,
) -> Result<PreparedReport<'a>> {
    ReportEngine::new(records, definition).prepare()
}
