//! FILENAME: core/report-layout/src/view.rs
//! Report View - Renderable output for a prepared report.
//!
//! This module walks the grouped tree of a `PreparedReport` and lays it out
//! as a flat sequence of rows in render order. It knows nothing about the
//! target format; an HTML, text or spreadsheet renderer consumes the rows.

use serde::{Deserialize, Serialize};

use report_engine::{
    AggregateCell, AggregateRow, Column, GroupValue, GroupedTree, Path, PreparedReport, Record,
    ReportDefinition, SubtotalTable, TotalRow, Value,
};

// ============================================================================
// OPTIONS
// ============================================================================

/// Layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Text of the single row shown for an empty collection.
    pub empty_text: String,

    /// Flag every second detail row of a group as alternate.
    pub alternate_rows: bool,

    /// Drop grouped fields from the displayed columns.
    pub hide_grouped_columns: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            empty_text: "No records found".to_string(),
            alternate_rows: true,
            hide_grouped_columns: true,
        }
    }
}

// ============================================================================
// ROWS AND CELLS
// ============================================================================

/// The type of a row in the report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRowKind {
    /// Group label, emitted before the group's content.
    GroupHeader,
    /// One input record.
    Detail,
    /// Aggregate row of a leaf group.
    Subtotal,
    /// Aggregate row of an ancestor group, after all of its children.
    ParentSubtotal,
    /// Report-wide aggregate row.
    Total,
    /// Placeholder for an empty collection.
    Empty,
}

/// A single cell of a view row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewCell {
    /// A record field or a total.
    Value(Value),
    /// Subtotal values for one column, keyed by function key.
    Aggregate(AggregateCell),
    /// No value for this column.
    Blank,
}

impl ViewCell {
    /// Display text; aggregate cells join their values with a space.
    pub fn text(&self) -> String {
        match self {
            ViewCell::Value(value) => value.to_string(),
            ViewCell::Aggregate(cell) => cell
                .values()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            ViewCell::Blank => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub kind: ViewRowKind,

    /// Nesting level: the group's level for headers and aggregates, the
    /// grouping depth for detail rows, 0 for totals.
    pub level: usize,

    /// Group path the row belongs to; empty for totals.
    pub path: Path,

    /// Aggregate row index for subtotal, roll-up and total rows.
    pub row_index: Option<usize>,

    /// Header label or empty-collection text.
    pub label: Option<String>,

    /// One cell per displayed column. Empty for headers.
    pub cells: Vec<ViewCell>,

    /// Alternate-row flag for detail rows.
    pub alternate: bool,
}

impl ViewRow {
    fn new(kind: ViewRowKind, level: usize, path: Path) -> Self {
        ViewRow {
            kind,
            level,
            path,
            row_index: None,
            label: None,
            cells: Vec::new(),
            alternate: false,
        }
    }
}

/// Header cell of one displayed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewHeader {
    /// Column title, or the field name when the title is empty.
    pub text: String,

    /// Data type hint for the column's cell formatter.
    pub data_type: Option<String>,

    /// Tooltip text.
    pub help_text: Option<String>,
}

impl From<&Column> for ViewHeader {
    fn from(column: &Column) -> Self {
        let text = if column.title.is_empty() { &column.name } else { &column.title };
        ViewHeader {
            text: text.clone(),
            data_type: column.data_type.clone(),
            help_text: column.help_text.clone(),
        }
    }
}

/// The complete laid-out report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportView {
    /// Displayed columns, in order.
    pub columns: Vec<Column>,

    /// One header cell per displayed column.
    pub header: Vec<ViewHeader>,

    /// Rows in render order.
    pub rows: Vec<ViewRow>,
}

impl ReportView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_of_kind(&self, kind: ViewRowKind) -> impl Iterator<Item = &ViewRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }

    /// Column header texts.
    pub fn headers(&self) -> Vec<&str> {
        self.header.iter().map(|h| h.text.as_str()).collect()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Lays out `prepared` using the columns of `definition`.
pub fn build_view(
    prepared: &PreparedReport<'_>,
    definition: &ReportDefinition,
    options: &LayoutOptions,
) -> ReportView {
    let columns: Vec<Column> = definition
        .columns
        .iter()
        .filter(|c| !(options.hide_grouped_columns && prepared.grouping.contains(&c.name)))
        .cloned()
        .collect();

    let mut builder = ViewBuilder {
        prepared,
        columns: &columns,
        options,
        rows: Vec::new(),
    };

    if prepared.is_empty() {
        let mut row = ViewRow::new(ViewRowKind::Empty, 0, Path::new());
        row.label = Some(options.empty_text.clone());
        builder.rows.push(row);
    } else {
        builder.walk(&prepared.tree, &mut Path::new());
        builder.push_totals();
    }

    let rows = builder.rows;
    log::debug!("laid out {} rows over {} columns", rows.len(), columns.len());
    let header = columns.iter().map(ViewHeader::from).collect();
    ReportView {
        columns,
        header,
        rows,
    }
}

struct ViewBuilder<'v, 'p> {
    prepared: &'v PreparedReport<'p>,
    columns: &'v [Column],
    options: &'v LayoutOptions,
    rows: Vec<ViewRow>,
}

impl<'v, 'p> ViewBuilder<'v, 'p> {
    fn walk(&mut self, tree: &GroupedTree<'p>, path: &mut Path) {
        let prepared = self.prepared;
        match tree {
            GroupedTree::Leaf(records) => {
                self.push_details(records, path);
                if !path.is_empty() {
                    self.push_aggregates(ViewRowKind::Subtotal, &prepared.subtotals, path);
                }
            }
            GroupedTree::Node(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    self.push_header(key, path);
                    self.walk(child, path);
                    if !child.is_leaf() {
                        self.push_aggregates(
                            ViewRowKind::ParentSubtotal,
                            &prepared.parent_subtotals,
                            path,
                        );
                    }
                    path.pop();
                }
            }
        }
    }

    fn push_header(&mut self, key: &GroupValue, path: &Path) {
        let mut row = ViewRow::new(ViewRowKind::GroupHeader, path.len() - 1, path.clone());
        row.label = Some(key.label());
        self.rows.push(row);
    }

    fn push_details(&mut self, records: &[&Record], path: &Path) {
        for (i, record) in records.iter().enumerate() {
            let mut row = ViewRow::new(ViewRowKind::Detail, path.len(), path.clone());
            row.cells = self
                .columns
                .iter()
                .map(|c| ViewCell::Value(record.get(&c.name).clone()))
                .collect();
            row.alternate = self.options.alternate_rows && i % 2 == 1;
            self.rows.push(row);
        }
    }

    fn push_aggregates(&mut self, kind: ViewRowKind, table: &SubtotalTable, path: &Path) {
        let Some(aggregate_rows) = table.rows(path) else {
            return;
        };
        for (index, aggregate) in aggregate_rows.iter().enumerate() {
            if aggregate.is_empty() {
                continue;
            }
            let mut row = ViewRow::new(kind, path.len() - 1, path.clone());
            row.row_index = Some(index);
            row.cells = self.aggregate_cells(aggregate);
            self.rows.push(row);
        }
    }

    fn aggregate_cells(&self, aggregate: &AggregateRow) -> Vec<ViewCell> {
        self.columns
            .iter()
            .map(|c| match aggregate.get(&c.name) {
                Some(cell) => ViewCell::Aggregate(cell.clone()),
                None => ViewCell::Blank,
            })
            .collect()
    }

    fn total_cells(&self, total: &TotalRow) -> Vec<ViewCell> {
        self.columns
            .iter()
            .map(|c| match total.get(&c.name) {
                Some(value) => ViewCell::Value(value.clone()),
                None => ViewCell::Blank,
            })
            .collect()
    }

    fn push_totals(&mut self) {
        let prepared = self.prepared;
        for (index, total) in prepared.totals.rows().iter().enumerate() {
            if total.is_empty() {
                continue;
            }
            let mut row = ViewRow::new(ViewRowKind::Total, 0, Path::new());
            row.row_index = Some(index);
            row.cells = self.total_cells(total);
            self.rows.push(row);
        }
    }
}
