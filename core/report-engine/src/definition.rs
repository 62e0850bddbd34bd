//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - What the report IS.
//!
//! This module contains the types needed to DESCRIBE a grouped report:
//! display columns, the sparse grouping levels, the aggregate functions and
//! the index-addressed subtotal/total rows. Everything except custom
//! callables is serializable (see `config` for the JSON form).

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CallableError, ReportError, Result};
use crate::value::{GroupValue, OrderedMap, Record, Value};

/// Highest number of aggregate rows a report may address.
pub const MAX_AGGREGATE_ROWS: usize = 256;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Builtin aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 4] = [
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Max,
        AggregateFunction::Min,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
        }
    }
}

impl Default for AggregateFunction {
    fn default() -> Self {
        AggregateFunction::Sum
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFunction {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        AggregateFunction::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ReportError::UnknownAggregate(s.to_string()))
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

/// A display column. This is the column metadata handed to custom callables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    /// Record field shown in this column.
    pub name: String,

    /// Header text.
    #[serde(default)]
    pub title: String,

    /// Optional data type hint ("number", "text", "money", ...).
    #[serde(default)]
    pub data_type: Option<String>,

    #[serde(default)]
    pub help_text: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            ..Column::default()
        }
    }

    pub fn titled(name: impl Into<String>, title: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            title: title.into(),
            ..Column::default()
        }
    }
}

/// Finds the declared column `name`, or a bare column when there is none.
pub(crate) fn resolve_column<'c>(columns: &'c [Column], name: &str) -> Cow<'c, Column> {
    match columns.iter().find(|c| c.name == name) {
        Some(column) => Cow::Borrowed(column),
        None => Cow::Owned(Column::new(name)),
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Grouping fields addressed by level index. Levels may be assigned out of
/// order or with gaps; `levels()` yields them compacted, top to bottom.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingSpec {
    slots: Vec<Option<String>>,
}

impl GroupingSpec {
    pub fn new() -> Self {
        GroupingSpec::default()
    }

    /// Builds a spec whose levels are the given fields in order.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GroupingSpec {
            slots: fields.into_iter().map(|f| Some(f.into())).collect(),
        }
    }

    /// Assigns `field` to `level`, replacing whatever was there.
    pub fn set(&mut self, field: impl Into<String>, level: usize) {
        if self.slots.len() <= level {
            self.slots.resize(level + 1, None);
        }
        let field = field.into();
        if let Some(previous) = self.slots[level].replace(field.clone()) {
            log::warn!("grouping level {} changed from '{}' to '{}'", level, previous, field);
        }
    }

    /// Compacted grouping fields, outermost first.
    pub fn levels(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    pub fn depth(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.slots.iter().flatten().any(|f| f == field)
    }
}

// ============================================================================
// FUNCTION SPECS
// ============================================================================

pub type CallResult = std::result::Result<Value, CallableError>;

type DataFn = dyn Fn(&[&Record]) -> CallResult + Send + Sync;
type DataColumnFn = dyn Fn(&[&Record], &Column) -> CallResult + Send + Sync;
type DataPathFn = dyn Fn(&[&Record], &Column, Option<&GroupValue>) -> CallResult + Send + Sync;
type ResultFn = dyn Fn(&Value) -> CallResult + Send + Sync;
type ResultColumnFn = dyn Fn(&Value, &Column) -> CallResult + Send + Sync;
type ResultPathFn = dyn Fn(&Value, &Column, Option<&GroupValue>) -> CallResult + Send + Sync;

/// A caller-supplied aggregate over a record slice.
///
/// The variant fixes which context the callable receives: nothing, the
/// column metadata, or the column metadata plus the last element of the
/// group path (`None` for totals).
#[derive(Clone)]
pub enum CustomAggregate {
    ZeroContext(Arc<DataFn>),
    WithColumn(Arc<DataColumnFn>),
    WithPath(Arc<DataPathFn>),
}

/// A caller-supplied transformation of a builtin aggregate's result.
#[derive(Clone)]
pub enum PostProcess {
    ZeroContext(Arc<ResultFn>),
    WithColumn(Arc<ResultColumnFn>),
    WithPath(Arc<ResultPathFn>),
}

impl fmt::Debug for CustomAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            CustomAggregate::ZeroContext(_) => "ZeroContext",
            CustomAggregate::WithColumn(_) => "WithColumn",
            CustomAggregate::WithPath(_) => "WithPath",
        };
        write!(f, "CustomAggregate::{}", shape)
    }
}

impl fmt::Debug for PostProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            PostProcess::ZeroContext(_) => "ZeroContext",
            PostProcess::WithColumn(_) => "WithColumn",
            PostProcess::WithPath(_) => "WithPath",
        };
        write!(f, "PostProcess::{}", shape)
    }
}

/// How one column of an aggregate row is computed.
#[derive(Debug, Clone)]
pub enum FunctionSpec {
    /// A builtin applied directly.
    Builtin(AggregateFunction),
    /// A custom callable, stored under `name`.
    Custom { name: String, function: CustomAggregate },
    /// A builtin whose result is handed to a post-process callable.
    Chained(AggregateFunction, PostProcess),
    /// Several specs evaluated independently for the same column.
    Composite(Vec<FunctionSpec>),
}

impl FunctionSpec {
    pub const DEFAULT_CUSTOM_NAME: &'static str = "custom";

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[&Record]) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Custom {
            name: Self::DEFAULT_CUSTOM_NAME.to_string(),
            function: CustomAggregate::ZeroContext(Arc::new(f)),
        }
    }

    pub fn custom_with_column<F>(f: F) -> Self
    where
        F: Fn(&[&Record], &Column) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Custom {
            name: Self::DEFAULT_CUSTOM_NAME.to_string(),
            function: CustomAggregate::WithColumn(Arc::new(f)),
        }
    }

    pub fn custom_with_path<F>(f: F) -> Self
    where
        F: Fn(&[&Record], &Column, Option<&GroupValue>) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Custom {
            name: Self::DEFAULT_CUSTOM_NAME.to_string(),
            function: CustomAggregate::WithPath(Arc::new(f)),
        }
    }

    pub fn chained<F>(builtin: AggregateFunction, f: F) -> Self
    where
        F: Fn(&Value) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Chained(builtin, PostProcess::ZeroContext(Arc::new(f)))
    }

    pub fn chained_with_column<F>(builtin: AggregateFunction, f: F) -> Self
    where
        F: Fn(&Value, &Column) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Chained(builtin, PostProcess::WithColumn(Arc::new(f)))
    }

    pub fn chained_with_path<F>(builtin: AggregateFunction, f: F) -> Self
    where
        F: Fn(&Value, &Column, Option<&GroupValue>) -> CallResult + Send + Sync + 'static,
    {
        FunctionSpec::Chained(builtin, PostProcess::WithPath(Arc::new(f)))
    }

    /// Renames a custom spec. Other specs are returned unchanged.
    pub fn named(self, new_name: impl Into<String>) -> Self {
        match self {
            FunctionSpec::Custom { function, .. } => FunctionSpec::Custom {
                name: new_name.into(),
                function,
            },
            other => other,
        }
    }

    /// Key under which this spec's result is stored in subtotal tables.
    /// Composite specs have no key of their own.
    pub fn key(&self) -> Option<&str> {
        match self {
            FunctionSpec::Builtin(f) | FunctionSpec::Chained(f, _) => Some(f.name()),
            FunctionSpec::Custom { name, .. } => Some(name.as_str()),
            FunctionSpec::Composite(_) => None,
        }
    }
}

impl From<AggregateFunction> for FunctionSpec {
    fn from(f: AggregateFunction) -> Self {
        FunctionSpec::Builtin(f)
    }
}

// ============================================================================
// AGGREGATE ROWS
// ============================================================================

/// One aggregate line: column name to function spec, in definition order.
pub type RowBucket = OrderedMap<String, FunctionSpec>;

/// Sparse, index-addressed aggregate rows. Unused indices below the highest
/// used one are `None` and never evaluated or rendered.
#[derive(Debug, Clone, Default)]
pub struct AggregateRows {
    rows: Vec<Option<RowBucket>>,
}

impl AggregateRows {
    pub fn new() -> Self {
        AggregateRows::default()
    }

    /// Defines `column` on row `index`, padding any gap with empty rows.
    pub fn insert(
        &mut self,
        index: usize,
        column: impl Into<String>,
        spec: impl Into<FunctionSpec>,
    ) -> Result<()> {
        if index >= MAX_AGGREGATE_ROWS {
            return Err(ReportError::RowIndexOutOfRange {
                index,
                max: MAX_AGGREGATE_ROWS - 1,
            });
        }
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, || None);
        }

        let column = column.into();
        let bucket = self.rows[index].get_or_insert_with(RowBucket::default);
        if bucket.insert(column.clone(), spec.into()).is_some() {
            log::warn!("aggregate row {} redefined column '{}'", index, column);
        }
        Ok(())
    }

    /// Number of row slots, including empty ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row defines anything.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.as_ref().map_or(true, |b| b.is_empty()))
    }

    pub fn get(&self, index: usize) -> Option<&RowBucket> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    /// Every slot in index order; gaps yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&RowBucket>)> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_ref()))
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete definition of a grouped report.
#[derive(Debug, Clone, Default)]
pub struct ReportDefinition {
    /// Display columns, in order.
    pub columns: Vec<Column>,

    /// Grouping fields by level.
    pub grouping: GroupingSpec,

    /// Rows evaluated for every group.
    pub subtotals: AggregateRows,

    /// Rows evaluated over the whole collection.
    pub totals: AggregateRows,
}

impl ReportDefinition {
    pub fn new() -> Self {
        ReportDefinition::default()
    }

    pub fn column(&mut self, column: Column) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn group_by(&mut self, field: impl Into<String>, level: usize) -> &mut Self {
        self.grouping.set(field, level);
        self
    }

    pub fn subtotal(
        &mut self,
        row: usize,
        column: impl Into<String>,
        spec: impl Into<FunctionSpec>,
    ) -> Result<&mut Self> {
        self.subtotals.insert(row, column, spec)?;
        Ok(self)
    }

    pub fn total(
        &mut self,
        row: usize,
        column: impl Into<String>,
        spec: impl Into<FunctionSpec>,
    ) -> Result<&mut Self> {
        self.totals.insert(row, column, spec)?;
        Ok(self)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column metadata for `name`; a bare column when it was never declared.
    pub fn column_metadata(&self, name: &str) -> Column {
        resolve_column(&self.columns, name).into_owned()
    }

    pub fn is_grouped(&self) -> bool {
        !self.grouping.is_empty()
    }

    pub fn has_subtotals(&self) -> bool {
        !self.subtotals.is_empty()
    }

    pub fn has_totals(&self) -> bool {
        !self.totals.is_empty()
    }
}
