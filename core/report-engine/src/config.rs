//! FILENAME: core/report-engine/src/config.rs
//! JSON-loadable report configuration.
//!
//! A `ReportConfig` describes everything that can be expressed without code:
//! columns, grouping levels and builtin aggregates. It resolves into a
//! `ReportDefinition`, to which custom callables can then be attached.
//!
//! ```json
//! {
//!   "columns": [{ "name": "score", "title": "Score" }],
//!   "groupBy": [{ "field": "school", "level": 0 }],
//!   "subtotals": [{ "column": "score", "function": "sum" }],
//!   "totals": [{ "column": "score", "function": "avg", "row": 1 }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::definition::{AggregateFunction, Column, ReportDefinition};
use crate::error::{ReportError, Result};

/// One grouping level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLevelConfig {
    pub field: String,

    /// Level index; omitted means "next free level".
    #[serde(default)]
    pub level: Option<usize>,
}

/// One builtin aggregate on one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub column: String,

    /// Builtin name: "sum", "avg", "max" or "min".
    pub function: String,

    #[serde(default)]
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub group_by: Vec<GroupLevelConfig>,

    #[serde(default)]
    pub subtotals: Vec<AggregateConfig>,

    #[serde(default)]
    pub totals: Vec<AggregateConfig>,
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolves the configuration into a definition.
    ///
    /// Fails on unknown function names, out-of-range rows, a field grouped
    /// twice, and subtotals without any grouping level.
    pub fn into_definition(self) -> Result<ReportDefinition> {
        let mut definition = ReportDefinition::new();

        for column in self.columns {
            definition.column(column);
        }

        let mut next_level = 0;
        for group in self.group_by {
            if definition.grouping.contains(&group.field) {
                return Err(ReportError::Config(format!(
                    "field '{}' is grouped more than once",
                    group.field
                )));
            }
            let level = group.level.unwrap_or(next_level);
            next_level = next_level.max(level + 1);
            definition.group_by(group.field, level);
        }

        for aggregate in self.subtotals {
            let function: AggregateFunction = aggregate.function.parse()?;
            definition.subtotal(aggregate.row, aggregate.column, function)?;
        }

        for aggregate in self.totals {
            let function: AggregateFunction = aggregate.function.parse()?;
            definition.total(aggregate.row, aggregate.column, function)?;
        }

        if definition.has_subtotals() && !definition.is_grouped() {
            return Err(ReportError::SubtotalsRequireGrouping);
        }

        log::debug!(
            "resolved report config: {} columns, {} levels",
            definition.columns.len(),
            definition.grouping.depth()
        );
        Ok(definition)
    }
}

impl TryFrom<ReportConfig> for ReportDefinition {
    type Error = ReportError;

    fn try_from(config: ReportConfig) -> Result<Self> {
        config.into_definition()
    }
}
