//! FILENAME: core/report-engine/src/error.rs

use thiserror::Error;

/// Error raised by a caller-supplied aggregate or post-process callable.
pub type CallableError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Subtotals only work with grouped result sets")]
    SubtotalsRequireGrouping,

    #[error("Aggregate row index {index} exceeds the maximum of {max}")]
    RowIndexOutOfRange { index: usize, max: usize },

    #[error("Unknown aggregate function: {0}")]
    UnknownAggregate(String),

    #[error("Invalid report configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Callable(CallableError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
