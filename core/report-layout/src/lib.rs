//! FILENAME: core/report-layout/src/lib.rs
//! Renderer-neutral layout for prepared reports.
//!
//! `report-engine` computes the grouped tree and the aggregate tables; this
//! crate orders them into the rows a renderer draws: group headers, detail
//! rows, subtotal and roll-up rows, and totals.

pub mod view;

pub use view::{
    build_view, LayoutOptions, ReportView, ViewCell, ViewHeader, ViewRow, ViewRowKind,
};
