//! FILENAME: core/report-engine/src/tests.rs
//! PURPOSE: Unit tests for report preparation and configuration loading.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::ReportConfig;
use crate::definition::{AggregateFunction, FunctionSpec, ReportDefinition};
use crate::engine::{prepare_report, ReportEngine};
use crate::error::ReportError;
use crate::grouping::GroupedTree;
use crate::value::{path, Record, Value};

fn scores() -> Vec<Record> {
    vec![
        Record::new().with("school", "Yale").with("score", 98),
        Record::new().with("school", "Yale").with("score", 89),
        Record::new().with("school", "Harvard").with("score", 90),
    ]
}

// ========================================
// ENGINE TESTS
// ========================================

#[test]
fn test_prepare_subtotals_without_grouping_fails() {
    let records = scores();
    let mut definition = ReportDefinition::new();
    definition.subtotal(0, "score", AggregateFunction::Sum).unwrap();

    let engine = ReportEngine::new(&records, definition);
    assert!(matches!(engine.validate(), Err(ReportError::SubtotalsRequireGrouping)));
    assert!(matches!(engine.prepare(), Err(ReportError::SubtotalsRequireGrouping)));
}

#[test]
fn test_prepare_grouped_subtotals_and_totals() {
    let records = scores();
    let mut definition = ReportDefinition::new();
    definition.group_by("school", 0);
    definition.subtotal(0, "score", AggregateFunction::Sum).unwrap();
    definition.total(0, "score", AggregateFunction::Max).unwrap();

    let prepared = prepare_report(&records, definition).unwrap();
    assert!(prepared.is_grouped());
    assert_eq!(prepared.depth(), 1);
    assert_eq!(prepared.record_count(), 3);
    assert_eq!(
        prepared.subtotals.value(&path(["Harvard"]), 0, "score", "sum"),
        Some(&Value::Number(90.0))
    );
    assert!(prepared.parent_subtotals.is_empty());
    assert_eq!(prepared.totals.value(0, "score"), Some(&Value::Number(98.0)));
}

#[test]
fn test_prepare_ungrouped_totals_only() {
    let records = scores();
    let mut definition = ReportDefinition::new();
    definition.total(0, "score", AggregateFunction::Min).unwrap();

    let prepared = prepare_report(&records, definition).unwrap();
    assert!(!prepared.is_grouped());
    assert!(prepared.tree.is_leaf());
    assert!(prepared.subtotals.is_empty());
    assert_eq!(prepared.totals.value(0, "score"), Some(&Value::Number(89.0)));
}

#[test]
fn test_prepare_empty_input_evaluates_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut definition = ReportDefinition::new();
    definition.group_by("school", 0);
    definition
        .subtotal(
            0,
            "score",
            FunctionSpec::custom(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Empty)
            }),
        )
        .unwrap();
    definition.total(0, "score", AggregateFunction::Max).unwrap();

    let prepared = prepare_report(&[], definition).unwrap();
    assert_eq!(prepared.tree, GroupedTree::Leaf(Vec::new()));
    assert!(prepared.is_empty());
    assert!(prepared.subtotals.is_empty());
    assert!(prepared.parent_subtotals.is_empty());
    assert!(prepared.totals.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_prepare_is_repeatable() {
    let records = scores();
    let mut definition = ReportDefinition::new();
    definition.group_by("school", 0);
    definition.subtotal(0, "score", AggregateFunction::Avg).unwrap();

    let engine = ReportEngine::new(&records, definition);
    let first = engine.prepare().unwrap();
    let second = engine.prepare().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_definition_changes_apply_on_next_prepare() {
    let records = scores();
    let mut engine = ReportEngine::new(&records, ReportDefinition::new());
    assert!(engine.prepare().unwrap().totals.is_empty());

    engine
        .definition_mut()
        .total(0, "score", AggregateFunction::Sum)
        .unwrap();
    let prepared = engine.prepare().unwrap();
    assert_eq!(prepared.totals.value(0, "score"), Some(&Value::Number(277.0)));
}

// ========================================
// CONFIG TESTS
// ========================================

#[test]
fn test_config_resolves_definition() {
    let config = ReportConfig::from_json(
        r#"{
            "columns": [{ "name": "score", "title": "Score" }],
            "groupBy": [{ "field": "school", "level": 0 }],
            "subtotals": [{ "column": "score", "function": "sum" }],
            "totals": [{ "column": "score", "function": "avg", "row": 1 }]
        }"#,
    )
    .unwrap();

    let definition = config.into_definition().unwrap();
    assert_eq!(definition.columns[0].title, "Score");
    assert_eq!(definition.grouping.levels(), vec!["school"]);
    assert_eq!(definition.subtotals.get(0).unwrap()["score"].key(), Some("sum"));
    assert!(definition.totals.get(0).is_none());
    assert_eq!(definition.totals.get(1).unwrap()["score"].key(), Some("avg"));
}

#[test]
fn test_config_levels_default_to_declaration_order() {
    let config = ReportConfig::from_json(
        r#"{ "groupBy": [{ "field": "school" }, { "field": "course" }] }"#,
    )
    .unwrap();

    let definition = config.into_definition().unwrap();
    assert_eq!(definition.grouping.levels(), vec!["school", "course"]);
}

#[test]
fn test_config_unknown_function() {
    let config = ReportConfig::from_json(
        r#"{ "totals": [{ "column": "score", "function": "median" }] }"#,
    )
    .unwrap();

    let err = config.into_definition().unwrap_err();
    assert!(matches!(err, ReportError::UnknownAggregate(ref name) if name == "median"));
}

#[test]
fn test_config_row_out_of_range() {
    let config = ReportConfig::from_json(
        r#"{ "totals": [{ "column": "score", "function": "sum", "row": 1000 }] }"#,
    )
    .unwrap();

    let err = config.into_definition().unwrap_err();
    assert!(matches!(err, ReportError::RowIndexOutOfRange { index: 1000, .. }));
}

#[test]
fn test_config_subtotals_without_grouping() {
    let config = ReportConfig::from_json(
        r#"{ "subtotals": [{ "column": "score", "function": "max" }] }"#,
    )
    .unwrap();

    assert!(matches!(
        config.into_definition(),
        Err(ReportError::SubtotalsRequireGrouping)
    ));
}

#[test]
fn test_config_field_grouped_twice() {
    let config = ReportConfig::from_json(
        r#"{ "groupBy": [{ "field": "school", "level": 0 }, { "field": "school", "level": 1 }] }"#,
    )
    .unwrap();

    assert!(matches!(config.into_definition(), Err(ReportError::Config(_))));
}

#[test]
fn test_config_malformed_json() {
    let err = ReportConfig::from_json("{ not json").unwrap_err();
    assert!(matches!(err, ReportError::Json(_)));
}

#[test]
fn test_config_json_round_trip() {
    let config = ReportConfig::from_json(
        r#"{ "groupBy": [{ "field": "world", "level": 0 }], "totals": [{ "column": "power_level", "function": "sum" }] }"#,
    )
    .unwrap();

    let json = config.to_json().unwrap();
    assert_eq!(ReportConfig::from_json(&json).unwrap(), config);
}
