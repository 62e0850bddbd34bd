//! FILENAME: core/report-engine/src/dispatch.rs
//! Function dispatch: turns a `FunctionSpec` into computed values.
//!
//! Custom callables receive exactly the context their variant declares.
//! Composite specs are evaluated member by member and yield one entry per
//! member; nothing is merged across members.

use crate::definition::{Column, CustomAggregate, FunctionSpec, PostProcess};
use crate::error::{ReportError, Result};
use crate::value::{GroupValue, Record, Value};

/// One evaluated function: the key it is stored under and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub key: String,
    pub value: Value,
}

/// Evaluates `spec` for `column` over `data`.
///
/// `path` is the group path of the data slice (empty for totals); callables
/// that ask for path context receive its last element.
pub fn evaluate(
    spec: &FunctionSpec,
    data: &[&Record],
    column: &Column,
    path: &[GroupValue],
) -> Result<Vec<Evaluated>> {
    let mut out = Vec::with_capacity(1);
    evaluate_into(spec, data, column, path.last(), &mut out)?;
    Ok(out)
}

/// Evaluates `spec` down to a single value: the last member's value for
/// composite specs, `Value::Empty` for an empty composite.
pub fn evaluate_value(
    spec: &FunctionSpec,
    data: &[&Record],
    column: &Column,
    path: &[GroupValue],
) -> Result<Value> {
    Ok(evaluate(spec, data, column, path)?
        .pop()
        .map(|e| e.value)
        .unwrap_or_default())
}

fn evaluate_into(
    spec: &FunctionSpec,
    data: &[&Record],
    column: &Column,
    tail: Option<&GroupValue>,
    out: &mut Vec<Evaluated>,
) -> Result<()> {
    match spec {
        FunctionSpec::Builtin(function) => {
            out.push(Evaluated {
                key: function.name().to_string(),
                value: function.apply(data, &column.name),
            });
        }
        FunctionSpec::Custom { name, function } => {
            let value = match function {
                CustomAggregate::ZeroContext(f) => f(data),
                CustomAggregate::WithColumn(f) => f(data, column),
                CustomAggregate::WithPath(f) => f(data, column, tail),
            }
            .map_err(ReportError::Callable)?;
            out.push(Evaluated {
                key: name.clone(),
                value,
            });
        }
        FunctionSpec::Chained(function, post) => {
            let result = function.apply(data, &column.name);
            let value = match post {
                PostProcess::ZeroContext(f) => f(&result),
                PostProcess::WithColumn(f) => f(&result, column),
                PostProcess::WithPath(f) => f(&result, column, tail),
            }
            .map_err(ReportError::Callable)?;
            out.push(Evaluated {
                key: function.name().to_string(),
                value,
            });
        }
        FunctionSpec::Composite(members) => {
            for member in members {
                evaluate_into(member, data, column, tail, out)?;
            }
        }
    }
    log::trace!("evaluated column '{}' ({} entries)", column.name, out.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregateFunction;
    use crate::value::path;

    fn scores() -> Vec<Record> {
        vec![
            Record::new().with("school", "Yale").with("score", 98),
            Record::new().with("school", "Yale").with("score", 89),
        ]
    }

    #[test]
    fn test_builtin_dispatch() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::new("score");

        let out = evaluate(&AggregateFunction::Sum.into(), &refs, &column, &[]).unwrap();
        assert_eq!(
            out,
            vec![Evaluated { key: "sum".to_string(), value: Value::Number(187.0) }]
        );
    }

    #[test]
    fn test_custom_shapes_receive_their_context() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::titled("score", "Score");
        let group = path(["Yale"]);

        let zero = FunctionSpec::custom(|rows| Ok(Value::from(rows.len() as f64)));
        assert_eq!(evaluate_value(&zero, &refs, &column, &group).unwrap(), Value::Number(2.0));

        let with_column = FunctionSpec::custom_with_column(|_, col| Ok(Value::text(col.title.clone())));
        assert_eq!(evaluate_value(&with_column, &refs, &column, &group).unwrap(), Value::text("Score"));

        let with_path = FunctionSpec::custom_with_path(|_, col, tail| {
            let tail = tail.map(GroupValue::label).unwrap_or_default();
            Ok(Value::text(format!("{} {}", tail, col.name)))
        });
        assert_eq!(evaluate_value(&with_path, &refs, &column, &group).unwrap(), Value::text("Yale score"));
        assert_eq!(evaluate_value(&with_path, &refs, &column, &[]).unwrap(), Value::text(" score"));
    }

    #[test]
    fn test_chained_post_process() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::new("score");

        let spec = FunctionSpec::chained(AggregateFunction::Avg, |avg| {
            Ok(Value::text(format!("Average: {}", avg)))
        });
        let out = evaluate(&spec, &refs, &column, &[]).unwrap();
        assert_eq!(out[0].key, "avg");
        assert_eq!(out[0].value, Value::text("Average: 93.5"));

        let spec = FunctionSpec::chained_with_path(AggregateFunction::Max, |max, _, tail| {
            Ok(Value::text(format!("{}: {}", tail.map(GroupValue::label).unwrap_or_default(), max)))
        });
        let value = evaluate_value(&spec, &refs, &column, &path(["Yale"])).unwrap();
        assert_eq!(value, Value::text("Yale: 98"));
    }

    #[test]
    fn test_chained_with_column_receives_metadata() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::titled("score", "Score");

        let spec = FunctionSpec::chained_with_column(AggregateFunction::Max, |max, col| {
            Ok(Value::text(format!("{} {}", col.title, max)))
        });
        let out = evaluate(&spec, &refs, &column, &path(["Yale"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "max");
        assert_eq!(out[0].value, Value::text("Score 98"));
    }

    #[test]
    fn test_composite_members_stay_separate() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::new("score");

        let spec = FunctionSpec::Composite(vec![
            AggregateFunction::Sum.into(),
            AggregateFunction::Max.into(),
            AggregateFunction::Sum.into(),
        ]);
        let out = evaluate(&spec, &refs, &column, &[]).unwrap();
        let keys: Vec<&str> = out.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["sum", "max", "sum"]);
        assert_eq!(evaluate_value(&spec, &refs, &column, &[]).unwrap(), Value::Number(187.0));
        assert_eq!(
            evaluate_value(&FunctionSpec::Composite(Vec::new()), &refs, &column, &[]).unwrap(),
            Value::Empty
        );
    }

    #[test]
    fn test_callable_error_propagates_unmodified() {
        let records = scores();
        let refs: Vec<&Record> = records.iter().collect();
        let column = Column::new("score");

        let spec = FunctionSpec::custom(|_| Err("boom".into()));
        let err = evaluate(&spec, &refs, &column, &[]).unwrap_err();
        assert!(matches!(err, ReportError::Callable(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
