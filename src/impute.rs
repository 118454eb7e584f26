//! Type coercion and null imputation.
//!
//! Each column goes through exactly one branch chosen by its resolved scalar
//! kind. No branch fails: values that cannot be coerced become null and are
//! imputed like any other gap, so every column leaves fully populated.

use crate::data::{Column, DType, Table, Value};
use crate::parser::{parse_bool, parse_integer, parse_number};
use crate::sampler::{resolve_kind, ScalarKind};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoercionReport {
    /// Resolved kind per column, in table order.
    pub kinds: Vec<(String, ScalarKind)>,
    /// Cells that were null before imputation, including coercion failures.
    pub imputed: usize,
    /// Non-null cells a parser rejected.
    pub unparseable: usize,
}

/// Most frequent item; ties go to the one seen first. `None` for no items.
pub fn mode<T, I>(items: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (order, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(item, _)| item)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

struct Coerced {
    column: Column,
    imputed: usize,
    unparseable: usize,
}

fn coerce_text(column: Column) -> Coerced {
    let name = column.name;
    let lowered: Vec<Option<String>> = column
        .values
        .into_iter()
        .map(|v| match v {
            Value::Null => None,
            other => Some(other.to_string().to_lowercase()),
        })
        .collect();

    let imputed = lowered.iter().filter(|v| v.is_none()).count();
    let fill = mode(lowered.iter().flatten().cloned()).unwrap_or_default();
    let values = lowered
        .into_iter()
        .map(|v| Value::Text(v.unwrap_or_else(|| fill.clone())))
        .collect();

    Coerced {
        column: Column::new(name, DType::Text, values),
        imputed,
        unparseable: 0,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::Float(f) if *f == 0.0 => Some(false),
        Value::Float(f) if *f == 1.0 => Some(true),
        Value::Text(s) => parse_bool(s).or_else(|| match parse_integer(s) {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        }),
        _ => None,
    }
}

fn coerce_bool(column: Column) -> Coerced {
    let unparseable = column
        .values
        .iter()
        .filter(|v| !v.is_null() && to_bool(v).is_none())
        .count();
    let flags: Vec<Option<bool>> = column.values.iter().map(to_bool).collect();

    let imputed = flags.iter().filter(|f| f.is_none()).count();
    let fill = mode(flags.iter().flatten().copied()).unwrap_or(false);
    let values = flags
        .into_iter()
        .map(|f| Value::Int(i64::from(f.unwrap_or(fill))))
        .collect();

    Coerced {
        column: Column::new(column.name, DType::Int, values),
        imputed,
        unparseable,
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(*i),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Float(f) if f.is_finite() => Value::Float(*f),
        Value::Text(s) => parse_integer(s)
            .map(Value::Int)
            .or_else(|| parse_number(s).map(Value::Float))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn coerce_numeric(column: Column) -> Coerced {
    let numbers: Vec<Value> = column.values.iter().map(to_number).collect();
    let unparseable = column
        .values
        .iter()
        .zip(&numbers)
        .filter(|(before, after)| !before.is_null() && after.is_null())
        .count();

    if numbers.iter().all(|v| matches!(v, Value::Int(_))) {
        return Coerced {
            column: Column::new(column.name, DType::Int, numbers),
            imputed: 0,
            unparseable,
        };
    }

    let present: Vec<f64> = numbers.iter().filter_map(Value::as_f64).collect();
    let fill = mean(&present).unwrap_or(0.0);
    let imputed = numbers.len() - present.len();
    let values = numbers
        .iter()
        .map(|v| Value::Float(v.as_f64().unwrap_or(fill)))
        .collect();

    Coerced {
        column: Column::new(column.name, DType::Float, values),
        imputed,
        unparseable,
    }
}

/// Coerce one column according to `kind`.
pub fn coerce_column(column: Column, kind: ScalarKind) -> (Column, usize, usize) {
    let Coerced {
        column,
        imputed,
        unparseable,
    } = match kind {
        ScalarKind::Text => coerce_text(column),
        ScalarKind::Boolean => coerce_bool(column),
        ScalarKind::Number => coerce_numeric(column),
    };
    (column, imputed, unparseable)
}

/// Give every column a canonical type and fill every null.
///
/// Afterwards each column is `Text`, `Int` (including 1/0 booleans) or
/// `Float`, and contains no nulls.
pub fn coerce_and_impute(table: Table, sample_size: usize) -> (Table, CoercionReport) {
    let mut report = CoercionReport::default();
    let mut columns = Vec::with_capacity(table.n_cols());

    for column in table.into_columns() {
        let kind = resolve_kind(&column, sample_size);
        let name = column.name.clone();
        let (column, imputed, unparseable) = coerce_column(column, kind);
        debug!(column = %name, ?kind, imputed, unparseable, "coerced column");

        report.kinds.push((name, kind));
        report.imputed += imputed;
        report.unparseable += unparseable;
        columns.push(column);
    }

    let table = Table::from_stage(columns);
    (table, report)
}
