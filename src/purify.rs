//! Sentinel normalisation and high-null column removal.

use crate::data::{Column, DType, Table, Value};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PurifyReport {
    /// Cells rewritten from a sentinel token to null.
    pub replaced: usize,
    /// Columns removed for exceeding the null threshold, in table order.
    pub dropped: Vec<String>,
}

fn normalize_sentinels(mut column: Column, sentinels: &[String]) -> (Column, usize) {
    // Only the coercer produces `Text`; ingestion leaves strings as `Object`.
    // Lower-cased output such as "unknown" from "Unknown" must not be nulled
    // on a second pass.
    if column.dtype == DType::Text {
        return (column, 0);
    }
    let mut replaced = 0;
    for value in column.values.iter_mut() {
        if let Value::Text(s) = value {
            if sentinels.iter().any(|t| t == s) {
                *value = Value::Null;
                replaced += 1;
            }
        }
    }
    (column, replaced)
}

/// Replace sentinel tokens with null, then drop every column whose null
/// fraction is strictly above `null_threshold`. Normalisation runs first so
/// sentinel-laden columns are counted correctly.
///
/// Every raw string column is scanned. Columns already coerced to canonical
/// `Text` are passed through unchanged.
pub fn purify(table: Table, sentinels: &[String], null_threshold: f64) -> (Table, PurifyReport) {
    let mut report = PurifyReport::default();
    let mut kept = Vec::with_capacity(table.n_cols());

    for column in table.into_columns() {
        let (column, replaced) = normalize_sentinels(column, sentinels);
        report.replaced += replaced;

        let fraction = column.null_fraction();
        if fraction > null_threshold {
            debug!(column = %column.name, fraction, "dropping high-null column");
            report.dropped.push(column.name);
        } else {
            kept.push(column);
        }
    }

    let table = Table::from_stage(kept);
    (table, report)
}
