//! Column descriptors and dataset summary tables.

use crate::data::{DType, Table, Value};
use crate::impute::mode;
use crate::sampler::{resolve_kind, ScalarKind};
use crate::transform::percentile;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub dtype: DType,
    pub kind: ScalarKind,
    pub cardinality: usize,
    pub null_fraction: f64,
}

pub fn describe_columns(table: &Table, sample_size: usize) -> Vec<ColumnDescriptor> {
    table
        .columns()
        .iter()
        .map(|c| ColumnDescriptor {
            name: c.name.clone(),
            dtype: c.dtype,
            kind: resolve_kind(c, sample_size),
            cardinality: c.cardinality(),
            null_fraction: c.null_fraction(),
        })
        .collect()
}

/// count / mean / std / quartiles of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// count / unique / top / freq of a text column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

pub fn describe_numeric(table: &Table) -> Vec<NumericSummary> {
    table
        .columns()
        .iter()
        .filter(|c| c.dtype.is_numeric())
        .map(|c| {
            let mut values = c.numeric_values();
            values.sort_by(f64::total_cmp);
            let n = values.len();
            let mean = (n > 0).then(|| values.iter().sum::<f64>() / n as f64);
            let std = mean.filter(|_| n > 1).map(|m| {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                (ss / (n - 1) as f64).sqrt()
            });
            let quantile = |p: f64| (n > 0).then(|| percentile(&values, p));
            NumericSummary {
                column: c.name.clone(),
                count: n,
                mean,
                std,
                min: values.first().copied(),
                p25: quantile(0.25),
                p50: quantile(0.5),
                p75: quantile(0.75),
                max: values.last().copied(),
            }
        })
        .collect()
}

pub fn describe_categorical(table: &Table) -> Vec<CategoricalSummary> {
    table
        .columns()
        .iter()
        .filter(|c| !c.dtype.is_numeric())
        .map(|c| {
            let labels: Vec<String> = c
                .values
                .iter()
                .filter(|v| !v.is_null())
                .map(Value::to_string)
                .collect();
            let top = mode(labels.iter().cloned());
            let freq = top
                .as_ref()
                .map(|t| labels.iter().filter(|l| *l == t).count())
                .unwrap_or(0);
            CategoricalSummary {
                column: c.name.clone(),
                count: labels.len(),
                unique: c.cardinality(),
                top,
                freq,
            }
        })
        .collect()
}
