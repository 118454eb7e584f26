use crate::error::{AnalysisError, Result};
use crate::parser::{parse_bool, parse_integer, parse_number};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Missing-value markers a dataframe loader recognises at read time.
pub const LOADER_NA_TOKENS: &[&str] = &[
    "", "#N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan",
    "null",
];

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. Booleans map to 1/0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null | Value::Text(_) => None,
        }
    }

    /// Hashable identity used for distinct counting and grouping.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::Bool(b) => Some(ValueKey::Bool(*b)),
            Value::Int(i) => Some(ValueKey::Int(*i)),
            Value::Float(f) => {
                // 1.0 and 1 are the same distinct value; -0.0 folds onto 0.0
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(ValueKey::Int(*f as i64))
                } else {
                    Some(ValueKey::Float(f.to_bits()))
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(u64),
}

/// Declared column type.
///
/// `Object` is the raw, loader-assigned tag for anything that was not cleanly
/// numeric or boolean. `Text` only appears once a column has been cleaned into
/// canonical lower-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int,
    Float,
    Bool,
    Text,
    Object,
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int | DType::Float | DType::Bool)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Share of null cells; an empty column has no nulls.
    pub fn null_fraction(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.values.len() as f64
        }
    }

    /// Count of distinct non-null values.
    pub fn cardinality(&self) -> usize {
        self.values
            .iter()
            .filter_map(Value::key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Non-null numeric values in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }
}

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(AnalysisError::Ingestion(format!(
                    "Column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(AnalysisError::Ingestion(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Reassemble columns taken out of a valid table by a cleaning stage.
    /// Stages rewrite values in place or drop whole columns, never rename or
    /// resize, so lengths and names are not checked again.
    pub(crate) fn from_stage(columns: Vec<Column>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Keep only the columns for which `keep` returns true, preserving order.
    pub fn retain_columns<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&Column) -> bool,
    {
        self.columns.retain(keep);
        self
    }

    /// Build a table from raw string cells, assigning each column a
    /// best-effort dtype the way a dataframe loader would.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() {
            return Err(AnalysisError::Ingestion("Data has no columns".to_string()));
        }
        if rows.is_empty() {
            return Err(AnalysisError::Ingestion(
                "Data must contain at least one data row".to_string(),
            ));
        }

        let names = dedupe_headers(headers);
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.into_iter().enumerate() {
            let mut cells = Vec::with_capacity(rows.len());
            for (row_idx, row) in rows.iter().enumerate() {
                let cell = row.get(idx).ok_or_else(|| {
                    AnalysisError::Ingestion(format!(
                        "Row {} has {} fields, expected at least {}",
                        row_idx + 1,
                        row.len(),
                        idx + 1
                    ))
                })?;
                cells.push(cell.as_str());
            }
            columns.push(infer_column(name, &cells));
        }

        Table::new(columns)
    }

    /// Read a table from CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::from_rows(headers, rows)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    /// Create a table from a JSON array of objects. Keys missing from an
    /// object become nulls.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value.as_array().ok_or_else(|| {
            AnalysisError::Ingestion("Input data must be a JSON array of objects".to_string())
        })?;

        if array.is_empty() {
            return Err(AnalysisError::Ingestion(
                "Input data array is empty".to_string(),
            ));
        }

        let mut objects = Vec::with_capacity(array.len());
        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item.as_object().ok_or_else(|| {
                AnalysisError::Ingestion("Items in array must be objects".to_string())
            })?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            objects.push(obj);
        }

        let mut columns = Vec::with_capacity(headers.len());
        for header in headers {
            let mut values = Vec::with_capacity(objects.len());
            for obj in &objects {
                let cell = match obj.get(&header) {
                    Some(JsonValue::String(s)) => Value::Text(s.clone()),
                    Some(JsonValue::Number(n)) => match n.as_i64() {
                        Some(i) => Value::Int(i),
                        None => n.as_f64().map_or(Value::Null, Value::Float),
                    },
                    Some(JsonValue::Bool(b)) => Value::Bool(*b),
                    Some(JsonValue::Null) | None => Value::Null,
                    Some(_) => {
                        return Err(AnalysisError::Ingestion(format!(
                            "Unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                values.push(cell);
            }
            columns.push(unify_column(header, values));
        }

        Table::new(columns)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json(&value)
    }
}

/// Rename empty and repeated headers the way dataframe loaders do
/// (`Unnamed: 3`, `a.1`).
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

fn infer_column(name: String, cells: &[&str]) -> Column {
    let present: Vec<&str> = cells
        .iter()
        .copied()
        .filter(|c| !LOADER_NA_TOKENS.contains(c))
        .collect();

    if !present.is_empty() && present.iter().all(|c| parse_integer(c).is_some()) {
        let values = cells_to_values(cells, |s| parse_integer(s).map_or(Value::Null, Value::Int));
        return Column::new(name, DType::Int, values);
    }

    if !present.is_empty() && present.iter().all(|c| parse_number(c).is_some()) {
        let values = cells_to_values(cells, |s| parse_number(s).map_or(Value::Null, Value::Float));
        return Column::new(name, DType::Float, values);
    }

    if !present.is_empty() && present.iter().all(|c| parse_bool(c).is_some()) {
        let values = cells_to_values(cells, |s| parse_bool(s).map_or(Value::Null, Value::Bool));
        return Column::new(name, DType::Bool, values);
    }

    let values = cells_to_values(cells, |s| Value::Text(s.to_string()));
    Column::new(name, DType::Object, values)
}

fn cells_to_values<F>(cells: &[&str], parse: F) -> Vec<Value>
where
    F: Fn(&str) -> Value,
{
    cells
        .iter()
        .map(|cell| {
            if LOADER_NA_TOKENS.contains(cell) {
                Value::Null
            } else {
                parse(*cell)
            }
        })
        .collect()
}

/// Assign a dtype to already-typed cells (JSON input).
fn unify_column(name: String, values: Vec<Value>) -> Column {
    let mut any_present = false;
    let mut all_int = true;
    let mut all_number = true;
    let mut all_bool = true;
    for value in values.iter().filter(|v| !v.is_null()) {
        any_present = true;
        all_int &= matches!(value, Value::Int(_));
        all_number &= matches!(value, Value::Int(_) | Value::Float(_));
        all_bool &= matches!(value, Value::Bool(_));
    }

    if !any_present {
        return Column::new(name, DType::Object, values);
    }
    if all_int {
        return Column::new(name, DType::Int, values);
    }
    if all_number {
        let values = values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Value::Float(i as f64),
                other => other,
            })
            .collect();
        return Column::new(name, DType::Float, values);
    }
    if all_bool {
        return Column::new(name, DType::Bool, values);
    }
    Column::new(name, DType::Object, values)
}
