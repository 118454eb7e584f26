//! Row-identifier detection.
//!
//! A column whose distinct non-null count equals the row count keys every
//! row and says nothing about distributions, so it is dropped before
//! analysis. At most one column is ever removed.

use crate::data::Table;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "columns", rename_all = "snake_case")]
pub enum IdentifierDecision {
    /// No column had all-unique values.
    NoCandidates,
    /// This column was removed.
    Dropped(String),
    /// Several all-unique columns and no single one named like an id.
    Ambiguous(Vec<String>),
}

fn is_name_suggestive(name: &str) -> bool {
    name.to_lowercase().contains("id")
}

/// Columns whose every value is distinct.
pub fn identifier_candidates(table: &Table) -> Vec<String> {
    let rows = table.n_rows();
    if rows == 0 {
        return Vec::new();
    }
    table
        .columns()
        .iter()
        .filter(|c| c.cardinality() == rows)
        .map(|c| c.name.clone())
        .collect()
}

/// Decide which column, if any, is the row identifier.
pub fn detect_identifier(table: &Table) -> IdentifierDecision {
    let candidates = identifier_candidates(table);
    match candidates.len() {
        0 => IdentifierDecision::NoCandidates,
        1 => IdentifierDecision::Dropped(candidates[0].clone()),
        _ => {
            let named: Vec<&String> = candidates
                .iter()
                .filter(|c| is_name_suggestive(c))
                .collect();
            if named.len() == 1 {
                IdentifierDecision::Dropped(named[0].clone())
            } else {
                IdentifierDecision::Ambiguous(candidates)
            }
        }
    }
}

/// Remove the identifier column, if one can be singled out.
pub fn drop_identifier(table: Table) -> (Table, IdentifierDecision) {
    let decision = detect_identifier(&table);
    debug!(?decision, "identifier detection");
    let table = match &decision {
        IdentifierDecision::Dropped(name) => table.retain_columns(|c| &c.name != name),
        _ => table,
    };
    (table, decision)
}
