//! Partition of cleaned columns into plotting roles.

use crate::data::Table;
use serde::Serialize;

/// The single primary role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Categorical,
    Continuous,
    Other,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Categorical => "categorical",
            Role::Continuous => "continuous",
            Role::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Column names grouped by role, each list in table order.
///
/// `categorical`, `continuous` and `other` are disjoint and together cover
/// every column. `hue` is a subset of `categorical`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolePartition {
    pub categorical: Vec<String>,
    pub continuous: Vec<String>,
    pub hue: Vec<String>,
    pub other: Vec<String>,
}

impl RolePartition {
    pub fn role_of(&self, column: &str) -> Option<Role> {
        let has = |list: &[String]| list.iter().any(|c| c == column);
        if has(&self.categorical) {
            Some(Role::Categorical)
        } else if has(&self.continuous) {
            Some(Role::Continuous)
        } else if has(&self.other) {
            Some(Role::Other)
        } else {
            None
        }
    }

    pub fn is_hue(&self, column: &str) -> bool {
        self.hue.iter().any(|c| c == column)
    }
}

/// Classify every column of a cleaned table.
///
/// A column with at most `categorical_max` distinct values is categorical
/// whatever its dtype. Numeric columns above that are continuous; anything
/// else is other. Categorical columns with fewer than `hue_max` distinct
/// values are also hue candidates.
pub fn classify(table: &Table, categorical_max: usize, hue_max: usize) -> RolePartition {
    let mut partition = RolePartition::default();
    for column in table.columns() {
        let cardinality = column.cardinality();
        let name = column.name.clone();
        if cardinality <= categorical_max {
            if cardinality < hue_max {
                partition.hue.push(name.clone());
            }
            partition.categorical.push(name);
        } else if column.dtype.is_numeric() {
            partition.continuous.push(name);
        } else {
            partition.other.push(name);
        }
    }
    partition
}
