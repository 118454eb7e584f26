//! Pipeline driver: clean, classify, then plan and render every column.

use crate::config::AnalysisConfig;
use crate::data::Table;
use crate::error::Result;
use crate::identify::{drop_identifier, IdentifierDecision};
use crate::impute::{coerce_and_impute, CoercionReport};
use crate::orchestrate::{orchestrate_categorical, orchestrate_continuous};
use crate::purify::{purify, PurifyReport};
use crate::roles::{classify, Role, RolePartition};
use crate::runtime::{Artifact, Renderer};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

/// What each cleaning stage did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub identifier: IdentifierDecision,
    pub purify: PurifyReport,
    pub coercion: CoercionReport,
}

/// A column whose figure could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFailure {
    pub column: String,
    pub role: Role,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The cleaned table every figure was drawn from
    pub table: Table,
    pub cleaning: CleaningReport,
    pub roles: RolePartition,
    pub categorical_figures: Vec<Artifact>,
    pub continuous_figures: Vec<Artifact>,
    pub other_columns: Vec<String>,
    pub failures: Vec<ColumnFailure>,
}

/// Identifier detection, sentinel purification and coercion, in that order.
///
/// Each stage consumes the previous table and returns a new one. The result
/// has no nulls, and every column is text, integer or float.
pub fn clean(table: Table, config: &AnalysisConfig) -> (Table, CleaningReport) {
    let (table, identifier) = drop_identifier(table);
    let (table, purify) = purify(table, &config.sentinels, config.null_threshold);
    let (table, coercion) = coerce_and_impute(table, config.sample_size);

    info!(
        rows = table.n_rows(),
        cols = table.n_cols(),
        replaced = purify.replaced,
        dropped = purify.dropped.len(),
        imputed = coercion.imputed,
        "table cleaned"
    );

    (
        table,
        CleaningReport {
            identifier,
            purify,
            coercion,
        },
    )
}

/// Run the whole analysis.
///
/// Only an invalid configuration fails here. A column whose figure cannot
/// be rendered is recorded in `failures` and the remaining columns go on.
pub fn analyze<R: Rng + ?Sized>(
    table: Table,
    config: &AnalysisConfig,
    renderer: &dyn Renderer,
    rng: &mut R,
) -> Result<AnalysisResult> {
    config.validate()?;

    let (table, cleaning) = clean(table, config);
    let roles = classify(
        &table,
        config.categorical_max_cardinality,
        config.hue_max_cardinality,
    );
    info!(
        categorical = roles.categorical.len(),
        continuous = roles.continuous.len(),
        hue = roles.hue.len(),
        other = roles.other.len(),
        "columns classified"
    );

    let mut categorical_figures = Vec::new();
    let mut continuous_figures = Vec::new();
    let mut failures = Vec::new();

    for column in table.column_names() {
        let (role, rendered) = match roles.role_of(column) {
            Some(Role::Categorical) => (
                Role::Categorical,
                orchestrate_categorical(&table, column, &roles, renderer, rng),
            ),
            Some(Role::Continuous) => (
                Role::Continuous,
                orchestrate_continuous(&table, column, &roles, renderer, rng),
            ),
            Some(Role::Other) | None => continue,
        };

        match rendered {
            Ok(artifact) if role == Role::Categorical => categorical_figures.push(artifact),
            Ok(artifact) => continuous_figures.push(artifact),
            Err(e) => {
                warn!(column, %role, "figure failed: {:#}", e);
                failures.push(ColumnFailure {
                    column: column.to_string(),
                    role,
                    message: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        categorical = categorical_figures.len(),
        continuous = continuous_figures.len(),
        failed = failures.len(),
        "analysis finished"
    );

    let other_columns = roles.other.clone();
    Ok(AnalysisResult {
        table,
        cleaning,
        roles,
        categorical_figures,
        continuous_figures,
        other_columns,
        failures,
    })
}
