//! Analysis thresholds and rendering options.
//!
//! Every heuristic constant of the cleaning and classification pipeline is a
//! field here so callers can tune it from a JSON file without recompiling.

use crate::error::{AnalysisError, Result};
use crate::RenderOptions;
use serde::Deserialize;
use std::path::Path;

/// Strings treated as "missing" by the null purifier. Matching is exact and
/// case-sensitive.
pub const DEFAULT_SENTINELS: &[&str] = &[
    "miss",
    "not found",
    "unknown",
    "NA",
    "unspecified",
    "other",
    "N/A",
    "invalid",
    "none",
    "null",
    "empty",
    "@",
    "/",
    "$",
    "%",
    "&",
    "?",
    "!",
    "~",
    "|",
    "\\",
    "< >",
    "[]",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rows inspected by the type sampler.
    pub sample_size: usize,
    /// Columns whose null share is strictly above this are dropped.
    pub null_threshold: f64,
    /// Columns with at most this many distinct values are categorical.
    pub categorical_max_cardinality: usize,
    /// Categorical columns with fewer distinct values than this are hue candidates.
    pub hue_max_cardinality: usize,
    pub sentinels: Vec<String>,
    pub render: RenderOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_size: 25,
            null_threshold: 0.5,
            categorical_max_cardinality: 15,
            hue_max_cardinality: 4,
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
            render: RenderOptions::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(AnalysisError::Config(
                "sample_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.null_threshold) {
            return Err(AnalysisError::Config(format!(
                "null_threshold must be within [0, 1], got {}",
                self.null_threshold
            )));
        }
        if self.hue_max_cardinality > self.categorical_max_cardinality + 1 {
            return Err(AnalysisError::Config(format!(
                "hue_max_cardinality ({}) cannot exceed categorical_max_cardinality + 1 ({})",
                self.hue_max_cardinality,
                self.categorical_max_cardinality + 1
            )));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(AnalysisError::Config(
                "render width and height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
