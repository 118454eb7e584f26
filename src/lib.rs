// Library exports for autoviz

pub mod analysis;
pub mod compiler;
pub mod config;
pub mod data;
pub mod describe;
pub mod error;
pub mod graph;
pub mod identify;
pub mod impute;
pub mod ir;
pub mod orchestrate;
pub mod palette;
pub mod parser;
pub mod purify;
pub mod roles;
pub mod runtime;
pub mod sampler;
pub mod scale;
pub mod transform;

pub use analysis::{analyze, clean, AnalysisResult, CleaningReport, ColumnFailure};
pub use config::AnalysisConfig;
pub use data::{Column, DType, Table, Value};
pub use error::{AnalysisError, Result};
pub use roles::{Role, RolePartition};
pub use runtime::{Artifact, PlottersRenderer, Renderer};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 1600 }
fn default_height() -> u32 { 1000 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
