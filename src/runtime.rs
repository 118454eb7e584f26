// Render collaborator: figure specs to encoded images

use crate::compiler::{compile_figure, compile_text_grid};
use crate::data::Table;
use crate::graph;
use crate::ir::FigureSpec;
use crate::transform::prepare_panel;
use crate::{OutputFormat, RenderOptions};
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

/// One rendered figure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub column: String,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URI for embedding in HTML
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

/// Turns a planned figure into an image.
pub trait Renderer {
    fn render(&self, table: &Table, figure: &FigureSpec) -> Result<Artifact>;
}

#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer {
    pub options: RenderOptions,
}

impl PlottersRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Text figure listing the columns that received no charts
    pub fn render_other_columns(&self, names: &[String]) -> Result<Artifact> {
        render_other_columns(names, &self.options)
    }
}

impl Renderer for PlottersRenderer {
    fn render(&self, table: &Table, figure: &FigureSpec) -> Result<Artifact> {
        let mut plots = Vec::with_capacity(figure.panels.len());
        for chart in &figure.panels {
            match prepare_panel(table, chart) {
                Ok(plot) => plots.push(plot),
                // A panel without usable data stays blank
                Err(e) => warn!(
                    column = %figure.column,
                    kind = ?chart.kind,
                    row = chart.position.row,
                    col = chart.position.col,
                    "skipping panel: {:#}",
                    e
                ),
            }
        }
        if plots.is_empty() {
            bail!("No panel of '{}' could be prepared", figure.column);
        }
        debug!(column = %figure.column, panels = plots.len(), "rendering figure");

        let scene = compile_figure(&figure.title, figure.grid, plots, &self.options);
        let bytes = graph::render_scene(&scene, self.options.format)
            .with_context(|| format!("Failed to render figure for '{}'", figure.column))?;

        Ok(Artifact {
            column: figure.column.clone(),
            format: self.options.format,
            bytes,
        })
    }
}

pub fn render_other_columns(names: &[String], options: &RenderOptions) -> Result<Artifact> {
    let scene = compile_text_grid(names, options);
    let bytes = graph::render_scene(&scene, options.format)
        .context("Failed to render other-columns figure")?;
    Ok(Artifact {
        column: String::new(),
        format: options.format,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, DType, Value};
    use crate::ir::{ChartKind, ChartSpec, PanelPos};

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn small_options(format: OutputFormat) -> RenderOptions {
        RenderOptions {
            width: 480,
            height: 360,
            format,
        }
    }

    fn make_table() -> Table {
        let n = 40;
        Table::new(vec![
            Column::new(
                "age",
                DType::Float,
                (0..n).map(|i| Value::Float(20.0 + (i * 7 % 31) as f64)).collect(),
            ),
            Column::new(
                "fare",
                DType::Float,
                (0..n).map(|i| Value::Float(5.0 + (i * 13 % 47) as f64 * 1.5)).collect(),
            ),
            Column::new(
                "class",
                DType::Text,
                (0..n)
                    .map(|i| Value::Text(["first", "second", "third"][i % 3].to_string()))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    fn make_figure() -> FigureSpec {
        let mut fig = FigureSpec::new("age");
        fig.push(ChartSpec::new(ChartKind::Histogram, PanelPos::new(0, 0), "age"));
        fig.push(ChartSpec::new(ChartKind::Line, PanelPos::new(0, 1), "age").with_y("fare"));
        fig.push(ChartSpec::new(ChartKind::Box, PanelPos::new(1, 0), "age"));
        fig.push(
            ChartSpec::new(ChartKind::Box, PanelPos::new(1, 2), "class")
                .with_y("age")
                .with_hue(Some("class".to_string())),
        );
        fig.push(
            ChartSpec::new(ChartKind::Heatmap, PanelPos::new(1, 1), "age")
                .with_columns(vec!["age".to_string(), "fare".to_string()]),
        );
        fig
    }

    #[test]
    fn test_render_png() {
        let renderer = PlottersRenderer::new(small_options(OutputFormat::Png));
        let artifact = renderer.render(&make_table(), &make_figure()).unwrap();
        assert_eq!(artifact.column, "age");
        assert_eq!(&artifact.bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_render_svg() {
        let renderer = PlottersRenderer::new(small_options(OutputFormat::Svg));
        let artifact = renderer.render(&make_table(), &make_figure()).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("Age Analysis"));
    }

    #[test]
    fn test_bad_panel_is_skipped() {
        let mut fig = make_figure();
        fig.push(ChartSpec::new(ChartKind::Scatter, PanelPos::new(2, 0), "age").with_y("missing"));
        let renderer = PlottersRenderer::new(small_options(OutputFormat::Png));
        assert!(renderer.render(&make_table(), &fig).is_ok());
    }

    #[test]
    fn test_all_panels_bad_is_error() {
        let mut fig = FigureSpec::new("nope");
        fig.push(ChartSpec::new(ChartKind::Histogram, PanelPos::new(0, 0), "nope"));
        let renderer = PlottersRenderer::new(small_options(OutputFormat::Png));
        let err = renderer.render(&make_table(), &fig).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_render_other_columns() {
        let names = vec!["name".to_string(), "ticket".to_string()];
        let artifact = render_other_columns(&names, &small_options(OutputFormat::Png)).unwrap();
        assert_eq!(&artifact.bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_data_uri() {
        let artifact = Artifact {
            column: "c".to_string(),
            format: OutputFormat::Png,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(artifact.to_base64(), "AQID");
        assert_eq!(artifact.to_data_uri(), "data:image/png;base64,AQID");
    }
}
