use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};
use serde::Serialize;

// =============================================================================
// Phase 1: Planning
// =============================================================================

/// Chart types the orchestrator can place in a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Box,
    Violin,
    Bar,
    Line,
    Scatter,
    Strip,
    Pie,
    Count,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PanelPos {
    pub row: usize,
    pub col: usize,
}

impl PanelPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A request to draw one chart.
///
/// `x` is always the primary column of the chart. For grouped charts (bar,
/// box, strip, violin) it is the categorical axis and `y` the measured
/// column; a box with no `y` is the distribution of `x` alone. `columns` is
/// only used by the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub position: PanelPos,
    pub x: String,
    pub y: Option<String>,
    pub hue: Option<String>,
    pub style: Option<String>,
    pub columns: Vec<String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, position: PanelPos, x: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            x: x.into(),
            y: None,
            hue: None,
            style: None,
            columns: Vec::new(),
        }
    }

    pub fn with_y(mut self, y: impl Into<String>) -> Self {
        self.y = Some(y.into());
        self
    }

    pub fn with_hue(mut self, hue: Option<String>) -> Self {
        self.hue = hue;
        self
    }

    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style;
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Every column other than `x` the chart reads.
    pub fn companions(&self) -> Vec<&str> {
        self.y
            .iter()
            .chain(self.hue.iter())
            .chain(self.style.iter())
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 3, cols: 3 }
    }
}

/// Every chart planned for one primary column. Grid cells without a chart
/// are left blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureSpec {
    pub column: String,
    pub title: String,
    pub grid: GridShape,
    pub panels: Vec<ChartSpec>,
}

impl FigureSpec {
    pub fn new(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            title: title_case(&format!("{} analysis", column)),
            column,
            grid: GridShape::default(),
            panels: Vec::new(),
        }
    }

    pub fn push(&mut self, chart: ChartSpec) {
        self.panels.push(chart);
    }

    pub fn panel_at(&self, row: usize, col: usize) -> Option<&ChartSpec> {
        self.panels
            .iter()
            .find(|p| p.position == PanelPos::new(row, col))
    }
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

// =============================================================================
// Phase 2: Transformation
// =============================================================================

/// Statistics for one chart, ready for scaling.
#[derive(Debug, Clone)]
pub struct PanelPlot {
    pub position: PanelPos,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: PanelData,
}

#[derive(Debug, Clone)]
pub enum PanelData {
    Histogram {
        bins: Vec<HistogramBin>,
        /// KDE curve scaled to bin counts
        density: Vec<(f64, f64)>,
    },
    Distribution {
        stats: BoxStats,
        mean: f64,
    },
    Bar(Grouped<f64>),
    Box(Grouped<BoxStats>),
    Violin(Grouped<ViolinStats>),
    Strip(Grouped<Vec<f64>>),
    Pie {
        slices: Vec<PieSlice>,
    },
    /// Horizontal bars, largest count first
    Count {
        bars: Vec<(String, usize)>,
    },
    Line {
        points: Vec<(f64, f64)>,
    },
    Scatter {
        hue: Option<String>,
        style: Option<String>,
        series: Vec<ScatterSeries>,
    },
    Heatmap {
        labels: Vec<String>,
        /// Row-major; NaN where a correlation is undefined
        matrix: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViolinStats {
    pub grid: Vec<f64>,
    /// Normalised to a peak of 1
    pub density: Vec<f64>,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

/// Values split by a categorical axis and an optional hue.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    pub categories: Vec<String>,
    /// Empty when the chart has no hue
    pub hues: Vec<String>,
    pub hue_column: Option<String>,
    pub cells: Vec<GroupCell<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCell<T> {
    pub category: usize,
    pub hue: Option<usize>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub hue: Option<String>,
    pub style: Option<String>,
    pub points: Vec<(f64, f64)>,
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

#[derive(Debug, Clone)]
pub struct PanelScales {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Debug, Clone)]
pub struct Scale {
    pub domain: (f64, f64),
    pub is_categorical: bool,
    pub categories: Vec<String>, // If categorical, maps index -> label
    pub visible: bool,
}

// =============================================================================
// Phase 4: Compilation (Scene Graph)
// =============================================================================

/// A list of primitive drawing commands.
/// The Backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub grid: GridShape,
    pub panels: Vec<PanelScene>,
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale, // For drawing axes
    pub y_scale: Scale,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
        legend: Option<String>,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        style: PointStyle,
        legend: Option<String>,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        style: BarStyle,
        legend: Option<String>,
    },
    DrawPolygon {
        points: Vec<(f64, f64)>,
        style: BarStyle,
        legend: Option<String>,
    },
    DrawText {
        position: (f64, f64),
        text: String,
        style: LabelStyle,
    },
}

impl DrawCommand {
    pub fn legend(&self) -> Option<&str> {
        match self {
            DrawCommand::DrawLine { legend, .. }
            | DrawCommand::DrawPoint { legend, .. }
            | DrawCommand::DrawRect { legend, .. }
            | DrawCommand::DrawPolygon { legend, .. } => legend.as_deref(),
            DrawCommand::DrawText { .. } => None,
        }
    }
}
