use crate::graph::{format_number, BarStyle, LabelStyle, LineStyle, PointStyle, TextAlign};
use crate::ir::{
    BoxStats, DrawCommand, GridShape, GroupCell, Grouped, PanelData, PanelPlot, PanelScales,
    PanelScene, PieSlice, Scale, ScatterSeries, SceneGraph, ViolinStats,
};
use crate::palette::{diverging, to_hex, ColorPalette, ShapePalette};
use crate::scale::build_scales;
use crate::RenderOptions;

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

const HISTOGRAM_COLOR: &str = "#5614b3";
const GROUP_WIDTH: f64 = 0.8;
const PIE_EXPLODE: f64 = 0.07;
const NAMES_PER_ROW: usize = 5;

pub const OTHER_COLUMNS_TITLE: &str = "Columns That Have No Plots (High Cardinality)";

// =============================================================================
// Boxplot Geometry Helpers
// =============================================================================

/// Computed geometry for a single boxplot, expressed as primitive shapes
struct BoxplotGeometry {
    lower_whisker: Vec<(f64, f64)>,
    upper_whisker: Vec<(f64, f64)>,
    min_cap: Vec<(f64, f64)>,
    max_cap: Vec<(f64, f64)>,
    box_tl: (f64, f64),
    box_br: (f64, f64),
    median_line: Vec<(f64, f64)>,
    outlier_points: Vec<(f64, f64)>,
}

/// Calculates boxplot primitive geometry for a vertical boxplot centred on `x`
fn compute_boxplot_geometry(x: f64, width: f64, stats: &BoxStats) -> BoxplotGeometry {
    let half_width = width / 2.0;
    let cap_half = width * 0.2;

    BoxplotGeometry {
        lower_whisker: vec![(x, stats.lower_whisker), (x, stats.q1)],
        upper_whisker: vec![(x, stats.q3), (x, stats.upper_whisker)],
        min_cap: vec![(x - cap_half, stats.lower_whisker), (x + cap_half, stats.lower_whisker)],
        max_cap: vec![(x - cap_half, stats.upper_whisker), (x + cap_half, stats.upper_whisker)],
        box_tl: (x - half_width, stats.q3),
        box_br: (x + half_width, stats.q1),
        median_line: vec![(x - half_width, stats.median), (x + half_width, stats.median)],
        outlier_points: stats.outliers.iter().map(|&v| (x, v)).collect(),
    }
}

/// Component styles for boxplot primitives in one fill colour
fn boxplot_component_styles(color: &str) -> (LineStyle, BarStyle, LineStyle, PointStyle) {
    let whisker_style = LineStyle {
        color: Some("#444444".to_string()),
        width: Some(1.5),
        ..LineStyle::default()
    };

    let box_style = BarStyle {
        color: Some(color.to_string()),
        alpha: Some(0.9),
        border: Some("#444444".to_string()),
    };

    // White median for contrast
    let median_style = LineStyle {
        color: Some("white".to_string()),
        width: Some(2.0),
        alpha: Some(0.9),
        dashed: false,
    };

    let outlier_style = PointStyle {
        color: Some(color.to_string()),
        size: Some(3.0),
        shape: Some("square".to_string()),
        alpha: Some(0.8),
        outline: Some("#444444".to_string()),
    };

    (whisker_style, box_style, median_style, outlier_style)
}

fn push_boxplot(
    commands: &mut Vec<DrawCommand>,
    x: f64,
    width: f64,
    stats: &BoxStats,
    color: &str,
    legend: Option<String>,
) {
    let geom = compute_boxplot_geometry(x, width, stats);
    let (whisker_style, box_style, median_style, outlier_style) = boxplot_component_styles(color);

    // Emit primitive commands in z-order
    for points in [geom.lower_whisker, geom.upper_whisker, geom.min_cap, geom.max_cap] {
        commands.push(DrawCommand::DrawLine {
            points,
            style: whisker_style.clone(),
            legend: None,
        });
    }
    commands.push(DrawCommand::DrawRect {
        tl: geom.box_tl,
        br: geom.box_br,
        style: box_style,
        legend,
    });
    commands.push(DrawCommand::DrawLine {
        points: geom.median_line,
        style: median_style,
        legend: None,
    });
    if !geom.outlier_points.is_empty() {
        commands.push(DrawCommand::DrawPoint {
            points: geom.outlier_points,
            style: outlier_style,
            legend: None,
        });
    }
}

// =============================================================================
// Grouped layout
// =============================================================================

/// Centre and width of every cell after dodging the hues that share a category.
///
/// Only hues actually present at a category take a slot there.
fn dodge<T>(cells: &[GroupCell<T>], width: f64) -> Vec<(f64, f64)> {
    let mut occupancy: HashMap<usize, Vec<usize>> = HashMap::new();
    for cell in cells {
        occupancy
            .entry(cell.category)
            .or_default()
            .push(cell.hue.unwrap_or(0));
    }
    for hues in occupancy.values_mut() {
        hues.sort_unstable();
        hues.dedup();
    }

    cells
        .iter()
        .map(|cell| {
            let x = cell.category as f64;
            let hue = cell.hue.unwrap_or(0);
            match occupancy.get(&cell.category) {
                Some(occupants) => {
                    let n = occupants.len() as f64;
                    let rank = occupants.iter().position(|&h| h == hue).unwrap_or(0) as f64;
                    let slot = width / n;
                    (x + (rank - (n - 1.0) / 2.0) * slot, slot)
                }
                None => (x, width),
            }
        })
        .collect()
}

/// Colours hues when there are any, categories otherwise
struct GroupColors {
    palette: ColorPalette,
    by_hue: bool,
}

impl GroupColors {
    fn new<T>(g: &Grouped<T>, palette: fn(usize) -> ColorPalette) -> Self {
        let by_hue = !g.hues.is_empty();
        let n = if by_hue { g.hues.len() } else { g.categories.len() };
        Self {
            palette: palette(n),
            by_hue,
        }
    }

    fn color<T>(&self, cell: &GroupCell<T>) -> String {
        let idx = if self.by_hue {
            cell.hue.unwrap_or(0)
        } else {
            cell.category
        };
        self.palette.color_at(idx).to_string()
    }
}

fn hot(n: usize) -> ColorPalette {
    ColorPalette::hot(n)
}

fn tab10(_: usize) -> ColorPalette {
    ColorPalette::category10()
}

/// Legend text for the first cell of each hue
fn hue_legend<T>(g: &Grouped<T>, cell: &GroupCell<T>, seen: &mut HashSet<usize>) -> Option<String> {
    let hue = cell.hue?;
    if seen.insert(hue) {
        g.hues.get(hue).cloned()
    } else {
        None
    }
}

/// Deterministic horizontal spread in [-width/2, width/2)
fn jitter(i: usize, width: f64) -> f64 {
    ((i as f64 * 0.618_034).fract() - 0.5) * width
}

// =============================================================================
// Compilation
// =============================================================================

/// Scale and compile every panel of one figure.
pub fn compile_figure(
    title: &str,
    grid: GridShape,
    plots: Vec<PanelPlot>,
    options: &RenderOptions,
) -> SceneGraph {
    let aspect = panel_aspect(grid, options);
    let panels = plots
        .into_iter()
        .map(|plot| {
            let scales = build_scales(&plot, aspect);
            compile_panel(plot, scales)
        })
        .collect();

    SceneGraph {
        width: options.width,
        height: options.height,
        title: title.to_string(),
        grid,
        panels,
    }
}

fn panel_aspect(grid: GridShape, options: &RenderOptions) -> f64 {
    let w = options.width as f64 / grid.cols.max(1) as f64;
    let h = options.height as f64 / grid.rows.max(1) as f64;
    if h > 0.0 {
        w / h
    } else {
        1.0
    }
}

/// Compile one panel's statistics and scales into drawing commands
pub fn compile_panel(plot: PanelPlot, scales: PanelScales) -> PanelScene {
    let mut commands = Vec::new();

    match &plot.data {
        PanelData::Histogram { bins, density } => {
            let style = BarStyle {
                color: Some(HISTOGRAM_COLOR.to_string()),
                alpha: Some(0.85),
                border: Some("white".to_string()),
            };
            for bin in bins {
                commands.push(DrawCommand::DrawRect {
                    tl: (bin.start, bin.count as f64),
                    br: (bin.end, 0.0),
                    style: style.clone(),
                    legend: None,
                });
            }
            if density.len() > 1 {
                commands.push(DrawCommand::DrawLine {
                    points: density.clone(),
                    style: LineStyle {
                        color: Some("crimson".to_string()),
                        width: Some(2.0),
                        ..LineStyle::default()
                    },
                    legend: None,
                });
            }
        }
        PanelData::Distribution { stats, mean } => {
            push_boxplot(&mut commands, 0.0, 0.5, stats, "steelblue", None);
            let references = [
                ("Q1", stats.q1, "blue", false),
                ("Median", stats.median, "green", false),
                ("Mean", *mean, "red", true),
                ("Q3", stats.q3, "orange", false),
            ];
            for (name, value, color, dashed) in references {
                commands.push(DrawCommand::DrawLine {
                    points: vec![(-0.45, value), (0.45, value)],
                    style: LineStyle {
                        color: Some(color.to_string()),
                        width: Some(2.0),
                        alpha: None,
                        dashed,
                    },
                    legend: Some(format!("{}: {}", name, format_number(value))),
                });
            }
        }
        PanelData::Bar(g) => compile_bars(&mut commands, g),
        PanelData::Box(g) => {
            let colors = GroupColors::new(g, tab10);
            let mut seen = HashSet::new();
            for (cell, (x, slot)) in g.cells.iter().zip(dodge(&g.cells, GROUP_WIDTH)) {
                let legend = hue_legend(g, cell, &mut seen);
                push_boxplot(&mut commands, x, slot * 0.9, &cell.value, &colors.color(cell), legend);
            }
        }
        PanelData::Violin(g) => compile_violins(&mut commands, g),
        PanelData::Strip(g) => {
            let colors = GroupColors::new(g, tab10);
            let mut seen = HashSet::new();
            for (cell, (x, slot)) in g.cells.iter().zip(dodge(&g.cells, GROUP_WIDTH)) {
                let points = cell
                    .value
                    .iter()
                    .enumerate()
                    .map(|(i, &y)| (x + jitter(i, slot * 0.6), y))
                    .collect();
                commands.push(DrawCommand::DrawPoint {
                    points,
                    style: PointStyle {
                        color: Some(colors.color(cell)),
                        size: Some(3.0),
                        alpha: Some(0.75),
                        ..PointStyle::default()
                    },
                    legend: hue_legend(g, cell, &mut seen),
                });
            }
        }
        PanelData::Pie { slices } => compile_pie(&mut commands, slices),
        PanelData::Count { bars } => {
            let n = bars.len();
            let palette = ColorPalette::hot(n);
            let max = bars.iter().map(|b| b.1).max().unwrap_or(0) as f64;
            for (i, (_, count)) in bars.iter().enumerate() {
                // Largest first, drawn at the top
                let y = (n - 1 - i) as f64;
                let value = *count as f64;
                commands.push(DrawCommand::DrawRect {
                    tl: (0.0, y + 0.4),
                    br: (value, y - 0.4),
                    style: BarStyle {
                        color: Some(palette.color_at(i).to_string()),
                        alpha: None,
                        border: None,
                    },
                    legend: None,
                });
                commands.push(DrawCommand::DrawText {
                    position: (value + max * 0.02 + 0.1, y),
                    text: count.to_string(),
                    style: LabelStyle {
                        align: TextAlign::Left,
                        ..LabelStyle::default()
                    },
                });
            }
        }
        PanelData::Line { points } => {
            commands.push(DrawCommand::DrawLine {
                points: points.clone(),
                style: LineStyle {
                    color: Some("blue".to_string()),
                    width: Some(2.0),
                    ..LineStyle::default()
                },
                legend: Some("Data".to_string()),
            });
            commands.push(DrawCommand::DrawPoint {
                points: points.clone(),
                style: PointStyle {
                    color: Some("yellow".to_string()),
                    size: Some(4.0),
                    outline: Some("red".to_string()),
                    ..PointStyle::default()
                },
                legend: None,
            });
        }
        PanelData::Scatter { series, .. } => compile_scatter(&mut commands, series),
        PanelData::Heatmap { labels, matrix } => {
            let n = labels.len();
            for (i, row) in matrix.iter().enumerate() {
                // First row at the top
                let y = (n - 1 - i) as f64;
                for (j, &value) in row.iter().enumerate() {
                    let x = j as f64;
                    commands.push(DrawCommand::DrawRect {
                        tl: (x - 0.5, y + 0.5),
                        br: (x + 0.5, y - 0.5),
                        style: BarStyle {
                            color: Some(to_hex(diverging(value))),
                            alpha: None,
                            border: Some("white".to_string()),
                        },
                        legend: None,
                    });
                    let text_color = if value.abs() > 0.6 { "white" } else { "black" };
                    commands.push(DrawCommand::DrawText {
                        position: (x, y),
                        text: if value.is_finite() {
                            format!("{:.2}", value)
                        } else {
                            "nan".to_string()
                        },
                        style: LabelStyle {
                            color: Some(text_color.to_string()),
                            ..LabelStyle::default()
                        },
                    });
                }
            }
        }
    }

    PanelScene {
        row: plot.position.row,
        col: plot.position.col,
        title: non_empty(plot.title),
        x_label: non_empty(plot.x_label),
        y_label: non_empty(plot.y_label),
        x_scale: scales.x,
        y_scale: scales.y,
        commands,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn compile_bars(commands: &mut Vec<DrawCommand>, g: &Grouped<f64>) {
    let colors = GroupColors::new(g, hot);
    let mut seen = HashSet::new();
    for (cell, (x, slot)) in g.cells.iter().zip(dodge(&g.cells, GROUP_WIDTH)) {
        let half = slot / 2.0;
        commands.push(DrawCommand::DrawRect {
            tl: (x - half, cell.value),
            br: (x + half, 0.0),
            style: BarStyle {
                color: Some(colors.color(cell)),
                alpha: None,
                border: Some("#444444".to_string()),
            },
            legend: hue_legend(g, cell, &mut seen),
        });
    }
}

fn compile_violins(commands: &mut Vec<DrawCommand>, g: &Grouped<ViolinStats>) {
    let colors = GroupColors::new(g, hot);
    let mut seen = HashSet::new();
    for (cell, (x, slot)) in g.cells.iter().zip(dodge(&g.cells, GROUP_WIDTH)) {
        let stats = &cell.value;
        let half = slot * 0.45;

        let right = stats
            .grid
            .iter()
            .zip(&stats.density)
            .map(|(&y, &d)| (x + d * half, y));
        let left = stats
            .grid
            .iter()
            .zip(&stats.density)
            .rev()
            .map(|(&y, &d)| (x - d * half, y));
        commands.push(DrawCommand::DrawPolygon {
            points: right.chain(left).collect(),
            style: BarStyle {
                color: Some(colors.color(cell)),
                alpha: Some(0.9),
                border: Some("#444444".to_string()),
            },
            legend: hue_legend(g, cell, &mut seen),
        });

        // Inner quartile bar and median
        commands.push(DrawCommand::DrawLine {
            points: vec![(x, stats.q1), (x, stats.q3)],
            style: LineStyle {
                color: Some("#333333".to_string()),
                width: Some(4.0),
                ..LineStyle::default()
            },
            legend: None,
        });
        commands.push(DrawCommand::DrawPoint {
            points: vec![(x, stats.median)],
            style: PointStyle {
                color: Some("white".to_string()),
                size: Some(3.0),
                ..PointStyle::default()
            },
            legend: None,
        });
    }
}

/// Wedges counter-clockwise from three o'clock; the largest slice is pulled out
fn compile_pie(commands: &mut Vec<DrawCommand>, slices: &[PieSlice]) {
    let palette = ColorPalette::category10();
    let mut start = 0.0;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.fraction * TAU;
        let end = start + sweep;
        let mid = start + sweep / 2.0;
        let offset = if i == 0 { PIE_EXPLODE } else { 0.0 };
        let center = (offset * mid.cos(), offset * mid.sin());

        let steps = ((slice.fraction * 120.0).ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        if slice.fraction < 1.0 {
            points.push(center);
        }
        for s in 0..=steps {
            let a = start + sweep * s as f64 / steps as f64;
            points.push((center.0 + a.cos(), center.1 + a.sin()));
        }

        let percent = slice.fraction * 100.0;
        commands.push(DrawCommand::DrawPolygon {
            points,
            style: BarStyle {
                color: Some(palette.color_at(i).to_string()),
                alpha: None,
                border: Some("white".to_string()),
            },
            legend: Some(format!("{} : {:.1} %", slice.label, percent)),
        });
        commands.push(DrawCommand::DrawText {
            position: (center.0 + 0.6 * mid.cos(), center.1 + 0.6 * mid.sin()),
            text: format!("{:.1}%", percent),
            style: LabelStyle {
                color: Some("white".to_string()),
                size: Some(12.0),
                ..LabelStyle::default()
            },
        });
        start = end;
    }
}

/// Colour by hue, marker shape by style
fn compile_scatter(commands: &mut Vec<DrawCommand>, series: &[ScatterSeries]) {
    let colors = ColorPalette::category10();
    let shapes = ShapePalette::default_shapes();

    let mut hue_order: Vec<&str> = Vec::new();
    let mut style_order: Vec<&str> = Vec::new();
    for s in series {
        if let Some(h) = s.hue.as_deref() {
            if !hue_order.contains(&h) {
                hue_order.push(h);
            }
        }
        if let Some(st) = s.style.as_deref() {
            if !style_order.contains(&st) {
                style_order.push(st);
            }
        }
    }
    let rank = |order: &[&str], key: Option<&str>| {
        key.and_then(|k| order.iter().position(|o| *o == k)).unwrap_or(0)
    };

    for s in series {
        let legend = match (&s.hue, &s.style) {
            (Some(h), Some(st)) => Some(format!("{} / {}", h, st)),
            (Some(h), None) => Some(h.clone()),
            (None, Some(st)) => Some(st.clone()),
            (None, None) => None,
        };
        commands.push(DrawCommand::DrawPoint {
            points: s.points.clone(),
            style: PointStyle {
                color: Some(colors.color_at(rank(&hue_order, s.hue.as_deref())).to_string()),
                size: Some(3.0),
                shape: Some(shapes.shape_at(rank(&style_order, s.style.as_deref())).to_string()),
                alpha: Some(0.8),
                outline: None,
            },
            legend,
        });
    }
}

/// Figure listing columns that received no charts, five names per row
pub fn compile_text_grid(names: &[String], options: &RenderOptions) -> SceneGraph {
    let rows = names.len().div_ceil(NAMES_PER_ROW).max(1);
    let hidden = |domain: (f64, f64)| Scale {
        domain,
        is_categorical: false,
        categories: Vec::new(),
        visible: false,
    };

    let commands = names
        .iter()
        .enumerate()
        .map(|(i, name)| DrawCommand::DrawText {
            position: ((i % NAMES_PER_ROW) as f64, (rows - 1 - i / NAMES_PER_ROW) as f64),
            text: name.clone(),
            style: LabelStyle {
                size: Some(18.0),
                ..LabelStyle::default()
            },
        })
        .collect();

    SceneGraph {
        width: options.width,
        height: options.height,
        title: OTHER_COLUMNS_TITLE.to_string(),
        grid: GridShape { rows: 1, cols: 1 },
        panels: vec![PanelScene {
            row: 0,
            col: 0,
            title: None,
            x_label: None,
            y_label: None,
            x_scale: hidden((-0.5, NAMES_PER_ROW as f64 - 0.5)),
            y_scale: hidden((-0.5, rows as f64 - 0.5)),
            commands,
        }],
    }
}
