use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::element::{DynElement, IntoDynElement};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use crate::ir::{DrawCommand, PanelScene, Scale, SceneGraph};
use crate::palette::parse_color;
use crate::OutputFormat;

/// Figure background behind the panels
const FIGURE_BACKGROUND: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);
/// Plotting-area fill of every panel with axes
const PANEL_BACKGROUND: RGBColor = RGBColor(0xea, 0xea, 0xf2);
const DEFAULT_COLOR: RGBColor = RGBColor(70, 130, 180);

/// Style configuration for line primitives
#[derive(Debug, Clone, Default)]
pub struct LineStyle {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
    pub dashed: bool,
}

/// Style configuration for point primitives
#[derive(Debug, Clone, Default)]
pub struct PointStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub shape: Option<String>,
    pub alpha: Option<f64>,
    pub outline: Option<String>,
}

/// Style configuration for filled rectangles and polygons
#[derive(Debug, Clone, Default)]
pub struct BarStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
    pub border: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Style configuration for free-standing text
#[derive(Debug, Clone, Default)]
pub struct LabelStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub align: TextAlign,
}

/// RGB raster target that encodes to PNG
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot create a {}x{} canvas", width, height);
        }
        let buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        Ok(Canvas {
            buffer,
            width,
            height,
        })
    }

    pub fn draw(&mut self, scene: &SceneGraph) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Draw a scene graph and return the encoded image bytes
pub fn render_scene(scene: &SceneGraph, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Png => {
            let mut canvas = Canvas::new(scene.width, scene.height)?;
            canvas.draw(scene)?;
            canvas.render()
        }
        OutputFormat::Svg => {
            if scene.width == 0 || scene.height == 0 {
                anyhow::bail!("Cannot create a {}x{} canvas", scene.width, scene.height);
            }
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height))
                    .into_drawing_area();
                draw_scene(&root, scene)?;
                root.present().context("Failed to present drawing")?;
            }
            Ok(svg.into_bytes())
        }
    }
}

fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&FIGURE_BACKGROUND)
        .context("Failed to fill background")?;
    let body = root
        .titled(&scene.title, ("sans-serif", 28))
        .context("Failed to draw figure title")?;

    let cells = body.split_evenly((scene.grid.rows, scene.grid.cols));
    for panel in &scene.panels {
        let idx = panel.row * scene.grid.cols + panel.col;
        if let Some(area) = cells.get(idx) {
            draw_panel(area, panel)
                .with_context(|| format!("Failed to draw panel ({}, {})", panel.row, panel.col))?;
        }
    }
    Ok(())
}

fn draw_panel<DB>(area: &DrawingArea<DB, Shift>, panel: &PanelScene) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let with_axes = panel.x_scale.visible && panel.y_scale.visible;

    let mut builder = ChartBuilder::on(area);
    builder.margin(8);
    if let Some(title) = &panel.title {
        builder.caption(title, ("sans-serif", 14));
    }
    if with_axes {
        builder
            .x_label_area_size(34)
            .y_label_area_size(label_area_width(&panel.y_scale));
    }
    let mut chart = builder
        .build_cartesian_2d(
            panel.x_scale.domain.0..panel.x_scale.domain.1,
            panel.y_scale.domain.0..panel.y_scale.domain.1,
        )
        .context("Failed to build chart")?;

    if with_axes {
        chart
            .plotting_area()
            .fill(&PANEL_BACKGROUND)
            .context("Failed to fill panel")?;

        let x_fmt = |v: &f64| axis_label(&panel.x_scale, *v);
        let y_fmt = |v: &f64| axis_label(&panel.y_scale, *v);
        let mut mesh = chart.configure_mesh();
        mesh.bold_line_style(WHITE.stroke_width(1))
            .light_line_style(WHITE.mix(0.4).stroke_width(1))
            .label_style(("sans-serif", 11))
            .axis_desc_style(("sans-serif", 12))
            .x_labels(label_count(&panel.x_scale))
            .y_labels(label_count(&panel.y_scale))
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt);
        if let Some(desc) = panel.x_label.as_deref().filter(|d| !d.is_empty()) {
            mesh.x_desc(desc);
        }
        if let Some(desc) = panel.y_label.as_deref().filter(|d| !d.is_empty()) {
            mesh.y_desc(desc);
        }
        mesh.draw().context("Failed to draw mesh")?;
    }

    let mut has_legend = false;
    for command in &panel.commands {
        match command {
            DrawCommand::DrawLine { points, style, legend } => {
                let color = resolve_color(&style.color, DEFAULT_COLOR).mix(style.alpha.unwrap_or(1.0));
                let shape = color.stroke_width(style.width.unwrap_or(1.5).round().max(1.0) as u32);
                let segments = if style.dashed {
                    dash(points, &panel.x_scale, &panel.y_scale)
                } else {
                    vec![points.clone()]
                };
                let anno = chart
                    .draw_series(segments.into_iter().map(|seg| PathElement::new(seg, shape)))
                    .context("Failed to draw line series")?;
                if let Some(label) = legend {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], shape));
                    has_legend = true;
                }
            }
            DrawCommand::DrawPoint { points, style, legend } => {
                let color = resolve_color(&style.color, DEFAULT_COLOR).mix(style.alpha.unwrap_or(1.0));
                let size = style.size.unwrap_or(3.0).round().max(1.0) as i32;
                let shape_name = style.shape.clone().unwrap_or_else(|| "circle".to_string());
                let fill = color.filled();
                let anno = chart
                    .draw_series(points.iter().map(|&p| marker::<DB>(p, &shape_name, size, fill)))
                    .context("Failed to draw point series")?;
                if let Some(label) = legend {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Circle::new((x + 8, y), 4, fill));
                    has_legend = true;
                }
                if let Some(outline) = &style.outline {
                    let edge = resolve_color(&Some(outline.clone()), BLACK).stroke_width(1);
                    chart
                        .draw_series(points.iter().map(|&p| Circle::new(p, size, edge)))
                        .context("Failed to draw point outlines")?;
                }
            }
            DrawCommand::DrawRect { tl, br, style, legend } => {
                let fill = resolve_color(&style.color, DEFAULT_COLOR)
                    .mix(style.alpha.unwrap_or(1.0))
                    .filled();
                let anno = chart
                    .draw_series(std::iter::once(Rectangle::new([*tl, *br], fill)))
                    .context("Failed to draw rectangle")?;
                if let Some(label) = legend {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], fill));
                    has_legend = true;
                }
                if let Some(border) = &style.border {
                    let edge = resolve_color(&Some(border.clone()), BLACK).stroke_width(1);
                    chart
                        .draw_series(std::iter::once(Rectangle::new([*tl, *br], edge)))
                        .context("Failed to draw rectangle border")?;
                }
            }
            DrawCommand::DrawPolygon { points, style, legend } => {
                let fill = resolve_color(&style.color, DEFAULT_COLOR)
                    .mix(style.alpha.unwrap_or(1.0))
                    .filled();
                let anno = chart
                    .draw_series(std::iter::once(Polygon::new(points.clone(), fill)))
                    .context("Failed to draw polygon")?;
                if let Some(label) = legend {
                    anno.label(label.as_str())
                        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], fill));
                    has_legend = true;
                }
                if let Some(border) = &style.border {
                    let edge = resolve_color(&Some(border.clone()), WHITE).stroke_width(2);
                    let mut outline = points.clone();
                    if let Some(first) = points.first() {
                        outline.push(*first);
                    }
                    chart
                        .draw_series(std::iter::once(PathElement::new(outline, edge)))
                        .context("Failed to draw polygon border")?;
                }
            }
            DrawCommand::DrawText { position, text, style } => {
                let color = resolve_color(&style.color, BLACK);
                let h = match style.align {
                    TextAlign::Left => HPos::Left,
                    TextAlign::Center => HPos::Center,
                    TextAlign::Right => HPos::Right,
                };
                let font = ("sans-serif", style.size.unwrap_or(11.0))
                    .into_font()
                    .color(&color)
                    .pos(Pos::new(h, VPos::Center));
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *position, font)))
                    .context("Failed to draw text")?;
            }
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85).filled())
            .border_style(BLACK.stroke_width(1))
            .label_font(("sans-serif", 10))
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn marker<'a, DB: DrawingBackend + 'a>(
    p: (f64, f64),
    shape: &str,
    size: i32,
    style: ShapeStyle,
) -> DynElement<'a, DB, (f64, f64)> {
    match shape {
        "triangle" => TriangleMarker::new(p, size, style).into_dyn(),
        "square" => (EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], style))
            .into_dyn(),
        "cross" => Cross::new(p, size, style.stroke_width(2)).into_dyn(),
        _ => Circle::new(p, size, style).into_dyn(),
    }
}

fn resolve_color(color: &Option<String>, default: RGBColor) -> RGBColor {
    color.as_deref().and_then(parse_color).unwrap_or(default)
}

fn label_count(scale: &Scale) -> usize {
    if scale.is_categorical {
        scale.categories.len().max(1)
    } else {
        6
    }
}

fn label_area_width(scale: &Scale) -> u32 {
    if scale.is_categorical {
        let longest = scale
            .categories
            .iter()
            .map(|c| c.chars().count().min(MAX_LABEL_CHARS))
            .max()
            .unwrap_or(1);
        (longest as u32 * 7 + 24).clamp(40, 120)
    } else {
        56
    }
}

const MAX_LABEL_CHARS: usize = 12;

/// Tick label text. Categorical axes only label whole indices.
fn axis_label(scale: &Scale, value: f64) -> String {
    if scale.is_categorical {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        match scale.categories.get(idx as usize) {
            Some(label) if label.chars().count() > MAX_LABEL_CHARS => {
                let short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
                format!("{}…", short)
            }
            Some(label) => label.clone(),
            None => String::new(),
        }
    } else {
        format_number(value)
    }
}

pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if magnitude >= 1e5 || magnitude < 1e-3 {
        format!("{:.1e}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Split a polyline into dash segments of equal on-screen proportion
fn dash(points: &[(f64, f64)], x: &Scale, y: &Scale) -> Vec<Vec<(f64, f64)>> {
    const DASH: f64 = 0.02;
    const GAP: f64 = 0.012;

    let x_span = (x.domain.1 - x.domain.0).abs().max(f64::EPSILON);
    let y_span = (y.domain.1 - y.domain.0).abs().max(f64::EPSILON);

    let mut segments = Vec::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = (((b.0 - a.0) / x_span).powi(2) + ((b.1 - a.1) / y_span).powi(2)).sqrt();
        if length == 0.0 {
            continue;
        }
        let mut t = 0.0;
        while t < length {
            let end = (t + DASH).min(length);
            let lerp = |s: f64| (a.0 + (b.0 - a.0) * s / length, a.1 + (b.1 - a.1) * s / length);
            segments.push(vec![lerp(t), lerp(end)]);
            t = end + GAP;
        }
    }
    segments
}
