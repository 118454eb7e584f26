// Colour and marker palettes for grouped series

use plotters::style::RGBColor;

#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    /// Matplotlib's tab10 cycle
    pub fn category10() -> Self {
        let colors = [
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
            "#7f7f7f", "#bcbd22", "#17becf",
        ];
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `n` evenly spaced samples of the black-red-yellow-white "hot" ramp,
    /// trimmed so neither end is pure black or white.
    pub fn hot(n: usize) -> Self {
        let n = n.max(1);
        let colors = (0..n)
            .map(|i| {
                let t = 0.15 + 0.6 * (i as f64 + 0.5) / n as f64;
                to_hex(hot_ramp(t))
            })
            .collect();
        Self { colors }
    }

    pub fn color_at(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }
}

#[derive(Debug, Clone)]
pub struct ShapePalette {
    shapes: Vec<String>,
}

impl ShapePalette {
    pub fn default_shapes() -> Self {
        Self {
            shapes: ["circle", "triangle", "square", "cross"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn shape_at(&self, index: usize) -> &str {
        &self.shapes[index % self.shapes.len()]
    }
}

pub fn to_hex(color: RGBColor) -> String {
    let RGBColor(r, g, b) = color;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn hot_ramp(t: f64) -> RGBColor {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(
        channel(t / 0.375),
        channel((t - 0.375) / 0.375),
        channel((t - 0.75) / 0.25),
    )
}

/// Blue-white-red colour for a correlation in [-1, 1]. Undefined values are gray.
pub fn diverging(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(160, 160, 160);
    }
    let cold = (59.0, 76.0, 192.0);
    let mid = (221.0, 221.0, 221.0);
    let warm = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (cold, mid, v + 1.0)
    } else {
        (mid, warm, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

// === Color Parsing ===

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "crimson" => Some(RGBColor(220, 20, 60)),
        "steelblue" => Some(RGBColor(70, 130, 180)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
