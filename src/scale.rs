use crate::ir::{PanelData, PanelPlot, PanelScales, Scale};

/// Radius of a pie in data units; the axis extends a little past it for labels
const PIE_EXTENT: f64 = 1.45;

/// Build the axis scales for one panel.
///
/// `aspect` is the panel's pixel width over its height; pies use it to stay
/// circular.
pub fn build_scales(plot: &PanelPlot, aspect: f64) -> PanelScales {
    match &plot.data {
        PanelData::Histogram { bins, density } => {
            let x = MinMax::from_values(bins.iter().flat_map(|b| [b.start, b.end]));
            let y = MinMax::from_values(
                bins.iter()
                    .map(|b| b.count as f64)
                    .chain(density.iter().map(|d| d.1))
                    .chain(std::iter::once(0.0)),
            );
            PanelScales {
                x: continuous(pad_range(x.min, x.max)),
                y: continuous(pad_top(y.min, y.max)),
            }
        }
        PanelData::Distribution { stats, mean } => {
            let y = MinMax::from_values(
                [stats.lower_whisker, stats.upper_whisker, *mean]
                    .into_iter()
                    .chain(stats.outliers.iter().copied()),
            );
            PanelScales {
                x: categorical(vec![plot.x_label.clone()]),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Bar(g) => {
            let y = MinMax::from_values(g.cells.iter().map(|c| c.value).chain([0.0]));
            PanelScales {
                x: categorical(g.categories.clone()),
                y: continuous(pad_top(y.min, y.max)),
            }
        }
        PanelData::Box(g) => {
            let y = MinMax::from_values(g.cells.iter().flat_map(|c| {
                [c.value.lower_whisker, c.value.upper_whisker]
                    .into_iter()
                    .chain(c.value.outliers.iter().copied())
            }));
            PanelScales {
                x: categorical(g.categories.clone()),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Violin(g) => {
            let y = MinMax::from_values(g.cells.iter().flat_map(|c| c.value.grid.iter().copied()));
            PanelScales {
                x: categorical(g.categories.clone()),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Strip(g) => {
            let y = MinMax::from_values(g.cells.iter().flat_map(|c| c.value.iter().copied()));
            PanelScales {
                x: categorical(g.categories.clone()),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Pie { .. } => {
            let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
            PanelScales {
                x: hidden((-PIE_EXTENT * aspect, PIE_EXTENT * aspect)),
                y: hidden((-PIE_EXTENT, PIE_EXTENT)),
            }
        }
        PanelData::Count { bars } => {
            let x = MinMax::from_values(bars.iter().map(|b| b.1 as f64).chain([0.0]));
            // Largest count is drawn at the top
            let labels = bars.iter().rev().map(|b| b.0.clone()).collect();
            PanelScales {
                x: continuous((0.0, x.max * 1.15 + 1.0)),
                y: categorical(labels),
            }
        }
        PanelData::Line { points } => {
            let x = MinMax::from_values(points.iter().map(|p| p.0));
            let y = MinMax::from_values(points.iter().map(|p| p.1));
            PanelScales {
                x: continuous(pad_range(x.min, x.max)),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Scatter { series, .. } => {
            let points = series.iter().flat_map(|s| s.points.iter());
            let x = MinMax::from_values(points.clone().map(|p| p.0));
            let y = MinMax::from_values(points.map(|p| p.1));
            PanelScales {
                x: continuous(pad_range(x.min, x.max)),
                y: continuous(pad_range(y.min, y.max)),
            }
        }
        PanelData::Heatmap { labels, .. } => PanelScales {
            x: categorical(labels.clone()),
            // First row at the top
            y: categorical(labels.iter().rev().cloned().collect()),
        },
    }
}

#[derive(Debug, Clone, Default)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            if v < min { min = v; }
            if v > max { max = v; }
        }
        // Handle empty case
        if min == f64::INFINITY { min = 0.0; max = 1.0; }
        MinMax { min, max }
    }
}

fn continuous(domain: (f64, f64)) -> Scale {
    Scale {
        domain,
        is_categorical: false,
        categories: Vec::new(),
        visible: true,
    }
}

/// Indices 0..N-1 with half a slot of room either side
fn categorical(categories: Vec<String>) -> Scale {
    let n = categories.len().max(1) as f64;
    Scale {
        domain: (-0.5, n - 0.5),
        is_categorical: true,
        categories,
        visible: true,
    }
}

fn hidden(domain: (f64, f64)) -> Scale {
    Scale {
        domain,
        is_categorical: false,
        categories: Vec::new(),
        visible: false,
    }
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Bars grow from zero, so only pad away from it
fn pad_top(min: f64, max: f64) -> (f64, f64) {
    let (lo, hi) = pad_range(min, max);
    (if min >= 0.0 { min } else { lo }, if max <= 0.0 { max } else { hi })
}
