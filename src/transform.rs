use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use crate::data::{Column, DType, Table, Value};
use crate::ir::{
    title_case, BoxStats, ChartKind, ChartSpec, GroupCell, Grouped, HistogramBin, PanelData,
    PanelPlot, PieSlice, ScatterSeries, ViolinStats,
};
use crate::parser::parse_number;

/// Main entry point: compute the statistics one chart needs from the table
pub fn prepare_panel(table: &Table, chart: &ChartSpec) -> Result<PanelPlot> {
    let x = chart.x.as_str();
    let y = chart.y.as_deref();
    let hue = chart.hue.as_deref();

    let (title, x_label, y_label, data) = match chart.kind {
        ChartKind::Histogram => (
            format!("{} Histogram", x),
            x.to_string(),
            "Frequency".to_string(),
            histogram(table, x)?,
        ),
        ChartKind::Box if y.is_none() => (
            format!("{} Box Plot", x),
            title_case(x),
            "Values".to_string(),
            distribution(table, x)?,
        ),
        ChartKind::Bar | ChartKind::Box | ChartKind::Violin | ChartKind::Strip => {
            let y = require_y(chart)?;
            let groups = group_values(table, x, y, hue)?;
            let data = match chart.kind {
                ChartKind::Bar => PanelData::Bar(map_groups(groups, |v| Some(mean(&v)))),
                ChartKind::Box => PanelData::Box(map_groups(groups, |mut v| {
                    v.sort_by(f64::total_cmp);
                    Some(compute_box_stats(&v))
                })),
                ChartKind::Violin => PanelData::Violin(map_groups(groups, |mut v| {
                    v.sort_by(f64::total_cmp);
                    Some(compute_violin_stats(&v))
                })),
                _ => PanelData::Strip(map_groups(groups, Some)),
            };
            (grouped_title(x, y, hue), x.to_string(), y.to_string(), data)
        }
        ChartKind::Pie => (
            format!("{} Distribution", x),
            String::new(),
            String::new(),
            pie(table, x)?,
        ),
        ChartKind::Count => (
            format!("{} Distribution", x),
            "Count".to_string(),
            x.to_string(),
            PanelData::Count {
                bars: value_counts(column(table, x)?),
            },
        ),
        ChartKind::Line => {
            let y = require_y(chart)?;
            (
                format!("{} & {} Line Plot", x, y),
                x.to_string(),
                y.to_string(),
                line(table, x, y)?,
            )
        }
        ChartKind::Scatter => {
            let y = require_y(chart)?;
            let style = chart.style.as_deref();
            let title = match (hue, style) {
                (Some(h), Some(s)) => format!("{} vs {} group by {} & {}", x, y, h, s),
                (Some(h), None) => format!("{} vs {} group by {}", x, y, h),
                _ => format!("{} vs {}", x, y),
            };
            (title, x.to_string(), y.to_string(), scatter(table, x, y, hue, style)?)
        }
        ChartKind::Heatmap => (
            "Heatmap".to_string(),
            String::new(),
            String::new(),
            heatmap(table, &chart.columns)?,
        ),
    };

    Ok(PanelPlot {
        position: chart.position,
        title: title_case(&title),
        x_label,
        y_label,
        data,
    })
}

fn require_y(chart: &ChartSpec) -> Result<&str> {
    chart
        .y
        .as_deref()
        .ok_or_else(|| anyhow!("{:?} chart of '{}' needs a second column", chart.kind, chart.x))
}

fn grouped_title(x: &str, y: &str, hue: Option<&str>) -> String {
    match hue {
        Some(h) => format!("{} vs {} group by {}", x, y, h),
        None => format!("{} vs {}", x, y),
    }
}

// =============================================================================
// Column access
// =============================================================================

fn column<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| anyhow!("Column '{}' not found", name))
}

/// Row-aligned numeric view; nulls stay `None`
fn numeric_rows(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let col = column(table, name)?;
    if col.dtype == DType::Text || col.dtype == DType::Object {
        bail!("Column '{}' is not numeric", name);
    }
    Ok(col.values.iter().map(Value::as_f64).collect())
}

fn numeric_values(table: &Table, name: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = numeric_rows(table, name)?.into_iter().flatten().collect();
    if values.is_empty() {
        bail!("Column '{}' has no values", name);
    }
    Ok(values)
}

fn label_rows(col: &Column) -> Vec<Option<String>> {
    col.values
        .iter()
        .map(|v| (!v.is_null()).then(|| v.to_string()))
        .collect()
}

/// Distinct labels sorted numerically when they all read as numbers,
/// lexically otherwise
fn category_order(labels: &[Option<String>]) -> Vec<String> {
    let unique: HashSet<&String> = labels.iter().flatten().collect();
    let mut order: Vec<String> = unique.into_iter().cloned().collect();

    let numeric: Option<Vec<f64>> = order.iter().map(|s| parse_number(s)).collect();
    if numeric.is_some() {
        order.sort_by(|a, b| {
            let fa = parse_number(a).unwrap_or(f64::NAN);
            let fb = parse_number(b).unwrap_or(f64::NAN);
            fa.total_cmp(&fb)
        });
    } else {
        order.sort();
    }
    order
}

// =============================================================================
// Chart statistics
// =============================================================================

fn histogram(table: &Table, x: &str) -> Result<PanelData> {
    let values = numeric_values(table, x)?;
    let n = values.len();

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    // ceil(sqrt(n)) bins; a constant column gets one unit-wide bin
    let (bin_count, start, width) = if range == 0.0 {
        (1, min - 0.5, 1.0)
    } else {
        let k = (n as f64).sqrt().ceil() as usize;
        (k, min, range / k as f64)
    };

    let mut counts = vec![0usize; bin_count];
    for v in &values {
        let idx = (((v - start) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: start + i as f64 * width,
            end: start + (i + 1) as f64 * width,
            count,
        })
        .collect();

    let bandwidth = silverman_bandwidth(&values);
    let (grid, density) = compute_kde(&values, bandwidth);
    let scale = n as f64 * width;
    let density = grid
        .into_iter()
        .zip(density)
        .map(|(g, d)| (g, d * scale))
        .collect();

    Ok(PanelData::Histogram { bins, density })
}

fn distribution(table: &Table, x: &str) -> Result<PanelData> {
    let mut values = numeric_values(table, x)?;
    values.sort_by(f64::total_cmp);
    Ok(PanelData::Distribution {
        mean: mean(&values),
        stats: compute_box_stats(&values),
    })
}

/// Raw y values keyed by (category index, hue index)
struct RawGroups {
    categories: Vec<String>,
    hues: Vec<String>,
    hue_column: Option<String>,
    cells: Vec<((usize, Option<usize>), Vec<f64>)>,
}

fn group_values(table: &Table, x: &str, y: &str, hue: Option<&str>) -> Result<RawGroups> {
    let x_labels = label_rows(column(table, x)?);
    let y_values = numeric_rows(table, y)?;
    let hue_labels = match hue {
        Some(h) => Some(label_rows(column(table, h)?)),
        None => None,
    };

    let categories = category_order(&x_labels);
    let hues = hue_labels.as_deref().map(category_order).unwrap_or_default();
    let cat_index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let hue_index: HashMap<&str, usize> = hues
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut buckets: HashMap<(usize, Option<usize>), Vec<f64>> = HashMap::new();
    for (row, label) in x_labels.iter().enumerate() {
        let (Some(label), Some(value)) = (label, y_values[row]) else {
            continue;
        };
        let hue_slot = match &hue_labels {
            Some(labels) => match &labels[row] {
                Some(h) => Some(hue_index[h.as_str()]),
                None => continue,
            },
            None => None,
        };
        buckets
            .entry((cat_index[label.as_str()], hue_slot))
            .or_default()
            .push(value);
    }

    let mut cells: Vec<_> = buckets.into_iter().collect();
    cells.sort_by_key(|(key, _)| *key);

    Ok(RawGroups {
        categories,
        hues,
        hue_column: hue.map(str::to_string),
        cells,
    })
}

fn map_groups<T, F>(groups: RawGroups, mut f: F) -> Grouped<T>
where
    F: FnMut(Vec<f64>) -> Option<T>,
{
    let cells = groups
        .cells
        .into_iter()
        .filter_map(|((category, hue), values)| {
            f(values).map(|value| GroupCell {
                category,
                hue,
                value,
            })
        })
        .collect();
    Grouped {
        categories: groups.categories,
        hues: groups.hues,
        hue_column: groups.hue_column,
        cells,
    }
}

/// (label, count) pairs, most frequent first; ties in label order
fn value_counts(col: &Column) -> Vec<(String, usize)> {
    let labels = label_rows(col);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels.iter().flatten() {
        *counts.entry(label.clone()).or_default() += 1;
    }
    let order = category_order(&labels);
    let mut bars: Vec<(String, usize)> = order
        .into_iter()
        .map(|label| {
            let count = counts.get(&label).copied().unwrap_or(0);
            (label, count)
        })
        .collect();
    // Stable sort keeps label order among equal counts
    bars.sort_by(|a, b| b.1.cmp(&a.1));
    bars
}

fn pie(table: &Table, x: &str) -> Result<PanelData> {
    let counts = value_counts(column(table, x)?);
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    if total == 0 {
        bail!("Column '{}' has no values", x);
    }
    let slices = counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label,
            count,
            fraction: count as f64 / total as f64,
        })
        .collect();
    Ok(PanelData::Pie { slices })
}

/// Mean of y at each distinct x, in ascending x
fn line(table: &Table, x: &str, y: &str) -> Result<PanelData> {
    let xs = numeric_rows(table, x)?;
    let ys = numeric_rows(table, y)?;
    let mut pairs: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut i = 0;
    while i < pairs.len() {
        let x_val = pairs[i].0;
        let mut j = i;
        let mut sum = 0.0;
        while j < pairs.len() && pairs[j].0 == x_val {
            sum += pairs[j].1;
            j += 1;
        }
        points.push((x_val, sum / (j - i) as f64));
        i = j;
    }
    Ok(PanelData::Line { points })
}

fn scatter(
    table: &Table,
    x: &str,
    y: &str,
    hue: Option<&str>,
    style: Option<&str>,
) -> Result<PanelData> {
    let xs = numeric_rows(table, x)?;
    let ys = numeric_rows(table, y)?;
    let hue_labels = hue.map(|h| column(table, h).map(label_rows)).transpose()?;
    let style_labels = style.map(|s| column(table, s).map(label_rows)).transpose()?;

    let hue_order = hue_labels.as_deref().map(category_order);
    let style_order = style_labels.as_deref().map(category_order);

    let mut buckets: HashMap<(Option<String>, Option<String>), Vec<(f64, f64)>> = HashMap::new();
    for row in 0..xs.len() {
        let (Some(px), Some(py)) = (xs[row], ys[row]) else {
            continue;
        };
        let h = hue_labels.as_ref().and_then(|l| l[row].clone());
        let s = style_labels.as_ref().and_then(|l| l[row].clone());
        if (hue_labels.is_some() && h.is_none()) || (style_labels.is_some() && s.is_none()) {
            continue;
        }
        buckets.entry((h, s)).or_default().push((px, py));
    }

    let rank = |order: &Option<Vec<String>>, key: &Option<String>| -> usize {
        match (order, key) {
            (Some(order), Some(k)) => order.iter().position(|o| o == k).unwrap_or(usize::MAX),
            _ => 0,
        }
    };
    let mut series: Vec<ScatterSeries> = buckets
        .into_iter()
        .map(|((hue, style), points)| ScatterSeries { hue, style, points })
        .collect();
    series.sort_by_key(|s| (rank(&hue_order, &s.hue), rank(&style_order, &s.style)));

    Ok(PanelData::Scatter {
        hue: hue.map(str::to_string),
        style: style.map(str::to_string),
        series,
    })
}

fn heatmap(table: &Table, columns: &[String]) -> Result<PanelData> {
    if columns.is_empty() {
        bail!("Heatmap needs at least one numeric column");
    }
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| numeric_rows(table, c))
        .collect::<Result<_>>()?;

    let matrix = data
        .iter()
        .map(|a| data.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(PanelData::Heatmap {
        labels: columns.to_vec(),
        matrix,
    })
}

// =============================================================================
// Statistics helpers
// =============================================================================

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Pairwise-complete Pearson correlation; NaN when either side is constant
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in &pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return f64::NAN;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

/// Quartiles, 1.5 IQR whiskers and outliers of sorted data
pub fn compute_box_stats(sorted: &[f64]) -> BoxStats {
    let q1 = percentile(sorted, 0.25);
    let median = percentile(sorted, 0.50);
    let q3 = percentile(sorted, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: Range of data within fences
    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= lower_fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= upper_fence)
        .unwrap_or(q3);

    let outliers = sorted
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    }
}

/// Violin outline of sorted data
fn compute_violin_stats(sorted: &[f64]) -> ViolinStats {
    let bandwidth = silverman_bandwidth(sorted);
    let (grid, mut density) = compute_kde(sorted, bandwidth);

    // Normalize density to 0-1 range for rendering
    let max_density = density.iter().fold(0.0f64, |a, &b| a.max(b));
    if max_density > 0.0 {
        for d in &mut density {
            *d /= max_density;
        }
    }

    ViolinStats {
        grid,
        density,
        q1: percentile(sorted, 0.25),
        median: percentile(sorted, 0.5),
        q3: percentile(sorted, 0.75),
    }
}

/// Silverman's rule of thumb for bandwidth selection
fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 { return 1.0; }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;

    // Silverman's rule: h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 { return 1.0; }
    0.9 * scale * n.powf(-0.2)
}

/// Gaussian kernel function
fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE evaluated on an evenly spaced grid spanning the data plus
/// three bandwidths either side
fn compute_kde(data: &[f64], bandwidth: f64) -> (Vec<f64>, Vec<f64>) {
    const GRID_POINTS: usize = 128;  // Resolution of density curve

    let n = data.len() as f64;
    if n == 0.0 { return (vec![], vec![]); }

    let min_y = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_y = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let extend = 3.0 * bandwidth;
    let y_start = min_y - extend;
    let y_end = max_y + extend;

    let range = y_end - y_start;
    if range <= 0.0 { return (vec![min_y], vec![1.0]); }

    let step = range / (GRID_POINTS - 1) as f64;
    let mut grid_y = Vec::with_capacity(GRID_POINTS);
    let mut density = Vec::with_capacity(GRID_POINTS);

    for i in 0..GRID_POINTS {
        let y = y_start + i as f64 * step;
        grid_y.push(y);

        let mut d = 0.0;
        for &xi in data {
            let u = (y - xi) / bandwidth;
            d += gaussian_kernel(u);
        }
        d /= n * bandwidth;
        density.push(d);
    }

    (grid_y, density)
}

/// Linear-interpolated percentile of sorted data
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PanelPos;

    fn make_table() -> Table {
        let class = ["a", "b", "a", "c", "b", "a"];
        let sex = ["m", "f", "f", "m", "m", "f"];
        Table::new(vec![
            Column::new(
                "class",
                DType::Text,
                class.iter().map(|s| Value::Text(s.to_string())).collect(),
            ),
            Column::new(
                "sex",
                DType::Text,
                sex.iter().map(|s| Value::Text(s.to_string())).collect(),
            ),
            Column::new(
                "age",
                DType::Float,
                [10.0, 20.0, 30.0, 40.0, 50.0, 60.0]
                    .iter()
                    .map(|v| Value::Float(*v))
                    .collect(),
            ),
            Column::new(
                "fare",
                DType::Int,
                [1, 2, 3, 4, 5, 6].iter().map(|v| Value::Int(*v)).collect(),
            ),
            Column::new("flat", DType::Int, vec![Value::Int(7); 6]),
        ])
        .unwrap()
    }

    fn chart(kind: ChartKind, x: &str) -> ChartSpec {
        ChartSpec::new(kind, PanelPos::new(0, 0), x)
    }

    #[test]
    fn test_percentile() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.5), 2.5);
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&[7.0], 0.75), 7.0);
    }

    #[test]
    fn test_box_stats_outliers() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 100.0];
        let stats = compute_box_stats(&data);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 4.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn test_histogram_bin_count() {
        let panel = prepare_panel(&make_table(), &chart(ChartKind::Histogram, "age")).unwrap();
        assert_eq!(panel.title, "Age Histogram");
        match panel.data {
            PanelData::Histogram { bins, density } => {
                // ceil(sqrt(6)) = 3
                assert_eq!(bins.len(), 3);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 6);
                assert_eq!(density.len(), 128);
            }
            other => panic!("Expected histogram, got {:?}", other),
        }
    }

    #[test]
    fn test_histogram_constant_column() {
        let panel = prepare_panel(&make_table(), &chart(ChartKind::Histogram, "flat")).unwrap();
        if let PanelData::Histogram { bins, .. } = panel.data {
            assert_eq!(bins.len(), 1);
            assert_eq!(bins[0].count, 6);
        } else {
            panic!("Expected histogram");
        }
    }

    #[test]
    fn test_bar_means_by_category_and_hue() {
        let spec = chart(ChartKind::Bar, "class")
            .with_y("age")
            .with_hue(Some("sex".to_string()));
        let panel = prepare_panel(&make_table(), &spec).unwrap();
        assert_eq!(panel.title, "Class Vs Age Group By Sex");
        if let PanelData::Bar(grouped) = panel.data {
            assert_eq!(grouped.categories, vec!["a", "b", "c"]);
            assert_eq!(grouped.hues, vec!["f", "m"]);
            // class a: f -> 30, 60; m -> 10
            let cell = grouped
                .cells
                .iter()
                .find(|c| c.category == 0 && c.hue == Some(0))
                .unwrap();
            assert_eq!(cell.value, 45.0);
        } else {
            panic!("Expected bar");
        }
    }

    #[test]
    fn test_distribution_box() {
        let panel = prepare_panel(&make_table(), &chart(ChartKind::Box, "age")).unwrap();
        if let PanelData::Distribution { stats, mean } = panel.data {
            assert_eq!(mean, 35.0);
            assert_eq!(stats.median, 35.0);
        } else {
            panic!("Expected distribution");
        }
    }

    #[test]
    fn test_counts_sorted_descending() {
        let panel = prepare_panel(&make_table(), &chart(ChartKind::Count, "class")).unwrap();
        if let PanelData::Count { bars } = panel.data {
            assert_eq!(
                bars,
                vec![("a".to_string(), 3), ("b".to_string(), 2), ("c".to_string(), 1)]
            );
        } else {
            panic!("Expected count");
        }
    }

    #[test]
    fn test_pie_fractions_sum_to_one() {
        let panel = prepare_panel(&make_table(), &chart(ChartKind::Pie, "sex")).unwrap();
        if let PanelData::Pie { slices } = panel.data {
            let total: f64 = slices.iter().map(|s| s.fraction).sum();
            assert!((total - 1.0).abs() < 1e-12);
        } else {
            panic!("Expected pie");
        }
    }

    #[test]
    fn test_line_averages_duplicate_x() {
        let table = Table::new(vec![
            Column::new(
                "x",
                DType::Int,
                vec![Value::Int(2), Value::Int(1), Value::Int(2)],
            ),
            Column::new(
                "y",
                DType::Float,
                vec![Value::Float(4.0), Value::Float(1.0), Value::Float(6.0)],
            ),
        ])
        .unwrap();
        let panel = prepare_panel(&table, &chart(ChartKind::Line, "x").with_y("y")).unwrap();
        if let PanelData::Line { points } = panel.data {
            assert_eq!(points, vec![(1.0, 1.0), (2.0, 5.0)]);
        } else {
            panic!("Expected line");
        }
    }

    #[test]
    fn test_scatter_series_per_hue() {
        let spec = chart(ChartKind::Scatter, "age")
            .with_y("fare")
            .with_hue(Some("sex".to_string()));
        let panel = prepare_panel(&make_table(), &spec).unwrap();
        if let PanelData::Scatter { series, .. } = panel.data {
            assert_eq!(series.len(), 2);
            assert_eq!(series[0].hue.as_deref(), Some("f"));
            assert_eq!(series[0].points.len(), 3);
        } else {
            panic!("Expected scatter");
        }
    }

    #[test]
    fn test_heatmap_constant_column_is_nan() {
        let spec = chart(ChartKind::Heatmap, "age").with_columns(vec![
            "age".to_string(),
            "fare".to_string(),
            "flat".to_string(),
        ]);
        let panel = prepare_panel(&make_table(), &spec).unwrap();
        if let PanelData::Heatmap { matrix, .. } = panel.data {
            assert!((matrix[0][1] - 1.0).abs() < 1e-12);
            assert!(matrix[2][0].is_nan());
        } else {
            panic!("Expected heatmap");
        }
    }

    #[test]
    fn test_numeric_category_order() {
        let labels = vec![Some("10".to_string()), Some("9".to_string()), None];
        assert_eq!(category_order(&labels), vec!["9", "10"]);
    }

    #[test]
    fn test_missing_column_error() {
        let result = prepare_panel(&make_table(), &chart(ChartKind::Histogram, "nope"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_text_column_not_numeric() {
        let result = prepare_panel(&make_table(), &chart(ChartKind::Histogram, "class"));
        assert!(result.unwrap_err().to_string().contains("is not numeric"));
    }
}
