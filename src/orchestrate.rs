//! Chart-grid planning for one primary column.
//!
//! Companions are drawn independently for every panel, so the same column
//! can recur across a grid. A panel whose companions cannot be drawn is left
//! out; the rest of the grid is still planned.

use crate::data::Table;
use crate::ir::{ChartKind, ChartSpec, FigureSpec, PanelPos};
use crate::roles::RolePartition;
use crate::runtime::{Artifact, Renderer};
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

/// Uniform pick from `pool` skipping every name in `exclude`.
fn choose<'a, R: Rng + ?Sized>(rng: &mut R, pool: &'a [String], exclude: &[&str]) -> Option<&'a str> {
    let candidates: Vec<&'a str> = pool
        .iter()
        .map(String::as_str)
        .filter(|c| !exclude.contains(c))
        .collect();
    candidates.choose(rng).copied()
}

/// Hue for a chart grouped by `category`: random among the other hue
/// candidates when there are several, the sole candidate otherwise. A hue
/// equal to the category itself adds nothing and is dropped.
fn pick_hue<R: Rng + ?Sized>(rng: &mut R, hues: &[String], category: &str) -> Option<String> {
    let hue = if hues.len() > 1 {
        choose(rng, hues, &[category])
    } else {
        hues.first().map(String::as_str)
    };
    hue.filter(|h| *h != category).map(str::to_string)
}

fn skipped(column: &str, kind: ChartKind, pos: PanelPos, reason: &str) {
    warn!(column, ?kind, row = pos.row, col = pos.col, "panel left blank: {}", reason);
}

/// Pie, count and strip on the first row; hue-grouped charts below when
/// there is more than one hue candidate.
pub fn plan_categorical<R: Rng + ?Sized>(
    column: &str,
    roles: &RolePartition,
    rng: &mut R,
) -> FigureSpec {
    let mut figure = FigureSpec::new(column);

    figure.push(ChartSpec::new(ChartKind::Pie, PanelPos::new(0, 0), column));
    figure.push(ChartSpec::new(ChartKind::Count, PanelPos::new(0, 1), column));

    let strip_pos = PanelPos::new(0, 2);
    match choose(rng, &roles.continuous, &[column]) {
        Some(y) => figure.push(ChartSpec::new(ChartKind::Strip, strip_pos, column).with_y(y)),
        None => skipped(column, ChartKind::Strip, strip_pos, "no continuous column"),
    }

    if roles.hue.len() <= 1 {
        debug!(column, hues = roles.hue.len(), "not enough hue candidates for grouped rows");
        return figure;
    }

    let grouped = [
        (ChartKind::Bar, PanelPos::new(1, 0)),
        (ChartKind::Strip, PanelPos::new(1, 1)),
        (ChartKind::Violin, PanelPos::new(1, 2)),
        (ChartKind::Strip, PanelPos::new(2, 0)),
        (ChartKind::Box, PanelPos::new(2, 1)),
        (ChartKind::Bar, PanelPos::new(2, 2)),
    ];
    for (kind, pos) in grouped {
        let Some(y) = choose(rng, &roles.continuous, &[column]) else {
            skipped(column, kind, pos, "no continuous column");
            continue;
        };
        let Some(hue) = choose(rng, &roles.hue, &[column, y]) else {
            skipped(column, kind, pos, "no hue column distinct from the axes");
            continue;
        };
        figure.push(
            ChartSpec::new(kind, pos, column)
                .with_y(y)
                .with_hue(Some(hue.to_string())),
        );
    }

    figure
}

/// Histogram and distribution box always; pairwise charts, the correlation
/// heatmap and the grouped scatter row only when there are companions.
pub fn plan_continuous<R: Rng + ?Sized>(
    column: &str,
    table: &Table,
    roles: &RolePartition,
    rng: &mut R,
) -> FigureSpec {
    let mut figure = FigureSpec::new(column);
    let has_partner = roles.continuous.iter().any(|c| c != column);

    figure.push(ChartSpec::new(ChartKind::Histogram, PanelPos::new(0, 0), column));

    if has_partner {
        for (kind, pos) in [
            (ChartKind::Line, PanelPos::new(0, 1)),
            (ChartKind::Scatter, PanelPos::new(0, 2)),
        ] {
            if let Some(y) = choose(rng, &roles.continuous, &[column]) {
                figure.push(ChartSpec::new(kind, pos, column).with_y(y));
            }
        }
    } else {
        debug!(column, "no second continuous column for line and scatter");
    }

    figure.push(ChartSpec::new(ChartKind::Box, PanelPos::new(1, 0), column));

    if has_partner {
        let numeric: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.dtype.is_numeric())
            .map(|c| c.name.clone())
            .collect();
        figure.push(
            ChartSpec::new(ChartKind::Heatmap, PanelPos::new(1, 1), column).with_columns(numeric),
        );
    }

    let box_pos = PanelPos::new(1, 2);
    match choose(rng, &roles.categorical, &[column]) {
        Some(category) => {
            let hue = pick_hue(rng, &roles.hue, category);
            figure.push(
                ChartSpec::new(ChartKind::Box, box_pos, category)
                    .with_y(column)
                    .with_hue(hue),
            );
        }
        None => skipped(column, ChartKind::Box, box_pos, "no categorical column"),
    }

    let partners = roles.continuous.iter().filter(|c| *c != column).count();
    if partners > 0 && roles.categorical.len() > 1 {
        // (hue, style) per scatter variant
        for (pos, with_style) in [
            (PanelPos::new(2, 0), true),
            (PanelPos::new(2, 1), false),
            (PanelPos::new(2, 2), true),
        ] {
            let (Some(y), Some(category)) = (
                choose(rng, &roles.continuous, &[column]),
                choose(rng, &roles.categorical, &[]),
            ) else {
                skipped(column, ChartKind::Scatter, pos, "no companion columns");
                continue;
            };
            let style = if with_style {
                pick_hue(rng, &roles.hue, category)
            } else {
                None
            };
            figure.push(
                ChartSpec::new(ChartKind::Scatter, pos, column)
                    .with_y(y)
                    .with_hue(Some(category.to_string()))
                    .with_style(style),
            );
        }
    } else {
        debug!(column, "grouped scatter row needs more companions");
    }

    figure
}

/// Plan and render the grid of a categorical column
pub fn orchestrate_categorical<R: Rng + ?Sized>(
    table: &Table,
    column: &str,
    roles: &RolePartition,
    renderer: &dyn Renderer,
    rng: &mut R,
) -> Result<Artifact> {
    let figure = plan_categorical(column, roles, rng);
    renderer.render(table, &figure)
}

/// Plan and render the grid of a continuous column
pub fn orchestrate_continuous<R: Rng + ?Sized>(
    table: &Table,
    column: &str,
    roles: &RolePartition,
    renderer: &dyn Renderer,
    rng: &mut R,
) -> Result<Artifact> {
    let figure = plan_continuous(column, table, roles, rng);
    renderer.render(table, &figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, DType, Value};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn roles(categorical: &[&str], continuous: &[&str], hue: &[&str]) -> RolePartition {
        RolePartition {
            categorical: names(categorical),
            continuous: names(continuous),
            hue: names(hue),
            other: vec![],
        }
    }

    fn numeric_table(cols: &[&str]) -> Table {
        Table::new(
            cols.iter()
                .map(|c| Column::new(*c, DType::Float, vec![Value::Float(1.0), Value::Float(2.0)]))
                .collect(),
        )
        .unwrap()
    }

    fn positions(figure: &FigureSpec) -> Vec<(usize, usize)> {
        let mut p: Vec<_> = figure.panels.iter().map(|c| (c.position.row, c.position.col)).collect();
        p.sort();
        p
    }

    #[test]
    fn test_choose_respects_exclusions() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = names(&["a", "b", "c"]);
        for _ in 0..50 {
            let pick = choose(&mut rng, &pool, &["a", "c"]);
            assert_eq!(pick, Some("b"));
        }
        assert_eq!(choose(&mut rng, &pool, &["a", "b", "c"]), None);
    }

    #[test]
    fn test_categorical_full_grid() {
        let r = roles(&["sex", "class", "embarked"], &["age", "fare"], &["sex", "class", "embarked"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let fig = plan_categorical("sex", &r, &mut rng);
            assert_eq!(fig.title, "Sex Analysis");
            assert_eq!(fig.panels.len(), 9);
            for chart in &fig.panels {
                assert_eq!(chart.x, "sex");
                if let Some(hue) = &chart.hue {
                    assert_ne!(hue, "sex");
                    assert_ne!(Some(hue), chart.y.as_ref());
                }
            }
            assert_eq!(fig.panel_at(1, 2).map(|c| c.kind), Some(ChartKind::Violin));
            assert_eq!(fig.panel_at(2, 1).map(|c| c.kind), Some(ChartKind::Box));
        }
    }

    #[test]
    fn test_categorical_without_hues() {
        let r = roles(&["city"], &["age"], &[]);
        let mut rng = StdRng::seed_from_u64(1);
        let fig = plan_categorical("city", &r, &mut rng);
        assert_eq!(positions(&fig), vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(fig.panel_at(0, 2).and_then(|c| c.y.as_deref()), Some("age"));
    }

    #[test]
    fn test_categorical_without_continuous() {
        let r = roles(&["sex", "class"], &[], &["sex", "class"]);
        let mut rng = StdRng::seed_from_u64(1);
        let fig = plan_categorical("sex", &r, &mut rng);
        assert_eq!(positions(&fig), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_continuous_single_member() {
        let r = roles(&["sex"], &["age"], &["sex"]);
        let table = numeric_table(&["age"]);
        let mut rng = StdRng::seed_from_u64(3);
        let fig = plan_continuous("age", &table, &r, &mut rng);
        assert_eq!(positions(&fig), vec![(0, 0), (1, 0), (1, 2)]);
        let grouped_box = fig.panel_at(1, 2).unwrap();
        assert_eq!(grouped_box.x, "sex");
        assert_eq!(grouped_box.y.as_deref(), Some("age"));
        // The only hue candidate is the category itself
        assert_eq!(grouped_box.hue, None);
    }

    #[test]
    fn test_continuous_full_grid() {
        let r = roles(&["sex", "class"], &["age", "fare", "sibsp"], &["sex", "class"]);
        let table = numeric_table(&["age", "fare", "sibsp"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let fig = plan_continuous("age", &table, &r, &mut rng);
            assert_eq!(fig.panels.len(), 9);
            for pos in [(0, 1), (0, 2), (2, 0), (2, 1), (2, 2)] {
                let chart = fig.panel_at(pos.0, pos.1).unwrap();
                assert_ne!(chart.y.as_deref(), Some("age"));
            }
            let heatmap = fig.panel_at(1, 1).unwrap();
            assert_eq!(heatmap.columns, names(&["age", "fare", "sibsp"]));
            let scatter = fig.panel_at(2, 0).unwrap();
            assert!(scatter.hue.is_some());
            if let Some(style) = &scatter.style {
                assert_ne!(Some(style), scatter.hue.as_ref());
            }
            assert_eq!(fig.panel_at(2, 1).unwrap().style, None);
        }
    }

    #[test]
    fn test_continuous_row_two_needs_two_categoricals() {
        let r = roles(&["sex"], &["age", "fare"], &["sex"]);
        let table = numeric_table(&["age", "fare"]);
        let mut rng = StdRng::seed_from_u64(11);
        let fig = plan_continuous("age", &table, &r, &mut rng);
        assert!(fig.panels.iter().all(|c| c.position.row < 2));
        assert_eq!(fig.panels.len(), 6);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let r = roles(&["a", "b", "c"], &["x", "y", "z"], &["a", "b", "c"]);
        let table = numeric_table(&["x", "y", "z"]);
        let plan = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            plan_continuous("x", &table, &r, &mut rng)
        };
        assert_eq!(plan(42), plan(42));
    }
}
