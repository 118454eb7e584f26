use autoviz::identify::IdentifierDecision;
use autoviz::impute::coerce_and_impute;
use autoviz::purify::purify;
use autoviz::ir::{ChartKind, FigureSpec};
use autoviz::orchestrate::{plan_categorical, plan_continuous};
use autoviz::{
    analyze, clean, AnalysisConfig, Artifact, Column, DType, OutputFormat, Renderer, Role,
    Table, Value,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Renderer that keeps the planned figures instead of drawing them
#[derive(Default)]
struct PlanRecorder {
    figures: RefCell<Vec<FigureSpec>>,
}

impl Renderer for PlanRecorder {
    fn render(&self, _table: &Table, figure: &FigureSpec) -> anyhow::Result<Artifact> {
        self.figures.borrow_mut().push(figure.clone());
        Ok(Artifact {
            column: figure.column.clone(),
            format: OutputFormat::Png,
            bytes: Vec::new(),
        })
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn passengers() -> Table {
    Table::from_csv_path(Path::new("test/passengers.csv")).expect("Failed to read test CSV")
}

fn text_column(name: &str, values: Vec<Option<&str>>) -> Column {
    Column::new(
        name,
        DType::Object,
        values
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
    )
}

#[test]
fn test_passenger_scenario_cleaning() {
    let n = 50usize;
    let ages: Vec<Value> = (0..n)
        .map(|i| if i % 5 == 0 { Value::Null } else { Value::Int(18 + (i as i64 * 7) % 50) })
        .collect();
    let sex: Vec<Option<&str>> = (0..n)
        .map(|i| match i {
            3 => None,
            i if i % 3 == 0 => Some("Female"),
            _ => Some("male"),
        })
        .collect();
    let class: Vec<Option<&str>> = (0..n).map(|i| Some(["first", "second", "third"][i % 3])).collect();

    let table = Table::new(vec![
        Column::new("passenger_id", DType::Int, (0..n as i64).map(Value::Int).collect()),
        Column::new("age", DType::Int, ages.clone()),
        text_column("sex", sex),
        text_column("class", class),
    ])
    .unwrap();

    let (cleaned, report) = clean(table, &AnalysisConfig::default());

    assert_eq!(report.identifier, IdentifierDecision::Dropped("passenger_id".to_string()));
    assert!(cleaned.column("passenger_id").is_none());
    assert_eq!(cleaned.null_count(), 0);

    let known: Vec<f64> = ages.iter().filter_map(Value::as_f64).collect();
    let mean = known.iter().sum::<f64>() / known.len() as f64;
    let age = cleaned.column("age").unwrap();
    assert_eq!(age.dtype, DType::Float);
    assert_eq!(age.values[0], Value::Float(mean));
    assert_eq!(age.values[1], Value::Float(ages[1].as_f64().unwrap()));

    let sex = cleaned.column("sex").unwrap();
    assert_eq!(sex.dtype, DType::Text);
    // "male" outnumbers "female"
    assert_eq!(sex.values[3], Value::Text("male".to_string()));
    assert_eq!(sex.values[0], Value::Text("female".to_string()));

    let roles = autoviz::roles::classify(&cleaned, 15, 4);
    assert_eq!(roles.role_of("class"), Some(Role::Categorical));
    assert!(roles.is_hue("class"));
    assert_eq!(cleaned.column("class").unwrap().cardinality(), 3);
}

#[test]
fn test_mean_fill_can_expose_an_identifier_on_a_second_clean() {
    let table = Table::new(vec![
        Column::new("a", DType::Int, vec![Value::Int(1), Value::Int(3), Value::Null]),
        text_column("b", vec![Some("x"), Some("x"), Some("y")]),
    ])
    .unwrap();
    let config = AnalysisConfig::default();

    let (once, report) = clean(table, &config);
    assert_eq!(report.identifier, IdentifierDecision::NoCandidates);
    assert_eq!(
        once.column("a").unwrap().values,
        vec![Value::Float(1.0), Value::Float(3.0), Value::Float(2.0)]
    );

    // Purification and coercion leave the cleaned table as it is
    let (purified, _) = purify(once.clone(), &config.sentinels, config.null_threshold);
    let (recoerced, _) = coerce_and_impute(purified, config.sample_size);
    assert_eq!(recoerced, once);

    // The filled mean made "a" all-unique, so identifier detection now drops it
    let (twice, report) = clean(once, &config);
    assert_eq!(report.identifier, IdentifierDecision::Dropped("a".to_string()));
    assert_eq!(twice.column_names(), vec!["b"]);
}

#[test]
fn test_high_cardinality_text_is_other() {
    let values: Vec<String> = (0..1000u32).map(|i| format!("v{}", i.min(998))).collect();
    let table = Table::new(vec![
        text_column("label", values.iter().map(|s| Some(s.as_str())).collect()),
        Column::new("n", DType::Int, (0..1000).map(|i| Value::Int(i % 7)).collect()),
    ])
    .unwrap();

    let recorder = PlanRecorder::default();
    let mut rng = StdRng::seed_from_u64(0);
    let result = analyze(table, &AnalysisConfig::default(), &recorder, &mut rng).unwrap();

    assert_eq!(result.other_columns, vec!["label"]);
    assert_eq!(result.roles.categorical, vec!["n"]);
    assert!(recorder.figures.borrow().iter().all(|f| f.column != "label"));
}

#[test]
fn test_continuous_single_member_grid() {
    let n = 40;
    let codes: Vec<String> = (0..n).map(|i| format!("c{}", i)).collect();
    // Two all-unique columns and neither named like an id: nothing is dropped
    let table = Table::new(vec![
        Column::new("x", DType::Float, (0..n).map(|i| Value::Float(i as f64 * 0.5)).collect()),
        text_column("code", codes.iter().map(|s| Some(s.as_str())).collect()),
        text_column("g", (0..n).map(|i| Some(["a", "b"][i % 2])).collect()),
        text_column("tag", (0..n).map(|i| Some(["p", "q", "r", "s"][i % 4])).collect()),
    ])
    .unwrap();

    let (cleaned, _) = clean(table, &AnalysisConfig::default());
    let roles = autoviz::roles::classify(&cleaned, 15, 4);
    assert_eq!(roles.continuous, vec!["x"]);
    let mut rng = StdRng::seed_from_u64(9);

    let figure = plan_continuous("x", &cleaned, &roles, &mut rng);
    let kinds: Vec<ChartKind> = figure.panels.iter().map(|c| c.kind).collect();
    assert!(kinds.contains(&ChartKind::Histogram));
    assert!(figure.panel_at(1, 0).is_some());
    for missing in [(0, 1), (0, 2), (1, 1), (2, 0), (2, 1), (2, 2)] {
        assert!(figure.panel_at(missing.0, missing.1).is_none(), "{:?}", missing);
    }
}

#[test]
fn test_categorical_without_hue_candidates() {
    let n = 60;
    let table = Table::new(vec![
        Column::new("v", DType::Float, (0..n).map(|i| Value::Float((i % 30) as f64)).collect()),
        text_column(
            "city",
            (0..n)
                .map(|i| Some(["oslo", "lima", "pune", "kiev", "nuuk"][i % 5]))
                .collect(),
        ),
    ])
    .unwrap();

    let (cleaned, _) = clean(table, &AnalysisConfig::default());
    let roles = autoviz::roles::classify(&cleaned, 15, 4);
    assert!(roles.hue.is_empty());

    let mut rng = StdRng::seed_from_u64(2);
    let figure = plan_categorical("city", &roles, &mut rng);
    let kinds: Vec<ChartKind> = figure.panels.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ChartKind::Pie, ChartKind::Count, ChartKind::Strip]);
    assert!(figure.panels.iter().all(|c| c.position.row == 0));
}

#[test]
fn test_fixture_analysis() {
    let recorder = PlanRecorder::default();
    let mut rng = StdRng::seed_from_u64(3);
    let result = analyze(passengers(), &AnalysisConfig::default(), &recorder, &mut rng).unwrap();

    assert_eq!(
        result.cleaning.identifier,
        IdentifierDecision::Dropped("passenger_id".to_string())
    );
    assert_eq!(result.cleaning.purify.dropped, vec!["cabin"]);
    assert_eq!(result.roles.categorical, vec!["sex", "class", "embarked"]);
    assert_eq!(result.roles.continuous, vec!["age", "fare"]);
    assert_eq!(result.other_columns, vec!["name"]);
    assert_eq!(result.categorical_figures.len(), 3);
    assert_eq!(result.continuous_figures.len(), 2);
    assert_eq!(result.table.null_count(), 0);
}

#[test]
fn test_fixture_renders_png() {
    let config = AnalysisConfig {
        render: autoviz::RenderOptions {
            width: 600,
            height: 400,
            format: OutputFormat::Png,
        },
        ..AnalysisConfig::default()
    };
    let renderer = autoviz::PlottersRenderer::new(config.render.clone());
    let mut rng = StdRng::seed_from_u64(3);
    let result = analyze(passengers(), &config, &renderer, &mut rng).unwrap();

    assert!(result.failures.is_empty(), "{:?}", result.failures);
    for artifact in result.categorical_figures.iter().chain(&result.continuous_figures) {
        assert!(is_valid_png(&artifact.bytes), "{} is not a PNG", artifact.column);
    }
}

// ===== CLI =====

fn run_autoviz(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_autoviz"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to spawn autoviz")
}

#[test]
fn test_cli_end_to_end() {
    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_str().unwrap();
    let output = run_autoviz(&[
        "test/passengers.csv",
        "--output-dir",
        out_dir,
        "--seed",
        "7",
        "--width",
        "600",
        "--height",
        "400",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let sex = fs::read(out.path().join("categorical/sex.png")).unwrap();
    assert!(is_valid_png(&sex));
    assert!(out.path().join("continuous/fare.png").exists());
    assert!(out.path().join("other_columns.png").exists());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["other_columns"], serde_json::json!(["name"]));
    assert_eq!(summary["cleaning"]["identifier"]["columns"], "passenger_id");
    assert_eq!(summary["failures"], serde_json::json!([]));
}

#[test]
fn test_cli_svg_from_json() {
    let out = tempfile::tempdir().unwrap();
    let output = run_autoviz(&[
        "test/weather.json",
        "--output-dir",
        out.path().to_str().unwrap(),
        "--format",
        "svg",
        "--seed",
        "1",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let svg = fs::read_to_string(out.path().join("categorical/city.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn test_cli_keeps_figures_of_colliding_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("colliding.csv");
    let mut csv = String::from("a b,a_b,v\n");
    for i in 0..30 {
        csv.push_str(&format!("{},{},{}\n", ["x", "y"][i % 2], ["p", "q", "r"][i % 3], (i % 20) as f64 * 1.5));
    }
    fs::write(&input, csv).unwrap();
    let out = dir.path().join("out");

    let output = run_autoviz(&[
        input.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--seed",
        "4",
        "--width",
        "600",
        "--height",
        "400",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(out.join("categorical/a_b.png").exists());
    assert!(out.join("categorical/a_b-2.png").exists());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    let paths = summary["categorical_figures"].as_array().unwrap();
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);
}

#[test]
fn test_cli_header_only_fails() {
    let out = tempfile::tempdir().unwrap();
    let output = run_autoviz(&[
        "test/header_only.csv",
        "--output-dir",
        out.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one data row"));
}

#[test]
fn test_cli_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{ "null_threshold": 2.0 }"#).unwrap();
    let output = run_autoviz(&[
        "test/passengers.csv",
        "--config",
        config.to_str().unwrap(),
        "--output-dir",
        dir.path().join("out").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("null_threshold"));
}
