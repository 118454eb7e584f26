use anyhow::{Context, Result};
use autoviz::describe::{
    describe_categorical, describe_columns, describe_numeric, CategoricalSummary,
    ColumnDescriptor, NumericSummary,
};
use autoviz::{
    analyze, AnalysisConfig, AnalysisResult, Artifact, CleaningReport, ColumnFailure,
    OutputFormat, PlottersRenderer, RolePartition, Table,
};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autoviz")]
#[command(about = "Clean a table and chart every column automatically", long_about = None)]
struct Args {
    /// Input table: a .csv or .json file, or '-' to read CSV from stdin
    input: String,

    /// Directory the figures and summary.json are written to
    #[arg(short, long, default_value = "autoviz-out")]
    output_dir: PathBuf,

    /// JSON file with analysis thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for companion column choice; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    rows: usize,
    cols: usize,
    cleaning: &'a CleaningReport,
    roles: &'a RolePartition,
    columns: Vec<ColumnDescriptor>,
    numeric: Vec<NumericSummary>,
    categorical: Vec<CategoricalSummary>,
    categorical_figures: Vec<PathBuf>,
    continuous_figures: Vec<PathBuf>,
    other_columns: &'a [String],
    other_columns_figure: Option<PathBuf>,
    failures: &'a [ColumnFailure],
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_table(input: &str) -> Result<Table> {
    if input == "-" {
        return Table::from_csv_reader(io::stdin().lock())
            .context("Failed to read CSV from stdin");
    }

    let path = Path::new(input);
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Table::from_json_str(&text).with_context(|| format!("Failed to load '{}'", path.display()))
    } else {
        Table::from_csv_path(path).with_context(|| format!("Failed to load '{}'", path.display()))
    }
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_path(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(format) = args.format {
        config.render.format = format;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Column names may hold path separators or spaces
fn file_stem(column: &str) -> String {
    let stem: String = column
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "column".to_string()
    } else {
        stem
    }
}

/// Distinct names can sanitise to the same stem; later ones get `-2`, `-3`...
fn unique_stem(column: &str, used: &mut HashSet<String>) -> String {
    let base = file_stem(column);
    let mut stem = base.clone();
    let mut n = 1;
    while !used.insert(stem.to_lowercase()) {
        n += 1;
        stem = format!("{}-{}", base, n);
    }
    stem
}

fn write_figures(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create '{}'", dir.display()))?;
    let mut used = HashSet::new();
    artifacts
        .iter()
        .map(|artifact| {
            let path = dir.join(format!(
                "{}.{}",
                unique_stem(&artifact.column, &mut used),
                artifact.format.extension()
            ));
            fs::write(&path, &artifact.bytes)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            Ok(path)
        })
        .collect()
}

fn write_outputs(
    out: &Path,
    result: &AnalysisResult,
    renderer: &PlottersRenderer,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let categorical_figures = write_figures(&out.join("categorical"), &result.categorical_figures)?;
    let continuous_figures = write_figures(&out.join("continuous"), &result.continuous_figures)?;

    let other_columns_figure = if result.other_columns.is_empty() {
        None
    } else {
        let artifact = renderer.render_other_columns(&result.other_columns)?;
        let path = out.join(format!("other_columns.{}", artifact.format.extension()));
        fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Some(path)
    };

    let (rows, cols) = result.table.shape();
    let summary = Summary {
        rows,
        cols,
        cleaning: &result.cleaning,
        roles: &result.roles,
        columns: describe_columns(&result.table, config.sample_size),
        numeric: describe_numeric(&result.table),
        categorical: describe_categorical(&result.table),
        categorical_figures,
        continuous_figures,
        other_columns: &result.other_columns,
        other_columns_figure,
        failures: &result.failures,
    };

    let path = out.join("summary.json");
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    fs::write(&path, json).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args)?;
    let table = load_table(&args.input)?;
    info!(rows = table.n_rows(), cols = table.n_cols(), input = %args.input, "table loaded");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let renderer = PlottersRenderer::new(config.render.clone());
    let result = analyze(table, &config, &renderer, &mut rng).context("Analysis failed")?;

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create '{}'", args.output_dir.display()))?;
    let summary = write_outputs(&args.output_dir, &result, &renderer, &config)?;
    info!(summary = %summary.display(), "outputs written");

    Ok(())
}
