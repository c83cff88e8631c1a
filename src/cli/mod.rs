//! Irradiance forecasting CLI
//!
//! Command-line front end standing in for the dashboard: runs a forecast on a
//! CSV, prints the metrics table and writes the prediction export and the
//! report data.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::preprocessing::{self, HeaderNormalizer};
use crate::timeseries::{FeatureBuilder, EXOGENOUS_CANDIDATES};
use crate::utils::CsvLoader;
use crate::visualization::DashboardReport;
use crate::pipeline::ForecastPipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_warn(msg: &str) {
    println!("  {} {}", "!".yellow(), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn fmt_metric(v: f64) -> String {
    if v.is_finite() { format!("{:.3}", v) } else { "n/a".to_string() }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "irradiance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-horizon GHI forecasting with gradient-boosted trees")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the +3h, +24h and +7d models and report validation accuracy
    Forecast {
        /// Input CSV with Year/Month/Day/Hour/Minute columns
        #[arg(short, long)]
        data: PathBuf,

        /// Where to write the prediction CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the dashboard report (JSON)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// JSON file overriding pipeline settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show what the pipeline would see in a CSV, without training
    Inspect {
        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_forecast(
    data_path: &Path,
    output: Option<&Path>,
    report_path: Option<&Path>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Forecast");

    let config = match config_path {
        Some(path) => {
            let config = PipelineConfig::from_json_file(path)?;
            step_ok(&format!("Loaded config {}", path.display()));
            config
        }
        None => PipelineConfig::default(),
    };

    step_run("Training models");
    let start = Instant::now();
    let run = ForecastPipeline::new(config).run_path(data_path)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    let report = run.report();
    print_summary(&report);

    if let Some(path) = output {
        run.save_export(path)?;
        step_ok(&format!("Predictions → {}", path.display()));
    }
    if let Some(path) = report_path {
        report.save_json(path)?;
        step_ok(&format!("Report → {}", path.display()));
    }

    println!();
    Ok(())
}

fn print_summary(report: &DashboardReport) {
    println!();
    println!("  {:<16} {}", muted("Target"), report.target.white().bold());
    println!(
        "  {:<16} {} → {}",
        muted("Rows"),
        report.original_rows,
        report.modeling_rows
    );
    println!(
        "  {:<16} {} train / {} validation",
        muted("Split"),
        report.split.train_rows,
        report.split.valid_rows
    );

    println!();
    println!(
        "  {:<16} {:>10} {:>10} {:>8} {:>8}",
        muted("Horizon"),
        muted("MAE"),
        muted("RMSE"),
        muted("R²"),
        muted("Rows")
    );
    println!("  {}", dim(&"─".repeat(56)));
    for row in &report.metrics {
        println!(
            "  {:<16} {:>10} {:>10} {:>8} {:>8}",
            row.title,
            fmt_metric(row.mae),
            fmt_metric(row.rmse),
            fmt_metric(row.r2),
            row.valid_rows
        );
    }
    println!("  {}", dim(&"─".repeat(56)));

    for skip in &report.skipped {
        step_warn(&format!(
            "Skipped {} ({}): {} train / {} validation rows",
            skip.horizon.title, skip.reason, skip.train_rows, skip.valid_rows
        ));
    }

    for chart in &report.importances {
        section(&format!("Top features · {}", chart.title));
        for f in &chart.features {
            println!("  {:<28} {:>8.4}", f.feature, f.score);
        }
    }
}

pub fn cmd_inspect(data_path: &Path) -> anyhow::Result<()> {
    section("Inspect");

    let raw = CsvLoader::new().load_path(data_path)?;
    println!("  {:<16} {}", muted("File"), data_path.display());
    println!("  {:<16} {}", muted("Rows"), raw.n_rows());
    println!("  {:<16} {}", muted("Columns"), raw.column_names().len());

    let renames = HeaderNormalizer::default().renames(raw.column_names());
    if !renames.is_empty() {
        println!();
        for (from, to) in &renames {
            println!("  {:<16} {} → {}", muted("Rename"), from, to.white());
        }
    }

    let observations = preprocessing::prepare(raw)?;
    if let (Some(first), Some(last)) = (observations.timestamps().first(), observations.timestamps().last()) {
        println!();
        println!("  {:<16} {} – {}", muted("Time range"), first, last);
    }

    let builder = FeatureBuilder::new(PipelineConfig::default().features);
    match builder.select_target(&observations) {
        Ok(target) => step_ok(&format!("Target: {}", target)),
        Err(e) => step_warn(&e.to_string()),
    }

    let exog: Vec<&str> = EXOGENOUS_CANDIDATES
        .iter()
        .copied()
        .filter(|c| observations.has_column(c))
        .collect();
    if exog.is_empty() {
        step_warn("No exogenous predictors found");
    } else {
        step_ok(&format!("Exogenous: {}", exog.join(", ")));
    }

    println!();
    Ok(())
}
