//! End-to-end forecasting run: load, prepare, engineer, train

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export;
use crate::preprocessing::{self, ObservationTable, RawTable};
use crate::timeseries::{FeatureBuilder, ModelingTable};
use crate::training::{Trainer, TrainingOutcome};
use crate::utils::CsvLoader;
use crate::visualization::DashboardReport;
use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Runs the whole pipeline for one uploaded file.
///
/// Any error from loading through feature building aborts the run. Horizons
/// that cannot be trained are reported in the outcome instead.
#[derive(Debug, Clone, Default)]
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<ForecastRun> {
        let raw = CsvLoader::new().load_path(path)?;
        self.run_table(raw)
    }

    /// Run on uploaded CSV content
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<ForecastRun> {
        let raw = CsvLoader::new().load_bytes(bytes)?;
        self.run_table(raw)
    }

    pub fn run_table(&self, raw: RawTable) -> Result<ForecastRun> {
        self.config.validate()?;
        info!("Loaded {} rows with columns: {}", raw.n_rows(), raw.column_names().join(", "));

        let observations = preprocessing::prepare(raw)?;

        let builder = FeatureBuilder::new(self.config.features.clone());
        let modeling = builder.build(&observations)?;
        info!(target = %modeling.target(), "Forecasting {}", modeling.target());

        let trainer = Trainer::new(self.config.booster.clone(), self.config.split.clone())
            .with_importance_type(self.config.importance_type);
        let outcome = trainer.train(&modeling)?;

        Ok(ForecastRun { observations, modeling, outcome, top_importances: self.config.top_importances })
    }
}

/// Results of a successful run
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub observations: ObservationTable,
    pub modeling: ModelingTable,
    pub outcome: TrainingOutcome,
    top_importances: usize,
}

impl ForecastRun {
    pub fn target(&self) -> &str {
        self.modeling.target()
    }

    /// Timestamps of the training prefix
    pub fn train_timestamps(&self) -> &[NaiveDateTime] {
        &self.modeling.timestamps()[..self.outcome.split.split_index]
    }

    /// Timestamps of the validation suffix
    pub fn valid_timestamps(&self) -> &[NaiveDateTime] {
        &self.modeling.timestamps()[self.outcome.split.split_index..]
    }

    pub fn export_frame(&self) -> Result<DataFrame> {
        export::build_export_frame(&self.observations, self.target(), &self.outcome)
    }

    pub fn export_csv(&self) -> Result<Vec<u8>> {
        export::export_csv(&self.observations, self.target(), &self.outcome)
    }

    pub fn save_export(&self, path: impl AsRef<Path>) -> Result<()> {
        export::save_export(&self.observations, self.target(), &self.outcome, path)
    }

    pub fn report(&self) -> DashboardReport {
        DashboardReport::from_outcome(
            self.target(),
            self.modeling.original_rows(),
            self.modeling.n_rows(),
            &self.outcome,
            self.top_importances,
        )
    }
}
