//! Irradiance Forecast - multi-horizon GHI forecasting
//!
//! This crate turns an hourly solar irradiance and weather CSV into three
//! independent gradient-boosted forecasts of global horizontal irradiance
//! (+3 hours, +24 hours, +7 days) with validation metrics, feature
//! importances and a prediction export.
//!
//! # Modules
//!
//! ## Pipeline
//! - [`preprocessing`] - Header normalization, numeric cleaning, time indexing
//! - [`timeseries`] - Horizon targets, lags, rolling statistics, calendar features
//! - [`training`] - Gradient-boosted trees, metrics, per-horizon trainer
//! - [`pipeline`] - End-to-end run over an uploaded CSV
//!
//! ## Output
//! - [`export`] - Prediction CSV export and re-import
//! - [`visualization`] - Data for the metrics table, overlays, importances, residuals
//! - [`cli`] - Command-line interface
//!
//! ## Support
//! - [`config`] - Pipeline configuration
//! - [`utils`] - CSV loading and saving

// Core error handling
pub mod error;
pub mod config;

// Pipeline stages
pub mod preprocessing;
pub mod timeseries;
pub mod training;
pub mod pipeline;

// Output
pub mod export;
pub mod visualization;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{ForecastError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ForecastError, Result};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Preprocessing
    pub use crate::preprocessing::{prepare, HeaderNormalizer, NumericCleaner, ObservationTable, RawTable, TimeIndexer};

    // Features
    pub use crate::timeseries::{FeatureBuilder, FeatureConfig, Horizon, ModelingTable};

    // Training
    pub use crate::training::{
        ImportanceType, RegressionMetrics, SplitConfig, Trainer, TrainingOutcome, XGBoostConfig, XGBoostRegressor,
    };

    // Pipeline and output
    pub use crate::export::{prediction_column_name, read_predictions, ExportedPredictions};
    pub use crate::pipeline::{ForecastPipeline, ForecastRun};
    pub use crate::visualization::DashboardReport;
}
