//! Per-horizon training on a shared chronological split

use super::metrics::RegressionMetrics;
use super::xgboost::{ImportanceType, XGBoostConfig, XGBoostRegressor};
use crate::error::{ForecastError, Result};
use crate::timeseries::{Horizon, ModelingTable};
use chrono::NaiveDateTime;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Train/validation split rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Tables with more rows than this use `large_train_fraction`
    pub large_table_threshold: usize,
    pub large_train_fraction: f64,
    pub small_train_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            large_table_threshold: 200,
            large_train_fraction: 0.8,
            small_train_fraction: 0.7,
        }
    }
}

impl SplitConfig {
    /// Rows in the training prefix: `floor(n * fraction)`
    pub fn split_index(&self, n_rows: usize) -> usize {
        let fraction = if n_rows > self.large_table_threshold {
            self.large_train_fraction
        } else {
            self.small_train_fraction
        };
        ((n_rows as f64 * fraction).floor() as usize).min(n_rows)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("large_train_fraction", self.large_train_fraction),
            ("small_train_fraction", self.small_train_fraction),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ForecastError::ConfigError(format!("{} must be in [0, 1], got {}", name, v)));
            }
        }
        Ok(())
    }
}

/// The shared boundary between training prefix and validation suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitBoundary {
    /// First validation row in the modeling table
    pub split_index: usize,
    pub train_rows: usize,
    pub valid_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub timestamp: NaiveDateTime,
    /// Row position in the observation table
    pub source_row: usize,
    pub actual: f64,
    pub predicted: f64,
}

/// Validation-slice predictions for one horizon, in time order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionSeries {
    pub points: Vec<PredictionPoint>,
}

impl PredictionSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub score: f64,
}

/// A fitted horizon model with its validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonModel {
    pub horizon: Horizon,
    pub metrics: RegressionMetrics,
    pub predictions: PredictionSeries,
    pub model: XGBoostRegressor,
    /// One entry per feature column, in feature order
    pub importances: Vec<FeatureImportance>,
    pub train_rows: usize,
    pub valid_rows: usize,
    pub training_time_secs: f64,
}

impl HorizonModel {
    /// Per-round validation RMSE recorded while boosting
    pub fn eval_history(&self) -> &[f64] {
        self.model.eval_history()
    }
}

/// A horizon that could not be trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedHorizon {
    pub horizon: Horizon,
    pub train_rows: usize,
    pub valid_rows: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum HorizonFit {
    Trained(Box<HorizonModel>),
    Skipped(SkippedHorizon),
}

/// Everything the trainer produced for one modeling table
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub split: SplitBoundary,
    pub horizons: Vec<HorizonModel>,
    pub skipped: Vec<SkippedHorizon>,
}

impl TrainingOutcome {
    pub fn horizon(&self, name: &str) -> Option<&HorizonModel> {
        self.horizons.iter().find(|h| h.horizon.name == name)
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skipped.iter().any(|s| s.horizon.name == name)
    }
}

/// Fits one independent booster per horizon
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    booster: XGBoostConfig,
    split: SplitConfig,
    importance_type: ImportanceType,
}

impl Trainer {
    pub fn new(booster: XGBoostConfig, split: SplitConfig) -> Self {
        Self { booster, split, importance_type: ImportanceType::default() }
    }

    pub fn with_importance_type(mut self, kind: ImportanceType) -> Self {
        self.importance_type = kind;
        self
    }

    /// The boundary used for every horizon of this table
    pub fn split_boundary(&self, n_rows: usize) -> SplitBoundary {
        let split_index = self.split.split_index(n_rows);
        SplitBoundary { split_index, train_rows: split_index, valid_rows: n_rows - split_index }
    }

    /// Train every horizon; horizons without train or validation targets are skipped
    pub fn train(&self, table: &ModelingTable) -> Result<TrainingOutcome> {
        self.booster.validate()?;
        self.split.validate()?;

        let split = self.split_boundary(table.n_rows());
        info!(
            train_rows = split.train_rows,
            valid_rows = split.valid_rows,
            "Chronological split at row {}",
            split.split_index
        );

        let mut horizons = Vec::new();
        let mut skipped = Vec::new();
        for idx in 0..table.horizons().len() {
            match self.train_horizon(table, idx, &split)? {
                HorizonFit::Trained(model) => horizons.push(*model),
                HorizonFit::Skipped(skip) => skipped.push(skip),
            }
        }

        Ok(TrainingOutcome { split, horizons, skipped })
    }

    /// Fit a single horizon against the shared split
    pub fn train_horizon(&self, table: &ModelingTable, idx: usize, split: &SplitBoundary) -> Result<HorizonFit> {
        let horizon = table
            .horizons()
            .get(idx)
            .cloned()
            .ok_or_else(|| ForecastError::TrainingError(format!("no horizon at position {}", idx)))?;
        let y_all = table.horizon_target(idx);
        let n = table.n_rows();

        let train_idx: Vec<usize> = (0..split.split_index).filter(|&i| y_all[i].is_some()).collect();
        let valid_idx: Vec<usize> = (split.split_index..n).filter(|&i| y_all[i].is_some()).collect();

        if train_idx.is_empty() || valid_idx.is_empty() {
            warn!(
                horizon = %horizon.name,
                train_rows = train_idx.len(),
                valid_rows = valid_idx.len(),
                "Skipping horizon {}: insufficient valid samples",
                horizon.name
            );
            return Ok(HorizonFit::Skipped(SkippedHorizon {
                train_rows: train_idx.len(),
                valid_rows: valid_idx.len(),
                reason: "insufficient valid samples".to_string(),
                horizon,
            }));
        }

        let x = table.features();
        let x_train = x.select(Axis(0), &train_idx);
        let x_valid = x.select(Axis(0), &valid_idx);
        let y_train: Array1<f64> = train_idx.iter().filter_map(|&i| y_all[i]).collect();
        let y_valid: Array1<f64> = valid_idx.iter().filter_map(|&i| y_all[i]).collect();

        let start = Instant::now();
        let mut model = XGBoostRegressor::new(self.booster.clone());
        model.fit_with_eval(&x_train, &y_train, Some((&x_valid, &y_valid)))?;
        let pred = model.predict(&x_valid)?;
        let training_time_secs = start.elapsed().as_secs_f64();

        let metrics = RegressionMetrics::compute(&y_valid, &pred);
        info!(
            horizon = %horizon.name,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            secs = training_time_secs,
            "Trained horizon {}",
            horizon.name
        );

        let timestamps = table.timestamps();
        let source_rows = table.source_rows();
        let predictions = PredictionSeries {
            points: valid_idx
                .iter()
                .zip(y_valid.iter().zip(pred.iter()))
                .map(|(&i, (&actual, &predicted))| PredictionPoint {
                    timestamp: timestamps[i],
                    source_row: source_rows[i],
                    actual,
                    predicted,
                })
                .collect(),
        };

        let scores = model
            .feature_importances_by(self.importance_type)
            .unwrap_or_else(|| Array1::zeros(table.feature_names().len()));
        let importances = table
            .feature_names()
            .iter()
            .zip(scores.iter())
            .map(|(feature, &score)| FeatureImportance { feature: feature.clone(), score })
            .collect();

        Ok(HorizonFit::Trained(Box::new(HorizonModel {
            horizon,
            metrics,
            predictions,
            model,
            importances,
            train_rows: train_idx.len(),
            valid_rows: valid_idx.len(),
            training_time_secs,
        })))
    }
}
