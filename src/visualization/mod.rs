//! Dashboard presentation data
//!
//! Rendering is left to whatever front end consumes the report. This module
//! only shapes the trainer's results into the series each view plots:
//! the metrics table, actual-vs-predicted overlays, importance bars and
//! residual scatter.

use crate::error::Result;
use crate::training::{FeatureImportance, SkippedHorizon, SplitBoundary, TrainingOutcome};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of the metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub horizon: String,
    pub title: String,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub valid_rows: usize,
}

/// Actual and predicted values over the validation slice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaySeries {
    pub horizon: String,
    pub title: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceChart {
    pub horizon: String,
    pub title: String,
    /// Highest score first
    pub features: Vec<FeatureImportance>,
}

/// Residual scatter: x = predicted, y = actual - predicted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualSeries {
    pub horizon: String,
    pub predicted: Vec<f64>,
    pub residuals: Vec<f64>,
}

/// Everything the dashboard shows after a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub target: String,
    pub original_rows: usize,
    pub modeling_rows: usize,
    pub split: SplitBoundary,
    pub metrics: Vec<MetricsRow>,
    pub overlays: Vec<OverlaySeries>,
    pub importances: Vec<ImportanceChart>,
    pub residuals: Vec<ResidualSeries>,
    pub skipped: Vec<SkippedHorizon>,
}

impl DashboardReport {
    pub fn from_outcome(
        target: &str,
        original_rows: usize,
        modeling_rows: usize,
        outcome: &TrainingOutcome,
        top_n: usize,
    ) -> Self {
        let mut metrics = Vec::with_capacity(outcome.horizons.len());
        let mut overlays = Vec::with_capacity(outcome.horizons.len());
        let mut importances = Vec::with_capacity(outcome.horizons.len());
        let mut residuals = Vec::with_capacity(outcome.horizons.len());

        for model in &outcome.horizons {
            let h = &model.horizon;
            metrics.push(MetricsRow {
                horizon: h.name.clone(),
                title: h.title.clone(),
                mae: model.metrics.mae,
                rmse: model.metrics.rmse,
                r2: model.metrics.r2,
                train_rows: model.train_rows,
                valid_rows: model.valid_rows,
            });

            let points = &model.predictions.points;
            overlays.push(OverlaySeries {
                horizon: h.name.clone(),
                title: h.title.clone(),
                timestamps: points.iter().map(|p| p.timestamp).collect(),
                actual: points.iter().map(|p| p.actual).collect(),
                predicted: points.iter().map(|p| p.predicted).collect(),
            });

            importances.push(ImportanceChart {
                horizon: h.name.clone(),
                title: h.title.clone(),
                features: top_importances(&model.importances, top_n),
            });

            residuals.push(ResidualSeries {
                horizon: h.name.clone(),
                predicted: points.iter().map(|p| p.predicted).collect(),
                residuals: points.iter().map(|p| p.actual - p.predicted).collect(),
            });
        }

        Self {
            target: target.to_string(),
            original_rows,
            modeling_rows,
            split: outcome.split,
            metrics,
            overlays,
            importances,
            residuals,
            skipped: outcome.skipped.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// The `n` highest-scoring features, descending. Ties keep feature order.
pub fn top_importances(importances: &[FeatureImportance], n: usize) -> Vec<FeatureImportance> {
    let mut sorted = importances.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imp(feature: &str, score: f64) -> FeatureImportance {
        FeatureImportance { feature: feature.to_string(), score }
    }

    #[test]
    fn test_top_importances_sorted_and_truncated() {
        let all = vec![imp("a", 0.1), imp("b", 0.5), imp("c", 0.1), imp("d", 0.3)];
        let top = top_importances(&all, 3);
        let names: Vec<&str> = top.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_top_importances_short_list() {
        let top = top_importances(&[imp("x", 1.0)], 15);
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_empty_outcome_report() {
        let outcome = TrainingOutcome {
            split: SplitBoundary { split_index: 0, train_rows: 0, valid_rows: 0 },
            horizons: Vec::new(),
            skipped: Vec::new(),
        };
        let report = DashboardReport::from_outcome("GHI", 10, 0, &outcome, 15);
        assert!(report.metrics.is_empty());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"target\": \"GHI\""));
    }
}
