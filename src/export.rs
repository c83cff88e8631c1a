//! Prediction CSV export
//!
//! The export holds every indexed observation row with a leading timestamp
//! column and one prediction column per trained horizon. Predictions are
//! placed by row position, so duplicate timestamps never collide.

use crate::error::{ForecastError, Result};
use crate::preprocessing::{parse_numeric, ColumnKind, ObservationTable};
use crate::timeseries::Horizon;
use crate::training::TrainingOutcome;
use crate::utils::{CsvLoader, DataSaver};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `<target>_pred_<horizon>`, e.g. `GHI_pred_tplus24`
pub fn prediction_column_name(target: &str, horizon: &Horizon) -> String {
    format!("{}_pred_{}", target, horizon.name)
}

/// Build the downloadable frame
pub fn build_export_frame(
    observations: &ObservationTable,
    target: &str,
    outcome: &TrainingOutcome,
) -> Result<DataFrame> {
    let n = observations.n_rows();
    let mut columns: Vec<Column> = Vec::with_capacity(observations.columns().len() + outcome.horizons.len() + 1);

    let stamps: Vec<String> = observations
        .timestamps()
        .iter()
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .collect();
    columns.push(Column::new(TIMESTAMP_COLUMN.into(), stamps));

    for column in observations.columns() {
        let col = match column.kind {
            ColumnKind::Calendar => {
                let ints: Vec<Option<i64>> = column.values.iter().map(|v| v.map(|x| x as i64)).collect();
                Column::new(column.name.as_str().into(), ints)
            }
            ColumnKind::Measurement => Column::new(column.name.as_str().into(), column.values.clone()),
        };
        columns.push(col);
    }

    for model in &outcome.horizons {
        let mut values: Vec<Option<f64>> = vec![None; n];
        for point in &model.predictions.points {
            let slot = values.get_mut(point.source_row).ok_or_else(|| ForecastError::ShapeError {
                expected: format!("row < {}", n),
                actual: format!("prediction for row {}", point.source_row),
            })?;
            *slot = Some(point.predicted);
        }
        let name = prediction_column_name(target, &model.horizon);
        columns.push(Column::new(name.as_str().into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Render the export as CSV bytes
pub fn export_csv(observations: &ObservationTable, target: &str, outcome: &TrainingOutcome) -> Result<Vec<u8>> {
    let mut df = build_export_frame(observations, target, outcome)?;
    DataSaver::to_csv_bytes(&mut df)
}

/// Write the export to a file
pub fn save_export(
    observations: &ObservationTable,
    target: &str,
    outcome: &TrainingOutcome,
    path: impl AsRef<Path>,
) -> Result<()> {
    let mut df = build_export_frame(observations, target, outcome)?;
    DataSaver::save_csv(&mut df, path.as_ref())?;
    info!(rows = df.height(), "Saved predictions to {}", path.as_ref().display());
    Ok(())
}

/// Prediction columns read back from an exported CSV
#[derive(Debug, Clone)]
pub struct ExportedPredictions {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl ExportedPredictions {
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// (row, timestamp, prediction) for every row holding a prediction
    pub fn predictions_for(&self, name: &str) -> Option<Vec<(usize, NaiveDateTime, f64)>> {
        let values = self.column(name)?;
        Some(
            values
                .iter()
                .zip(self.timestamps.iter())
                .enumerate()
                .filter_map(|(row, (v, &ts))| v.map(|p| (row, ts, p)))
                .collect(),
        )
    }
}

/// Re-read an export, keeping the timestamp and every `_pred_` column
pub fn read_predictions(bytes: &[u8]) -> Result<ExportedPredictions> {
    let table = CsvLoader::new().load_bytes(bytes)?;
    let stamp_col = table
        .column(TIMESTAMP_COLUMN)
        .ok_or_else(|| ForecastError::MissingColumn(TIMESTAMP_COLUMN.to_string()))?;

    let timestamps = stamp_col
        .values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok())
                .ok_or_else(|| ForecastError::DataError(format!("unparseable timestamp {:?} at row {}", v, row)))
        })
        .collect::<Result<Vec<_>>>()?;

    let columns = table
        .columns()
        .iter()
        .filter(|c| c.name.contains("_pred_"))
        .map(|c| {
            let values = c.values.iter().map(|v| v.as_deref().and_then(parse_numeric)).collect();
            (c.name.clone(), values)
        })
        .collect();

    Ok(ExportedPredictions { timestamps, columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{prepare, RawColumn, RawTable};
    use crate::training::{
        HorizonModel, PredictionPoint, PredictionSeries, RegressionMetrics, SplitBoundary, XGBoostConfig,
        XGBoostRegressor,
    };

    fn observations() -> ObservationTable {
        let raw = RawTable::new(vec![
            RawColumn::from_strs("Year", &["2021", "2021", "2021"]),
            RawColumn::from_strs("Month", &["1", "1", "1"]),
            RawColumn::from_strs("Day", &["1", "1", "1"]),
            RawColumn::from_strs("Hour", &["0", "1", "1"]),
            RawColumn::from_strs("Minute", &["0", "0", "0"]),
            RawColumn::from_strs("GHI", &["0", "N/A", "20.5"]),
        ])
        .unwrap();
        prepare(raw).unwrap()
    }

    fn outcome_with(points: Vec<PredictionPoint>) -> TrainingOutcome {
        let horizon = Horizon::new("tplus3", 3, "Next 3 hours");
        let model = HorizonModel {
            horizon,
            metrics: RegressionMetrics { mae: 0.0, rmse: 0.0, r2: f64::NAN, n_samples: points.len() },
            predictions: PredictionSeries { points },
            model: XGBoostRegressor::new(XGBoostConfig::default()),
            importances: Vec::new(),
            train_rows: 1,
            valid_rows: 2,
            training_time_secs: 0.0,
        };
        TrainingOutcome {
            split: SplitBoundary { split_index: 1, train_rows: 1, valid_rows: 2 },
            horizons: vec![model],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_column_name() {
        let h = Horizon::new("tplus168", 168, "Next 7 days");
        assert_eq!(prediction_column_name("Clearsky GHI", &h), "Clearsky GHI_pred_tplus168");
    }

    #[test]
    fn test_frame_layout() {
        let obs = observations();
        let ts = obs.timestamps()[2];
        let outcome = outcome_with(vec![PredictionPoint { timestamp: ts, source_row: 2, actual: 20.5, predicted: 19.0 }]);

        let df = build_export_frame(&obs, "GHI", &outcome).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["timestamp", "Year", "Month", "Day", "Hour", "Minute", "GHI", "GHI_pred_tplus3"]);
        assert_eq!(df.column("Year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("GHI_pred_tplus3").unwrap().null_count(), 2);
    }

    #[test]
    fn test_duplicate_timestamps_keep_row_positions() {
        let obs = observations();
        let ts = obs.timestamps()[1];
        assert_eq!(ts, obs.timestamps()[2]);
        let outcome = outcome_with(vec![PredictionPoint { timestamp: ts, source_row: 2, actual: 20.5, predicted: 19.0 }]);

        let bytes = export_csv(&obs, "GHI", &outcome).unwrap();
        let back = read_predictions(&bytes).unwrap();
        let preds = back.predictions_for("GHI_pred_tplus3").unwrap();
        assert_eq!(preds, vec![(2, ts, 19.0)]);
        assert_eq!(back.timestamps().len(), 3);
    }

    #[test]
    fn test_read_requires_timestamp() {
        let result = read_predictions(b"a,b\n1,2\n");
        assert!(matches!(result, Err(ForecastError::MissingColumn(c)) if c == "timestamp"));
    }
}
