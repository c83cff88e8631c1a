//! Forecast feature engineering
//!
//! Derives, from the indexed observation table:
//! - one forward-shifted target column per forecast horizon
//! - target lags and exogenous-variable lags
//! - trailing rolling mean / standard deviation of the target
//! - hour-of-day, day-of-week and month calendar features
//!
//! and then selects the modeling rows: every feature present and at least one
//! horizon target available.

use super::series::{lag, lead, rolling, RollingStat};
use crate::error::{ForecastError, Result};
use crate::preprocessing::ObservationTable;
use chrono::{Datelike, NaiveDateTime, Timelike};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Target columns in priority order
pub const TARGET_CANDIDATES: [&str; 2] = ["GHI", "Clearsky GHI"];

/// Weather / irradiance columns that receive lag features when present
pub const EXOGENOUS_CANDIDATES: [&str; 12] = [
    "Temperature",
    "Relative Humidity",
    "Pressure",
    "Wind Speed",
    "Dew Point",
    "Solar Zenith",
    "Surface Albedo",
    "DHI",
    "DNI",
    "Clearsky DHI",
    "Clearsky DNI",
    "Clearsky GHI",
];

/// A forecast horizon, measured in rows ahead of the current row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// Short key used in column names, e.g. `tplus3`
    pub name: String,
    pub steps: usize,
    /// Human-readable title, e.g. "Next 3 hours"
    pub title: String,
}

impl Horizon {
    pub fn new(name: impl Into<String>, steps: usize, title: impl Into<String>) -> Self {
        Self { name: name.into(), steps, title: title.into() }
    }

    /// The three dashboard horizons: +3, +24 and +168 rows
    pub fn standard() -> Vec<Horizon> {
        vec![
            Horizon::new("tplus3", 3, "Next 3 hours"),
            Horizon::new("tplus24", 24, "Next 24 hours"),
            Horizon::new("tplus168", 168, "Next 7 days"),
        ]
    }

    /// Name of the shifted target column for this horizon
    pub fn target_column(&self, target: &str) -> String {
        format!("{}_{}", target, self.name)
    }
}

/// Configuration for feature engineering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub horizons: Vec<Horizon>,
    /// Lag offsets applied to the target
    pub target_lags: Vec<usize>,
    /// Lag offsets applied to each exogenous column
    pub exog_lags: Vec<usize>,
    /// Rolling window sizes for target mean/std
    pub rolling_windows: Vec<usize>,
    /// Columns eligible for exogenous lags
    pub exog_candidates: Vec<String>,
    /// Minimum number of modeling rows
    pub min_rows: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            horizons: Horizon::standard(),
            target_lags: vec![1, 2, 3, 6, 12, 24, 48],
            exog_lags: vec![1, 6, 12],
            rolling_windows: vec![3, 6, 24],
            exog_candidates: EXOGENOUS_CANDIDATES.iter().map(|c| c.to_string()).collect(),
            min_rows: 50,
        }
    }
}

/// What a column of the engineered table represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    /// An input column other than the target (calendar or measurement)
    Observed,
    /// The raw target
    Target,
    /// Target shifted forward by a horizon
    HorizonTarget,
    TargetLag,
    ExogenousLag,
    Rolling,
    Calendar,
}

impl ColumnRole {
    pub fn is_feature(self) -> bool {
        !matches!(self, ColumnRole::Target | ColumnRole::HorizonTarget)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredColumn {
    pub name: String,
    pub role: ColumnRole,
    pub values: Vec<Option<f64>>,
}

/// Observation table with every derived column, before row filtering
#[derive(Debug, Clone)]
pub struct EngineeredTable {
    timestamps: Vec<NaiveDateTime>,
    target: String,
    horizons: Vec<Horizon>,
    columns: Vec<EngineeredColumn>,
}

impl EngineeredTable {
    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn columns(&self) -> &[EngineeredColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&EngineeredColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every column except the raw target and the horizon targets, in table order
    pub fn feature_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.role.is_feature())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Assign a column, replacing any existing column of the same name in place
    fn assign(&mut self, name: String, role: ColumnRole, values: Vec<Option<f64>>) {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                existing.role = role;
                existing.values = values;
            }
            None => self.columns.push(EngineeredColumn { name, role, values }),
        }
    }
}

/// Rows ready for training: complete features, at least one horizon target
#[derive(Debug, Clone)]
pub struct ModelingTable {
    target: String,
    horizons: Vec<Horizon>,
    feature_names: Vec<String>,
    /// rows x features, no missing values
    features: Array2<f64>,
    /// One column per horizon, aligned with `features` rows
    horizon_targets: Vec<Vec<Option<f64>>>,
    timestamps: Vec<NaiveDateTime>,
    /// Row position of each modeling row in the observation table
    source_rows: Vec<usize>,
    original_rows: usize,
}

impl ModelingTable {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Horizon target column by horizon position
    pub fn horizon_target(&self, horizon: usize) -> &[Option<f64>] {
        &self.horizon_targets[horizon]
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Row count of the observation table the features were built from
    pub fn original_rows(&self) -> usize {
        self.original_rows
    }
}

/// Builds horizon targets and predictors from an observation table
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Pick the target column: "GHI" if present, else "Clearsky GHI"
    pub fn select_target(&self, table: &ObservationTable) -> Result<String> {
        let target = TARGET_CANDIDATES
            .iter()
            .find(|name| table.has_column(name))
            .ok_or(ForecastError::TargetNotFound)?;

        let column = table
            .column(target)
            .ok_or(ForecastError::TargetNotFound)?;
        if column.values.iter().all(Option::is_none) {
            return Err(ForecastError::EmptyTarget(target.to_string()));
        }
        Ok(target.to_string())
    }

    /// Derive every engineered column without dropping any rows
    pub fn engineer(&self, table: &ObservationTable) -> Result<EngineeredTable> {
        let target = self.select_target(table)?;
        info!(target = %target, "Selected target column");

        let mut out = EngineeredTable {
            timestamps: table.timestamps().to_vec(),
            target: target.clone(),
            horizons: self.config.horizons.clone(),
            columns: table
                .columns()
                .iter()
                .map(|c| EngineeredColumn {
                    name: c.name.clone(),
                    role: if c.name == target { ColumnRole::Target } else { ColumnRole::Observed },
                    values: c.values.clone(),
                })
                .collect(),
        };

        let y = table
            .column(&target)
            .map(|c| c.values.clone())
            .ok_or(ForecastError::TargetNotFound)?;

        for horizon in &self.config.horizons {
            out.assign(horizon.target_column(&target), ColumnRole::HorizonTarget, lead(&y, horizon.steps));
        }

        for &l in &self.config.target_lags {
            out.assign(format!("{}_lag{}", target, l), ColumnRole::TargetLag, lag(&y, l));
        }

        let exog: Vec<&str> = self
            .config
            .exog_candidates
            .iter()
            .map(String::as_str)
            .filter(|c| *c != target && table.has_column(c))
            .collect();
        for name in exog {
            if let Some(column) = table.column(name) {
                for &l in &self.config.exog_lags {
                    out.assign(format!("{}_lag{}", name, l), ColumnRole::ExogenousLag, lag(&column.values, l));
                }
            }
        }

        for &w in &self.config.rolling_windows {
            out.assign(format!("{}_roll{}_mean", target, w), ColumnRole::Rolling, rolling(&y, w, RollingStat::Mean));
            out.assign(format!("{}_roll{}_std", target, w), ColumnRole::Rolling, rolling(&y, w, RollingStat::Std));
        }

        let ts = table.timestamps();
        out.assign("hour".to_string(), ColumnRole::Calendar, ts.iter().map(|t| Some(t.hour() as f64)).collect());
        out.assign(
            "dayofweek".to_string(),
            ColumnRole::Calendar,
            ts.iter().map(|t| Some(t.weekday().num_days_from_monday() as f64)).collect(),
        );
        out.assign("month".to_string(), ColumnRole::Calendar, ts.iter().map(|t| Some(t.month() as f64)).collect());

        Ok(out)
    }

    /// Engineer features and select the modeling rows
    pub fn build(&self, table: &ObservationTable) -> Result<ModelingTable> {
        let engineered = self.engineer(table)?;
        self.select_rows(engineered)
    }

    /// Keep rows with every feature present and at least one horizon target
    pub fn select_rows(&self, table: EngineeredTable) -> Result<ModelingTable> {
        let feature_cols: Vec<&EngineeredColumn> = table.columns.iter().filter(|c| c.role.is_feature()).collect();
        if feature_cols.is_empty() {
            return Err(ForecastError::NoFeatures);
        }

        let horizon_cols: Vec<&EngineeredColumn> = table
            .horizons
            .iter()
            .filter_map(|h| table.column(&h.target_column(&table.target)))
            .collect();

        let original_rows = table.n_rows();
        let keep: Vec<usize> = (0..original_rows)
            .filter(|&row| feature_cols.iter().all(|c| c.values[row].is_some()))
            .filter(|&row| horizon_cols.iter().any(|c| c.values[row].is_some()))
            .collect();

        if keep.len() < self.config.min_rows {
            return Err(ForecastError::InsufficientData {
                rows: keep.len(),
                original: original_rows,
                required: self.config.min_rows,
            });
        }

        info!(
            original = original_rows,
            rows = keep.len(),
            features = feature_cols.len(),
            "Feature engineering: {} → {} rows ({} features)",
            original_rows,
            keep.len(),
            feature_cols.len()
        );

        let features = Array2::from_shape_fn((keep.len(), feature_cols.len()), |(r, c)| {
            feature_cols[c].values[keep[r]].unwrap_or(f64::NAN)
        });
        let horizon_targets = horizon_cols
            .iter()
            .map(|c| keep.iter().map(|&row| c.values[row]).collect())
            .collect();

        Ok(ModelingTable {
            target: table.target.clone(),
            horizons: table.horizons.clone(),
            feature_names: feature_cols.iter().map(|c| c.name.clone()).collect(),
            features,
            horizon_targets,
            timestamps: keep.iter().map(|&row| table.timestamps[row]).collect(),
            source_rows: keep,
            original_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{prepare, RawColumn, RawTable};
    use chrono::{Duration, NaiveDate};

    /// Hourly table starting 2024-01-01 00:00 (a Monday)
    fn hourly(n: usize, extra: Vec<(&str, Vec<String>)>) -> ObservationTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let ts: Vec<NaiveDateTime> = (0..n).map(|i| start + Duration::hours(i as i64)).collect();
        let field = |f: fn(&NaiveDateTime) -> u32| -> Vec<Option<String>> {
            ts.iter().map(|t| Some(f(t).to_string())).collect()
        };
        let mut columns = vec![
            RawColumn::new("Year", ts.iter().map(|t| Some(t.year().to_string())).collect()),
            RawColumn::new("Month", field(|t| t.month())),
            RawColumn::new("Day", field(|t| t.day())),
            RawColumn::new("Hour", field(|t| t.hour())),
            RawColumn::new("Minute", field(|t| t.minute())),
        ];
        for (name, values) in extra {
            columns.push(RawColumn::new(name, values.into_iter().map(Some).collect()));
        }
        prepare(RawTable::new(columns).unwrap()).unwrap()
    }

    fn ramp(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_target_priority() {
        let n = 10;
        let table = hourly(n, vec![("Clearsky GHI", ramp(n)), ("GHI", ramp(n))]);
        assert_eq!(FeatureBuilder::default().select_target(&table).unwrap(), "GHI");

        let table = hourly(n, vec![("Clearsky GHI", ramp(n))]);
        assert_eq!(FeatureBuilder::default().select_target(&table).unwrap(), "Clearsky GHI");
    }

    #[test]
    fn test_no_target_candidate_fails() {
        let table = hourly(10, vec![("DNI", ramp(10))]);
        let err = FeatureBuilder::default().build(&table).unwrap_err();
        assert!(matches!(err, ForecastError::TargetNotFound));
    }

    #[test]
    fn test_all_missing_target_fails() {
        let table = hourly(10, vec![("GHI", vec!["NA".to_string(); 10]), ("Clearsky GHI", ramp(10))]);
        let err = FeatureBuilder::default().build(&table).unwrap_err();
        assert!(matches!(err, ForecastError::EmptyTarget(ref t) if t == "GHI"));
    }

    #[test]
    fn test_horizon_targets_lead_the_target() {
        let n = 400;
        let table = hourly(n, vec![("GHI", ramp(n))]);
        let engineered = FeatureBuilder::default().engineer(&table).unwrap();

        for h in [3usize, 24, 168] {
            let col = engineered.column(&format!("GHI_tplus{}", h)).unwrap();
            assert_eq!(col.role, ColumnRole::HorizonTarget);
            for i in 0..n {
                let expected = if i + h < n { Some((i + h) as f64) } else { None };
                assert_eq!(col.values[i], expected, "horizon {} row {}", h, i);
            }
        }
    }

    #[test]
    fn test_feature_columns_exclude_targets() {
        let n = 60;
        let table = hourly(n, vec![("GHI", ramp(n)), ("Temperature", ramp(n)), ("Clearsky GHI", ramp(n))]);
        let engineered = FeatureBuilder::default().engineer(&table).unwrap();
        let features = engineered.feature_names();

        assert!(!features.contains(&"GHI"));
        assert!(!features.iter().any(|f| f.contains("tplus")));
        for expected in [
            "Year", "Minute", "Temperature", "Clearsky GHI",
            "GHI_lag1", "GHI_lag48", "Temperature_lag12", "Clearsky GHI_lag6",
            "GHI_roll24_mean", "GHI_roll3_std", "hour", "dayofweek", "month",
        ] {
            assert!(features.contains(&expected), "missing feature {}", expected);
        }
        // 5 calendar + 2 exogenous + 7 target lags + 6 exogenous lags + 6 rolling + 3 calendar features
        assert_eq!(features.len(), 29);
    }

    #[test]
    fn test_calendar_features_monday_zero() {
        let table = hourly(30, vec![("GHI", ramp(30))]);
        let engineered = FeatureBuilder::default().engineer(&table).unwrap();
        let dow = &engineered.column("dayofweek").unwrap().values;
        let hour = &engineered.column("hour").unwrap().values;
        assert_eq!(dow[0], Some(0.0));
        assert_eq!(dow[24], Some(1.0));
        assert_eq!(hour[25], Some(1.0));
        assert_eq!(engineered.column("month").unwrap().values[0], Some(1.0));
    }

    #[test]
    fn test_modeling_table_has_no_missing_features() {
        let n = 300;
        let mut ghi = ramp(n);
        ghi[100] = "N/A".to_string();
        let table = hourly(n, vec![("GHI", ghi)]);
        let modeling = FeatureBuilder::default().build(&table).unwrap();

        assert!(modeling.features().iter().all(|v| v.is_finite()));
        // rows whose lags or windows touch row 100 are gone
        assert!(!modeling.source_rows().contains(&100));
        assert!(!modeling.source_rows().contains(&148));
        assert!(modeling.source_rows().contains(&149));
        // last rows lose every horizon target
        assert!(!modeling.source_rows().contains(&(n - 1)));
        assert!(modeling.source_rows().contains(&(n - 4)));
        for h in 0..3 {
            assert_eq!(modeling.horizon_target(h).len(), modeling.n_rows());
        }
    }

    #[test]
    fn test_insufficient_rows_reports_counts() {
        let table = hourly(40, vec![("GHI", ramp(40))]);
        let err = FeatureBuilder::default().build(&table).unwrap_err();
        match err {
            ForecastError::InsufficientData { rows, original, required } => {
                assert_eq!(rows, 0);
                assert_eq!(original, 40);
                assert_eq!(required, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_existing_column_is_overwritten_in_place() {
        let n = 10;
        let table = hourly(n, vec![("hour", vec!["99".to_string(); n]), ("GHI", ramp(n))]);
        let engineered = FeatureBuilder::default().engineer(&table).unwrap();
        let hours: Vec<&EngineeredColumn> = engineered.columns().iter().filter(|c| c.name == "hour").collect();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].values[3], Some(3.0));
        assert_eq!(engineered.columns()[5].name, "hour");
    }
}
