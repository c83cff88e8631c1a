//! Pipeline configuration

use crate::error::{ForecastError, Result};
pub use crate::timeseries::FeatureConfig;
pub use crate::training::{ImportanceType, SplitConfig, XGBoostConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a full forecasting run.
///
/// `Default` reproduces the dashboard settings. A JSON file may override any
/// subset of fields; missing fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub booster: XGBoostConfig,
    pub importance_type: ImportanceType,
    /// Features shown per importance chart
    pub top_importances: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            booster: XGBoostConfig::default(),
            importance_type: ImportanceType::default(),
            top_importances: 15,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_booster(mut self, booster: XGBoostConfig) -> Self {
        self.booster = booster;
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_top_importances(mut self, n: usize) -> Self {
        self.top_importances = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.horizons.is_empty() {
            return Err(ForecastError::ConfigError("at least one horizon is required".to_string()));
        }
        if self.features.horizons.iter().any(|h| h.steps == 0) {
            return Err(ForecastError::ConfigError("horizon steps must be positive".to_string()));
        }
        self.split.validate()?;
        self.booster.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.top_importances, 15);
        assert_eq!(config.features.min_rows, 50);
        assert_eq!(config.features.horizons.len(), 3);
        assert_eq!(config.booster.n_estimators, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let config = PipelineConfig::from_json_str(r#"{"booster": {"n_estimators": 40}, "top_importances": 5}"#).unwrap();
        assert_eq!(config.booster.n_estimators, 40);
        assert_eq!(config.booster.learning_rate, 0.05);
        assert_eq!(config.top_importances, 5);
        assert_eq!(config.features.target_lags, vec![1, 2, 3, 6, 12, 24, 48]);
    }

    #[test]
    fn test_json_roundtrip_and_file_loading() {
        let config = PipelineConfig::default();
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), config.to_json().unwrap()).unwrap();
        let loaded = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.booster, config.booster);
        assert_eq!(loaded.features.horizons, config.features.horizons);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"booster": {"subsample": 2.0}}"#).unwrap_err();
        assert!(matches!(err, ForecastError::ConfigError(_)));
        let err = PipelineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ForecastError::SerializationError(_)));
    }
}
