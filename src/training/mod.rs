//! Model training module
//!
//! Provides:
//! - XGBoost-style gradient-boosted regression trees
//! - Regression metrics (MAE, RMSE, R²)
//! - The per-horizon trainer with a shared chronological split

pub mod metrics;
pub mod trainer;
pub mod xgboost;

pub use metrics::RegressionMetrics;
pub use trainer::{
    FeatureImportance, HorizonFit, HorizonModel, PredictionPoint, PredictionSeries, SkippedHorizon, SplitBoundary,
    SplitConfig, Trainer, TrainingOutcome,
};
pub use xgboost::{ImportanceType, XGBoostConfig, XGBoostRegressor};
