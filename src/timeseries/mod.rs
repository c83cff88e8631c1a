//! Time series feature engineering
//!
//! Provides row-offset operations and the forecast feature builder:
//! - Horizon targets (forward shifts)
//! - Lag features
//! - Rolling statistics
//! - Calendar features

mod features;
pub mod series;

pub use features::{
    ColumnRole, EngineeredColumn, EngineeredTable, FeatureBuilder, FeatureConfig, Horizon, ModelingTable,
    EXOGENOUS_CANDIDATES, TARGET_CANDIDATES,
};
pub use series::RollingStat;
