//! Utility functions and types

pub mod data_loader;

pub use data_loader::{frame_to_raw_table, CsvLoader, DataSaver};
