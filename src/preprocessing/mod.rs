//! Input preprocessing
//!
//! Turns an uploaded CSV into a chronologically indexed observation table:
//! - Header normalization (truncated export headers to canonical names)
//! - Numeric cleaning (N/A tokens and unparseable cells become missing)
//! - Time indexing (Year/Month/Day/Hour/Minute to a sorted timestamp key)
//!
//! Every stage consumes its input table and returns a new one.

mod cleaner;
mod headers;
mod time_index;

pub use cleaner::{NumericCleaner, MISSING_TOKENS};
pub(crate) use cleaner::parse_numeric;
pub use headers::HeaderNormalizer;
pub use time_index::TimeIndexer;

use crate::error::{ForecastError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Calendar columns, in the order they are validated.
pub const CALENDAR_COLUMNS: [&str; 5] = ["Year", "Month", "Day", "Hour", "Minute"];

/// Whether a column name is one of the five calendar fields
pub fn is_calendar_column(name: &str) -> bool {
    CALENDAR_COLUMNS.contains(&name)
}

/// A text column exactly as read from the CSV
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self { name: name.into(), values }
    }

    /// Build a column from string literals; empty strings stay empty strings
    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, values.iter().map(|v| Some(v.to_string())).collect())
    }
}

/// Raw record table: ordered text columns of equal length
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    n_rows: usize,
}

impl RawTable {
    /// Create a table, checking that all columns have the same length
    pub fn new(columns: Vec<RawColumn>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != n_rows) {
            return Err(ForecastError::ShapeError {
                expected: format!("{} rows", n_rows),
                actual: format!("{} rows in column '{}'", bad.values.len(), bad.name),
            });
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn into_columns(self) -> Vec<RawColumn> {
        self.columns
    }
}

/// Cell storage after numeric cleaning
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Calendar fields, left as text for the time indexer to coerce
    Text(Vec<Option<String>>),
    /// Measurement fields coerced to numbers
    Numeric(Vec<Option<f64>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanColumn {
    pub name: String,
    pub values: ColumnValues,
}

/// Table produced by the numeric cleaner
#[derive(Debug, Clone, Default)]
pub struct CleanTable {
    columns: Vec<CleanColumn>,
    n_rows: usize,
}

impl CleanTable {
    pub(crate) fn from_parts(columns: Vec<CleanColumn>, n_rows: usize) -> Self {
        Self { columns, n_rows }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn columns(&self) -> &[CleanColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&CleanColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn into_columns(self) -> Vec<CleanColumn> {
        self.columns
    }
}

/// Role of a column in the indexed table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// One of Year, Month, Day, Hour, Minute (always present, integral)
    Calendar,
    /// Any measurement, possibly missing
    Measurement,
}

/// A numeric column keyed by the timestamp index
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Option<f64>>,
}

/// Indexed observation table: rows sorted by a non-decreasing timestamp key
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<SeriesColumn>,
}

impl ObservationTable {
    pub(crate) fn from_parts(timestamps: Vec<NaiveDateTime>, columns: Vec<SeriesColumn>) -> Self {
        Self { timestamps, columns }
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[SeriesColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&SeriesColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Run the three preprocessing stages in order
pub fn prepare(raw: RawTable) -> Result<ObservationTable> {
    let normalized = HeaderNormalizer::default().normalize(raw);
    let cleaned = NumericCleaner::new().clean(normalized);
    TimeIndexer::new().index(cleaned)
}
