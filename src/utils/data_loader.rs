//! CSV loading and saving

use crate::error::{ForecastError, Result};
use crate::preprocessing::{RawColumn, RawTable};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Reads uploaded CSV files into a [`RawTable`].
///
/// Every column is read as text; numeric coercion happens later in
/// preprocessing so that tokens such as `N/A` survive loading.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Set the field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a CSV file from disk
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<RawTable> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| ForecastError::DataError(format!("{}: {}", path.as_ref().display(), e)))?;
        let df = self.read_frame(bytes)?;
        frame_to_raw_table(&df)
    }

    /// Load CSV content held in memory (an uploaded file)
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<RawTable> {
        let df = self.read_frame(bytes.to_vec())?;
        frame_to_raw_table(&df)
    }

    fn read_frame(&self, bytes: Vec<u8>) -> Result<DataFrame> {
        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| ForecastError::DataError(e.to_string()))?;

        debug!(rows = df.height(), cols = df.width(), "Parsed CSV");
        Ok(df)
    }
}

/// Convert a frame to text columns, keeping nulls as missing cells
pub fn frame_to_raw_table(df: &DataFrame) -> Result<RawTable> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        columns.push(RawColumn::new(column.name().as_str(), values));
    }
    RawTable::new(columns)
}

/// Writes frames back out as CSV
pub struct DataSaver;

impl DataSaver {
    /// Render a frame as CSV bytes with a header row
    pub fn to_csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(df)
            .map_err(|e| ForecastError::DataError(e.to_string()))?;
        Ok(buf)
    }

    /// Save to a CSV file
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| ForecastError::DataError(e.to_string()))
    }
}
