//! Timestamp index construction from discrete calendar columns

use super::cleaner::parse_numeric;
use super::{
    CleanColumn, CleanTable, ColumnKind, ColumnValues, ObservationTable,
    SeriesColumn, CALENDAR_COLUMNS,
};
use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

/// Builds the timestamp key and sorts rows chronologically
#[derive(Debug, Clone, Default)]
pub struct TimeIndexer;

impl TimeIndexer {
    pub fn new() -> Self {
        Self
    }

    /// Index a cleaned table.
    ///
    /// Fails if a calendar column is absent or holds a value that cannot be
    /// read as an integer. Rows whose fields do not form a real date/time
    /// are dropped; the rest are stably sorted by timestamp.
    pub fn index(&self, table: CleanTable) -> Result<ObservationTable> {
        for name in CALENDAR_COLUMNS {
            if table.column(name).is_none() {
                return Err(ForecastError::MissingColumn(name.to_string()));
            }
        }

        let n_rows = table.n_rows();
        let mut calendar: Vec<Vec<i64>> = Vec::with_capacity(CALENDAR_COLUMNS.len());
        for name in CALENDAR_COLUMNS {
            let column = table
                .column(name)
                .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))?;
            calendar.push(coerce_integers(column)?);
        }

        let mut order: Vec<(NaiveDateTime, usize)> = (0..n_rows)
            .filter_map(|row| {
                calendar_timestamp(
                    calendar[0][row],
                    calendar[1][row],
                    calendar[2][row],
                    calendar[3][row],
                    calendar[4][row],
                )
                .map(|ts| (ts, row))
            })
            .collect();
        // Vec::sort_by_key is stable: equal timestamps keep their input order.
        order.sort_by_key(|(ts, _)| *ts);

        let dropped = n_rows - order.len();
        info!(rows = order.len(), dropped, "Built timestamp index");

        let timestamps: Vec<NaiveDateTime> = order.iter().map(|(ts, _)| *ts).collect();
        let positions: Vec<usize> = order.iter().map(|(_, row)| *row).collect();

        let columns = table
            .into_columns()
            .into_iter()
            .map(|column| {
                let ints = CALENDAR_COLUMNS
                    .iter()
                    .position(|c| *c == column.name)
                    .map(|i| calendar[i].as_slice());
                reorder_column(column, ints, &positions)
            })
            .collect();

        Ok(ObservationTable::from_parts(timestamps, columns))
    }
}

/// Combine calendar fields into a timestamp; `None` when out of range
pub fn calendar_timestamp(year: i64, month: i64, day: i64, hour: i64, minute: i64) -> Option<NaiveDateTime> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    let hour = u32::try_from(hour).ok()?;
    let minute = u32::try_from(minute).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

fn coerce_integers(column: &CleanColumn) -> Result<Vec<i64>> {
    let invalid = |row: usize, value: Option<String>| ForecastError::InvalidCalendarValue {
        column: column.name.clone(),
        row,
        value,
    };

    match &column.values {
        ColumnValues::Text(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_deref()
                    .and_then(parse_integer)
                    .ok_or_else(|| invalid(row, v.clone()))
            })
            .collect(),
        ColumnValues::Numeric(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.filter(|x| x.is_finite())
                    .map(|x| x.trunc() as i64)
                    .ok_or_else(|| invalid(row, v.map(|x| x.to_string())))
            })
            .collect(),
    }
}

/// Integer parse that also accepts float text such as "2020.0" (truncated)
fn parse_integer(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(|x| x.trunc() as i64)
    })
}

/// Gather a column into index order; calendar columns use their coerced integers
fn reorder_column(column: CleanColumn, calendar: Option<&[i64]>, positions: &[usize]) -> SeriesColumn {
    let (kind, values): (ColumnKind, Vec<Option<f64>>) = match (calendar, &column.values) {
        (Some(ints), _) => (
            ColumnKind::Calendar,
            positions.iter().map(|&row| Some(ints[row] as f64)).collect(),
        ),
        (None, ColumnValues::Numeric(values)) => (
            ColumnKind::Measurement,
            positions.iter().map(|&row| values[row]).collect(),
        ),
        (None, ColumnValues::Text(values)) => (
            ColumnKind::Measurement,
            positions
                .iter()
                .map(|&row| values[row].as_deref().and_then(parse_numeric))
                .collect(),
        ),
    };

    SeriesColumn { name: column.name, kind, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{NumericCleaner, RawColumn, RawTable};

    fn clean(columns: Vec<RawColumn>) -> CleanTable {
        NumericCleaner::new().clean(RawTable::new(columns).unwrap())
    }

    fn calendar(rows: &[(&str, &str, &str, &str, &str)]) -> Vec<RawColumn> {
        vec![
            RawColumn::from_strs("Year", &rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            RawColumn::from_strs("Month", &rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            RawColumn::from_strs("Day", &rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            RawColumn::from_strs("Hour", &rows.iter().map(|r| r.3).collect::<Vec<_>>()),
            RawColumn::from_strs("Minute", &rows.iter().map(|r| r.4).collect::<Vec<_>>()),
        ]
    }

    #[test]
    fn test_missing_calendar_column_is_named() {
        let mut columns = calendar(&[("2021", "1", "1", "0", "0")]);
        columns.remove(3);
        let err = TimeIndexer::new().index(clean(columns)).unwrap_err();
        assert_eq!(err.to_string(), "Missing required time column: Hour");
    }

    #[test]
    fn test_all_calendar_columns_missing_names_first() {
        let table = clean(vec![RawColumn::from_strs("GHI", &["1"])]);
        let err = TimeIndexer::new().index(table).unwrap_err();
        assert!(matches!(err, ForecastError::MissingColumn(ref c) if c == "Year"));
    }

    #[test]
    fn test_missing_calendar_value_fails() {
        let columns = calendar(&[("2021", "1", "1", "0", "0"), ("2021", "1", "NA", "1", "0")]);
        let err = TimeIndexer::new().index(clean(columns)).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InvalidCalendarValue { ref column, row: 1, .. } if column == "Day"
        ));
    }

    #[test]
    fn test_invalid_dates_dropped_and_rows_sorted() {
        let mut columns = calendar(&[
            ("2021", "1", "2", "0", "0"),
            ("2021", "2", "30", "0", "0"),
            ("2021", "1", "1", "23", "0"),
            ("2021", "13", "1", "0", "0"),
            ("2021", "1", "1", "24", "0"),
            ("2021", "1", "1", "5", "60"),
        ]);
        columns.push(RawColumn::from_strs("GHI", &["1", "2", "3", "4", "5", "6"]));

        let table = TimeIndexer::new().index(clean(columns)).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert!(table.timestamps().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(table.column("GHI").unwrap().values, vec![Some(3.0), Some(1.0)]);
        assert_eq!(table.column("Hour").unwrap().values, vec![Some(23.0), Some(0.0)]);
        assert_eq!(table.column("Hour").unwrap().kind, ColumnKind::Calendar);
    }

    #[test]
    fn test_duplicate_timestamps_retained_in_input_order() {
        let mut columns = calendar(&[
            ("2021", "1", "1", "1", "0"),
            ("2021", "1", "1", "0", "0"),
            ("2021", "1", "1", "1", "0"),
        ]);
        columns.push(RawColumn::from_strs("GHI", &["10", "20", "30"]));

        let table = TimeIndexer::new().index(clean(columns)).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("GHI").unwrap().values, vec![Some(20.0), Some(10.0), Some(30.0)]);
    }

    #[test]
    fn test_float_formatted_calendar_values() {
        let columns = calendar(&[("2021.0", "3.0", "14", "9.0", "30")]);
        let table = TimeIndexer::new().index(clean(columns)).unwrap();
        assert_eq!(
            table.timestamps()[0],
            NaiveDate::from_ymd_opt(2021, 3, 14).unwrap().and_hms_opt(9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_calendar_timestamp_bounds() {
        assert!(calendar_timestamp(2020, 2, 29, 0, 0).is_some());
        assert!(calendar_timestamp(2021, 2, 29, 0, 0).is_none());
        assert!(calendar_timestamp(2021, 0, 1, 0, 0).is_none());
        assert!(calendar_timestamp(2021, 1, 1, -1, 0).is_none());
        assert!(calendar_timestamp(i64::MAX, 1, 1, 0, 0).is_none());
    }
}
