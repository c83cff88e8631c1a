//! Numeric coercion of measurement columns

use super::{is_calendar_column, CleanColumn, CleanTable, ColumnValues, RawTable};
use tracing::debug;

/// Cell contents treated as missing in every column
pub const MISSING_TOKENS: [&str; 3] = ["N/A", "NA", ""];

/// Replaces missing-value tokens and coerces measurement columns to numbers.
///
/// Calendar columns keep their text; unparseable measurement cells become
/// missing instead of failing.
#[derive(Debug, Clone, Default)]
pub struct NumericCleaner;

impl NumericCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, table: RawTable) -> CleanTable {
        let n_rows = table.n_rows();
        let columns = table
            .into_columns()
            .into_iter()
            .map(|column| {
                let values: Vec<Option<String>> = column
                    .values
                    .into_iter()
                    .map(|v| v.filter(|s| !is_missing_token(s)))
                    .collect();

                let values = if is_calendar_column(&column.name) {
                    ColumnValues::Text(values)
                } else {
                    let parsed: Vec<Option<f64>> = values
                        .iter()
                        .map(|v| v.as_deref().and_then(parse_numeric))
                        .collect();
                    let coerced = values.iter().zip(&parsed).filter(|(v, p)| v.is_some() && p.is_none()).count();
                    if coerced > 0 {
                        debug!(column = %column.name, cells = coerced, "Non-numeric cells set to missing");
                    }
                    ColumnValues::Numeric(parsed)
                };

                CleanColumn { name: column.name, values }
            })
            .collect();

        CleanTable::from_parts(columns, n_rows)
    }
}

fn is_missing_token(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Parse a cell as a number; NaN counts as missing
pub(crate) fn parse_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::RawColumn;

    #[test]
    fn test_missing_tokens_and_garbage_become_missing() {
        let raw = RawTable::new(vec![RawColumn::new(
            "GHI",
            vec![
                Some("12.5".to_string()),
                Some("N/A".to_string()),
                Some("NA".to_string()),
                Some(String::new()),
                Some("cloudy".to_string()),
                None,
                Some(" 7 ".to_string()),
                Some("nan".to_string()),
            ],
        )])
        .unwrap();

        let clean = NumericCleaner::new().clean(raw);
        assert_eq!(
            clean.column("GHI").unwrap().values,
            ColumnValues::Numeric(vec![Some(12.5), None, None, None, None, None, Some(7.0), None])
        );
    }

    #[test]
    fn test_calendar_columns_stay_text() {
        let raw = RawTable::new(vec![
            RawColumn::from_strs("Year", &["2020", "NA"]),
            RawColumn::from_strs("Hour", &["1.0", "2"]),
        ])
        .unwrap();

        let clean = NumericCleaner::new().clean(raw);
        assert_eq!(
            clean.column("Year").unwrap().values,
            ColumnValues::Text(vec![Some("2020".to_string()), None])
        );
        assert_eq!(
            clean.column("Hour").unwrap().values,
            ColumnValues::Text(vec![Some("1.0".to_string()), Some("2".to_string())])
        );
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("-0.5"), Some(-0.5));
        assert_eq!(parse_numeric("abc"), None);
    }
}
