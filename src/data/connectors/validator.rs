use super::types::BarColumn;
use crate::error::{MetalabelError, Result};
use polars::prelude::*;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Resolves bar columns and checks required ones are numeric and OHLC
    /// relationships hold. Optional columns are mapped when present.
    pub fn validate_bars(df: &DataFrame) -> Result<HashMap<BarColumn, String>> {
        let mut column_map = HashMap::new();

        for required in BarColumn::required() {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name.to_string());
                }
                None => {
                    return Err(MetalabelError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        for optional in BarColumn::optional() {
            if let Some(col_name) = Self::find_column(df, &optional) {
                column_map.insert(optional, col_name.to_string());
            }
        }

        // Validate column types are numeric
        for (bar_col, actual_name) in &column_map {
            if *bar_col == BarColumn::Timestamp {
                continue;
            }
            let series = df.column(actual_name)?;
            if !matches!(series.dtype(), DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32) {
                return Err(MetalabelError::DataLoading(format!(
                    "Column '{}' ({}) must be numeric, found {:?}",
                    actual_name,
                    bar_col.as_str(),
                    series.dtype()
                )));
            }
        }

        Self::validate_ohlc_relationships(df, &column_map)?;

        Ok(column_map)
    }

    /// Find column by checking aliases
    fn find_column<'a>(df: &'a DataFrame, column: &BarColumn) -> Option<&'a str> {
        let columns = df.get_column_names();
        for alias in column.aliases() {
            if columns.iter().any(|col| col.as_str() == alias) {
                return Some(alias);
            }
        }
        None
    }

    fn column_f64(
        df: &DataFrame,
        column_map: &HashMap<BarColumn, String>,
        column: BarColumn,
    ) -> Result<Column> {
        let name = column_map.get(&column).ok_or_else(|| {
            MetalabelError::DataLoading(format!("Column {} not resolved", column.as_str()))
        })?;
        Ok(df.column(name)?.cast(&DataType::Float64)?)
    }

    /// Validate OHLC relationships (high >= low, high >= open, high >= close, etc.)
    fn validate_ohlc_relationships(
        df: &DataFrame,
        column_map: &HashMap<BarColumn, String>,
    ) -> Result<()> {
        let open = Self::column_f64(df, column_map, BarColumn::Open)?;
        let high = Self::column_f64(df, column_map, BarColumn::High)?;
        let low = Self::column_f64(df, column_map, BarColumn::Low)?;
        let close = Self::column_f64(df, column_map, BarColumn::Close)?;

        let open = open.f64()?;
        let high = high.f64()?;
        let low = low.f64()?;
        let close = close.f64()?;

        for i in 0..df.height() {
            if let (Some(h), Some(l), Some(o), Some(c)) =
                (high.get(i), low.get(i), open.get(i), close.get(i))
            {
                if h < l {
                    return Err(MetalabelError::DataLoading(format!(
                        "Invalid data at row {}: high ({}) < low ({})",
                        i, h, l
                    )));
                }
                if h < o || h < c {
                    return Err(MetalabelError::DataLoading(format!(
                        "Invalid data at row {}: high ({}) < open ({}) or close ({})",
                        i, h, o, c
                    )));
                }
                if l > o || l > c {
                    return Err(MetalabelError::DataLoading(format!(
                        "Invalid data at row {}: low ({}) > open ({}) or close ({})",
                        i, l, o, c
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(MetalabelError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Null counts per column, only for columns that have any.
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for column in df.get_columns() {
            let null_count = column.null_count();
            if null_count > 0 {
                null_report.push((column.name().to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_good_data() {
        let df = df! {
            "open" => &[100.0, 101.0, 102.0],
            "high" => &[101.0, 103.0, 104.0],
            "low" => &[99.0, 100.0, 101.0],
            "close" => &[100.5, 102.0, 103.0],
            "signal" => &[1.0, 0.0, -1.0],
        }
        .unwrap();

        let map = DataValidator::validate_bars(&df).unwrap();
        assert_eq!(map.len(), 5);
        assert!(!map.contains_key(&BarColumn::Volume));
    }

    #[test]
    fn test_validate_missing_signal() {
        let df = df! {
            "open" => &[100.0, 101.0],
            "high" => &[101.0, 103.0],
            "low" => &[99.0, 100.0],
            "close" => &[100.5, 102.0],
        }
        .unwrap();

        assert!(DataValidator::validate_bars(&df).is_err());
    }

    #[test]
    fn test_validate_invalid_ohlc() {
        let df = df! {
            "open" => &[100.0, 101.0],
            "high" => &[99.0, 103.0], // High < Open at row 0
            "low" => &[99.0, 100.0],
            "close" => &[100.5, 102.0],
            "signal" => &[1, 0],
        }
        .unwrap();

        assert!(DataValidator::validate_bars(&df).is_err());
    }

    #[test]
    fn test_column_aliases() {
        let df = df! {
            "Open" => &[100.0, 101.0],
            "HIGH" => &[101.0, 103.0],
            "low" => &[99.0, 100.0],
            "Close" => &[100.5, 102.0],
            "side" => &[1i64, -1],
            "Vol" => &[1000.0, 1500.0],
            "vpin" => &[0.1, 0.2],
        }
        .unwrap();

        let map = DataValidator::validate_bars(&df).unwrap();
        assert_eq!(map[&BarColumn::Signal], "side");
        assert_eq!(map[&BarColumn::Volume], "Vol");
        assert_eq!(map[&BarColumn::Toxicity], "vpin");
    }

    #[test]
    fn test_minimum_rows() {
        let df = df! { "close" => &[1.0, 2.0] }.unwrap();
        assert!(DataValidator::validate_minimum_rows(&df, 3).is_err());
        assert!(DataValidator::validate_minimum_rows(&df, 2).is_ok());
    }
}
