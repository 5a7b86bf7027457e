use crate::data::series::BarSeries;
use crate::error::{MetalabelError, Result};
use polars::prelude::*;
use std::path::Path;
use super::validator::DataValidator;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| MetalabelError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load, validate and convert a bar file.
    pub fn load_bars<P: AsRef<Path>>(path: P, min_rows: usize) -> Result<BarSeries> {
        let df = Self::load(&path)?;

        DataValidator::validate_minimum_rows(&df, min_rows)?;

        // Warn about nulls but don't fail
        let null_report = DataValidator::check_nulls(&df)?;
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        let bars = BarSeries::from_frame(&df)?;
        log::info!(
            "Loaded {} bars from {}",
            bars.len(),
            path.as_ref().display()
        );
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_bars_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,signal,volatility").unwrap();
        writeln!(file, "1700000000000,100,101,99,100.5,1,1.0").unwrap();
        writeln!(file, "1700000060000,100.5,102,100,101.5,0,1.0").unwrap();
        writeln!(file, "1700000120000,101.5,103,101,102.5,-1,1.1").unwrap();
        file.flush().unwrap();

        let bars = CsvConnector::load_bars(file.path(), 3).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars.signals, vec![1.0, 0.0, -1.0]);
        assert_eq!(bars.volatility.as_ref().map(|v| v[2]), Some(1.1));
    }

    #[test]
    fn test_load_bars_rejects_short_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "open,high,low,close,signal").unwrap();
        writeln!(file, "100,101,99,100.5,1").unwrap();
        file.flush().unwrap();

        assert!(CsvConnector::load_bars(file.path(), 10).is_err());
    }
}
