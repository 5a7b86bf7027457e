use crate::data::connectors::{BarColumn, DataValidator};
use crate::error::{MetalabelError, Result};
use crate::types::PricePoint;
use chrono::{DateTime, Duration, Utc};
use polars::prelude::*;
use std::collections::HashMap;

/// Bars plus the per-bar inputs the pipeline consumes, all aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub prices: Vec<PricePoint>,
    pub signals: Vec<f64>,
    pub volatility: Option<Vec<f64>>,
    pub volume: Option<Vec<f64>>,
    pub regime_weight: Option<Vec<f64>>,
    pub toxicity: Option<Vec<f64>>,
}

impl BarSeries {
    /// Converts a validated frame. Null prices are rejected; null signals
    /// mean "no signal".
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let column_map = DataValidator::validate_bars(df)?;

        let open = required_values(df, &column_map, BarColumn::Open)?;
        let high = required_values(df, &column_map, BarColumn::High)?;
        let low = required_values(df, &column_map, BarColumn::Low)?;
        let close = required_values(df, &column_map, BarColumn::Close)?;

        let signals: Vec<f64> = optional_values(df, &column_map, BarColumn::Signal)?
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.unwrap_or(0.0))
            .collect();

        let timestamps = timestamps(df, &column_map)?;

        let prices = (0..df.height())
            .map(|i| PricePoint::new(i, open[i], high[i], low[i], close[i], timestamps[i]))
            .collect();

        let fill = |column| -> Result<Option<Vec<f64>>> {
            Ok(optional_values(df, &column_map, column)?
                .map(|values| values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
        };

        Ok(Self {
            prices,
            signals,
            volatility: fill(BarColumn::Volatility)?,
            volume: fill(BarColumn::Volume)?,
            regime_weight: fill(BarColumn::RegimeWeight)?,
            toxicity: fill(BarColumn::Toxicity)?,
        })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Supplied volatility, or an average true range over `window` bars.
    pub fn volatility_or_atr(&self, window: usize) -> Vec<f64> {
        match &self.volatility {
            Some(vol) => vol.clone(),
            None => causal_atr(&self.prices, window),
        }
    }
}

/// Mean true range over the last `window` bars ending at each bar.
///
/// Bars before a full window get NaN so the labeler skips them.
pub fn causal_atr(prices: &[PricePoint], window: usize) -> Vec<f64> {
    let true_range: Vec<f64> = prices
        .iter()
        .enumerate()
        .map(|(i, bar)| match i.checked_sub(1).map(|p| prices[p].close) {
            Some(prev_close) => (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs()),
            None => bar.high - bar.low,
        })
        .collect();

    (0..prices.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                f64::NAN
            } else {
                true_range[i + 1 - window..=i].iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}

fn optional_values(
    df: &DataFrame,
    column_map: &HashMap<BarColumn, String>,
    column: BarColumn,
) -> Result<Option<Vec<Option<f64>>>> {
    let name = match column_map.get(&column) {
        Some(name) => name,
        None => return Ok(None),
    };
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(Some(cast.f64()?.into_iter().collect()))
}

fn required_values(
    df: &DataFrame,
    column_map: &HashMap<BarColumn, String>,
    column: BarColumn,
) -> Result<Vec<f64>> {
    let values = optional_values(df, column_map, column)?.ok_or_else(|| {
        MetalabelError::DataLoading(format!("Missing required column: {}", column.as_str()))
    })?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                MetalabelError::DataLoading(format!(
                    "Null {} at row {}",
                    column.as_str(),
                    row
                ))
            })
        })
        .collect()
}

/// Integer timestamps are epoch milliseconds; anything else is replaced by
/// one synthetic bar per minute from the epoch.
fn timestamps(df: &DataFrame, column_map: &HashMap<BarColumn, String>) -> Result<Vec<DateTime<Utc>>> {
    let synthetic = || {
        (0..df.height())
            .map(|i| DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(i as i64))
            .collect::<Vec<_>>()
    };

    let name = match column_map.get(&BarColumn::Timestamp) {
        Some(name) => name,
        None => return Ok(synthetic()),
    };

    let column = df.column(name)?;
    if !matches!(column.dtype(), DataType::Int64 | DataType::Int32 | DataType::UInt32) {
        log::warn!(
            "Timestamp column '{}' has type {:?}; using synthetic timestamps",
            name,
            column.dtype()
        );
        return Ok(synthetic());
    }

    let millis = column.cast(&DataType::Int64)?;
    millis
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, ms)| {
            ms.and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| {
                    MetalabelError::DataLoading(format!("Invalid timestamp at row {}", row))
                })
        })
        .collect()
}
