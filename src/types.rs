use crate::error::{MetalabelError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC bar. Produced by the market-data collaborator, never mutated here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub index: usize,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(
        index: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            open,
            high,
            low,
            close,
            timestamp,
        }
    }

    /// Bar whose open/high/low all equal the close.
    pub fn flat(index: usize, close: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(index, close, close, close, close, timestamp)
    }

    /// Fails loudly when `index` is not strictly increasing.
    ///
    /// Reordering here would hide a data bug and can leak future bars into
    /// labels or features, so callers get the first offending position.
    pub fn ensure_chronological(prices: &[PricePoint]) -> Result<()> {
        for (position, pair) in prices.windows(2).enumerate() {
            if pair[1].index <= pair[0].index {
                return Err(MetalabelError::OutOfOrder {
                    position: position + 1,
                    previous: pair[0].index,
                    current: pair[1].index,
                });
            }
        }
        Ok(())
    }
}

/// Direction of a primary signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `None` for a flat (zero) signal.
    pub fn from_signal(signal: f64) -> Option<Self> {
        if signal > 0.0 {
            Some(Direction::Long)
        } else if signal < 0.0 {
            Some(Direction::Short)
        } else {
            None
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }
}
