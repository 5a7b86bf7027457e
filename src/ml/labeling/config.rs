use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// Outcome of one labeled trade, relative to the trade's own direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierLabel {
    StopLoss = -1,   // loss barrier touched first
    Timeout = 0,     // vertical barrier reached
    TakeProfit = 1,  // profit barrier touched first
}

impl BarrierLabel {
    pub fn value(self) -> i8 {
        self as i8
    }
}

/// One resolved entry. Immutable after labeling.
///
/// `entry_index < exit_index <= timeout_index <= entry_index + max_holding_bars`.
/// Indices are positions in the labeled price slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierEvent {
    pub entry_index: usize,
    pub direction: Direction,
    pub entry_price: f64,
    pub volatility_at_entry: f64,
    pub profit_level: f64,
    pub loss_level: f64,
    pub timeout_index: usize,
    pub exit_index: usize,
    pub exit_price: f64,
    pub label: BarrierLabel,
    /// Horizon was cut short by the end of the series.
    pub truncated: bool,
}

impl BarrierEvent {
    /// Return of the trade in its own direction, as a fraction of entry price.
    pub fn realized_return(&self) -> f64 {
        self.direction.sign() * (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Volatility at entry was zero, negative or non-finite.
    InvalidVolatility,
    /// Entry on the last bar; nothing to scan.
    NoForwardBars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelingStatus {
    Complete,
    /// Series shorter than the volatility window; no events produced.
    InsufficientData { required: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierLabels {
    pub events: Vec<BarrierEvent>,
    pub skipped: Vec<SkippedEntry>,
    pub status: LabelingStatus,
}

impl BarrierLabels {
    pub fn is_insufficient(&self) -> bool {
        matches!(self.status, LabelingStatus::InsufficientData { .. })
    }
}
