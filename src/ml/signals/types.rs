use crate::ml::labeling::{BarrierEvent, BarrierLabel};
use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// Training example for the meta-model: was the primary signal right?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSample {
    /// Entry bar of the underlying event.
    pub index: usize,
    pub primary_direction: Direction,
    pub true_label: BarrierLabel,
    pub meta_target: u8,
    pub realized_return: f64,
    /// Bar at which the label resolved; drives purging.
    pub exit_index: usize,
    pub features: Vec<f64>,
}

impl MetaSample {
    pub fn from_event(event: &BarrierEvent, features: Vec<f64>) -> Self {
        let realized_return = event.realized_return();
        Self {
            index: event.entry_index,
            primary_direction: event.direction,
            true_label: event.label,
            meta_target: meta_target(event.label, realized_return),
            realized_return,
            exit_index: event.exit_index,
            features,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.meta_target == 1
    }
}

/// 1 when the trade made money in its own direction.
///
/// Labels are already trade-relative, so a profit-barrier touch is a hit and
/// a loss-barrier touch is a miss; timeouts use the sign of the return, with
/// a flat return counted as a miss.
pub fn meta_target(label: BarrierLabel, realized_return: f64) -> u8 {
    match label {
        BarrierLabel::TakeProfit => 1,
        BarrierLabel::StopLoss => 0,
        BarrierLabel::Timeout => u8::from(realized_return > 0.0),
    }
}
