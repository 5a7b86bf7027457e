use super::config::{
    BarrierEvent, BarrierLabel, BarrierLabels, LabelingStatus, SkipReason, SkippedEntry,
};
use crate::config::{BarrierConfig, ConfigSection, TieBreak};
use crate::error::{MetalabelError, Result};
use crate::types::{Direction, PricePoint};
use serde::{Deserialize, Serialize};

pub struct TripleBarrierLabeler {
    config: BarrierConfig,
}

impl TripleBarrierLabeler {
    /// Fails on a config with non-positive multiples or horizon.
    pub fn new(config: BarrierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    /// Label every bar with a non-zero signal using the triple-barrier method.
    ///
    /// `volatility[i]` must already be causal (computed from bars `<= i`).
    /// Barriers are tested against each forward bar's high/low.
    pub fn label(
        &self,
        prices: &[PricePoint],
        volatility: &[f64],
        signals: &[f64],
    ) -> Result<BarrierLabels> {
        MetalabelError::ensure_same_len("prices", prices.len(), "signals", signals.len())?;
        MetalabelError::ensure_same_len("prices", prices.len(), "volatility", volatility.len())?;
        PricePoint::ensure_chronological(prices)?;

        if let Some(pos) = signals.iter().position(|s| s.is_nan()) {
            return Err(MetalabelError::Validation(format!(
                "signal at position {} is NaN",
                pos
            )));
        }

        if prices.len() < self.config.volatility_window {
            log::warn!(
                "Not labeling: {} bars available, volatility window needs {}",
                prices.len(),
                self.config.volatility_window
            );
            return Ok(BarrierLabels {
                events: Vec::new(),
                skipped: Vec::new(),
                status: LabelingStatus::InsufficientData {
                    required: self.config.volatility_window,
                    available: prices.len(),
                },
            });
        }

        let mut events = Vec::new();
        let mut skipped = Vec::new();

        for (entry_idx, &signal) in signals.iter().enumerate() {
            let direction = match Direction::from_signal(signal) {
                Some(direction) => direction,
                None => continue,
            };

            let vol = volatility[entry_idx];
            if !vol.is_finite() || vol <= self.config.min_volatility {
                skipped.push(SkippedEntry {
                    index: entry_idx,
                    reason: SkipReason::InvalidVolatility,
                });
                continue;
            }

            if entry_idx + 1 >= prices.len() {
                skipped.push(SkippedEntry {
                    index: entry_idx,
                    reason: SkipReason::NoForwardBars,
                });
                continue;
            }

            events.push(self.label_single_entry(prices, entry_idx, direction, vol));
        }

        log::debug!(
            "Labeled {} entries ({} skipped) over {} bars",
            events.len(),
            skipped.len(),
            prices.len()
        );

        Ok(BarrierLabels {
            events,
            skipped,
            status: LabelingStatus::Complete,
        })
    }

    fn label_single_entry(
        &self,
        prices: &[PricePoint],
        entry_idx: usize,
        direction: Direction,
        volatility: f64,
    ) -> BarrierEvent {
        let entry_price = prices[entry_idx].close;
        let sign = direction.sign();

        // Levels mirror for shorts: profit below entry, loss above
        let profit_level = entry_price + sign * self.config.profit_multiple * volatility;
        let loss_level = entry_price - sign * self.config.loss_multiple * volatility;

        let horizon_end = entry_idx + self.config.max_holding_bars;
        let timeout_idx = horizon_end.min(prices.len() - 1);

        let event = |exit_index: usize, exit_price: f64, label: BarrierLabel| BarrierEvent {
            entry_index: entry_idx,
            direction,
            entry_price,
            volatility_at_entry: volatility,
            profit_level,
            loss_level,
            timeout_index: timeout_idx,
            exit_index,
            exit_price,
            label,
            truncated: timeout_idx < horizon_end,
        };

        // Scan forward to find first barrier hit
        for i in (entry_idx + 1)..=timeout_idx {
            let bar = &prices[i];
            let (profit_hit, loss_hit) = match direction {
                Direction::Long => (bar.high >= profit_level, bar.low <= loss_level),
                Direction::Short => (bar.low <= profit_level, bar.high >= loss_level),
            };

            match (profit_hit, loss_hit) {
                (true, true) => {
                    return match self.config.tie_break {
                        TieBreak::StopLoss => event(i, loss_level, BarrierLabel::StopLoss),
                        TieBreak::TakeProfit => event(i, profit_level, BarrierLabel::TakeProfit),
                    };
                }
                (true, false) => return event(i, profit_level, BarrierLabel::TakeProfit),
                (false, true) => return event(i, loss_level, BarrierLabel::StopLoss),
                (false, false) => {}
            }
        }

        // Hit time limit (or the end of the series)
        event(timeout_idx, prices[timeout_idx].close, BarrierLabel::Timeout)
    }

    /// Per-bar label array: the event's label at its entry, 0 elsewhere.
    pub fn dense_labels(events: &[BarrierEvent], len: usize) -> Vec<i8> {
        let mut labels = vec![0i8; len];
        for event in events {
            if let Some(slot) = labels.get_mut(event.entry_index) {
                *slot = event.label.value();
            }
        }
        labels
    }
}

/// Label distribution of a set of events.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub total_count: usize,
    pub profit_count: usize,
    pub loss_count: usize,
    pub timeout_count: usize,
    pub profit_pct: f64,
    pub loss_pct: f64,
    pub timeout_pct: f64,
    pub mean_profit_return: f64,
    pub mean_loss_return: f64,
    pub mean_timeout_return: f64,
}

impl LabelStats {
    pub fn from_events(events: &[BarrierEvent]) -> Self {
        let mut stats = LabelStats::default();
        let (mut profit_sum, mut loss_sum, mut timeout_sum) = (0.0, 0.0, 0.0);

        for event in events {
            let ret = event.realized_return();
            match event.label {
                BarrierLabel::TakeProfit => {
                    stats.profit_count += 1;
                    profit_sum += ret;
                }
                BarrierLabel::StopLoss => {
                    stats.loss_count += 1;
                    loss_sum += ret;
                }
                BarrierLabel::Timeout => {
                    stats.timeout_count += 1;
                    timeout_sum += ret;
                }
            }
            stats.total_count += 1;
        }

        if stats.total_count == 0 {
            return stats;
        }

        let total = stats.total_count as f64;
        stats.profit_pct = (stats.profit_count as f64 / total) * 100.0;
        stats.loss_pct = (stats.loss_count as f64 / total) * 100.0;
        stats.timeout_pct = (stats.timeout_count as f64 / total) * 100.0;
        stats.mean_profit_return = mean_or_zero(profit_sum, stats.profit_count);
        stats.mean_loss_return = mean_or_zero(loss_sum, stats.loss_count);
        stats.mean_timeout_return = mean_or_zero(timeout_sum, stats.timeout_count);

        stats
    }
}

fn mean_or_zero(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
