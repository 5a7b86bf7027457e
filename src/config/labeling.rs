use super::traits::{ensure_at_least, ensure_in_range, ensure_positive, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Which barrier wins when a single bar's range touches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    #[default]
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    pub profit_multiple: f64,    // profit barrier = multiple * volatility from entry
    pub loss_multiple: f64,      // loss barrier = multiple * volatility from entry
    pub max_holding_bars: usize, // vertical barrier
    pub volatility_window: usize,
    pub tie_break: TieBreak,
    /// Entries whose volatility is at or below this are skipped.
    pub min_volatility: f64,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            profit_multiple: 2.0,
            loss_multiple: 1.0,
            max_holding_bars: 10,
            volatility_window: 14,
            tie_break: TieBreak::StopLoss,
            min_volatility: 1e-12,
        }
    }
}

impl ConfigSection for BarrierConfig {
    fn section_name() -> &'static str {
        "labeling"
    }

    fn validate(&self) -> Result<()> {
        let section = Self::section_name();
        ensure_positive(section, "profit_multiple", self.profit_multiple)?;
        ensure_positive(section, "loss_multiple", self.loss_multiple)?;
        ensure_at_least(section, "max_holding_bars", self.max_holding_bars, 1)?;
        ensure_at_least(section, "volatility_window", self.volatility_window, 2)?;
        ensure_in_range(section, "min_volatility", self.min_volatility, 0.0, f64::MAX)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let defaults = Self::default();
        ConfigManifest {
            section: "Triple Barrier Labeling".to_string(),
            fields: vec![
                FieldManifest::new(
                    "profit_multiple",
                    "float",
                    json!(defaults.profit_multiple),
                    Some(f64::MIN_POSITIVE),
                    None,
                    "Profit barrier distance in units of entry volatility",
                ),
                FieldManifest::new(
                    "loss_multiple",
                    "float",
                    json!(defaults.loss_multiple),
                    Some(f64::MIN_POSITIVE),
                    None,
                    "Loss barrier distance in units of entry volatility",
                ),
                FieldManifest::new(
                    "max_holding_bars",
                    "integer",
                    json!(defaults.max_holding_bars),
                    Some(1.0),
                    None,
                    "Vertical barrier: bars after entry before timeout",
                ),
                FieldManifest::new(
                    "volatility_window",
                    "integer",
                    json!(defaults.volatility_window),
                    Some(2.0),
                    None,
                    "Bars used by the external volatility estimate; shorter series are not labeled",
                ),
                FieldManifest::new(
                    "tie_break",
                    "enum[StopLoss,TakeProfit]",
                    json!("StopLoss"),
                    None,
                    None,
                    "Barrier that wins when one bar touches both",
                ),
                FieldManifest::new(
                    "min_volatility",
                    "float",
                    json!(defaults.min_volatility),
                    Some(0.0),
                    None,
                    "Entries with volatility at or below this are skipped",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BarrierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_multiples() {
        let config = BarrierConfig {
            profit_multiple: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BarrierConfig {
            loss_multiple: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let config = BarrierConfig {
            max_holding_bars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asymmetric_barriers_are_legal() {
        let config = BarrierConfig {
            profit_multiple: 0.5,
            loss_multiple: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
