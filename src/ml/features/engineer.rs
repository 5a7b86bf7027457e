use super::{FeatureExtractor, MarketContext};
use crate::config::{ConfigSection, FeatureConfig};
use crate::error::{MetalabelError, Result};

const MIN_VOLATILITY: f64 = 1e-10;
const ANNUALIZATION: f64 = 252.0;

/// Volatility, momentum and market-state features for the meta-model.
///
/// Every value at bar `i` is built from bars `<= i`; warm-up and
/// non-finite values are reported as 0.
pub struct CausalFeatureEngineer {
    config: FeatureConfig,
}

impl CausalFeatureEngineer {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    fn closes(context: &MarketContext<'_>) -> Vec<f64> {
        context.prices.iter().map(|p| p.close).collect()
    }

    // Helper methods
    fn log_return(closes: &[f64], idx: usize) -> f64 {
        if idx == 0 || closes[idx - 1] <= 0.0 || closes[idx] <= 0.0 {
            return 0.0;
        }
        (closes[idx] / closes[idx - 1]).ln()
    }

    fn population_std(values: impl Iterator<Item = f64>) -> f64 {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for value in values {
            count += 1;
            sum += value;
            sum_sq += value * value;
        }
        if count == 0 {
            return 0.0;
        }
        let mean = sum / count as f64;
        (sum_sq / count as f64 - mean * mean).max(0.0).sqrt()
    }

    fn rolling_volatility(&self, closes: &[f64], idx: usize) -> f64 {
        let window = self.config.lookback;
        if idx + 1 < window {
            return 0.0;
        }
        Self::population_std((idx + 1 - window..=idx).map(|k| Self::log_return(closes, k)))
    }

    fn vol_of_vol(&self, closes: &[f64], idx: usize) -> f64 {
        let window = self.config.lookback;
        if idx + 1 < window {
            return 0.0;
        }
        Self::population_std((idx + 1 - window..=idx).map(|k| self.rolling_volatility(closes, k)))
    }

    fn momentum(&self, closes: &[f64], idx: usize) -> f64 {
        let window = self.config.lookback;
        if idx < window {
            return 0.0;
        }
        let past = closes[idx - window];
        if past != 0.0 {
            (closes[idx] - past) / past
        } else {
            0.0
        }
    }

    fn rolling_mean(values: &[f64], idx: usize, window: usize) -> f64 {
        let start = (idx + 1).saturating_sub(window);
        let slice = &values[start..=idx];
        slice.iter().sum::<f64>() / slice.len() as f64
    }

    fn rsi(&self, closes: &[f64], idx: usize) -> f64 {
        let window = self.config.rsi_window;
        if idx < window {
            return 50.0;
        }

        let mut gains = 0.0;
        let mut losses = 0.0;
        for k in (idx + 1 - window)..=idx {
            let change = closes[k] - closes[k - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses += -change;
            }
        }

        if gains == 0.0 && losses == 0.0 {
            return 50.0;
        }
        if losses == 0.0 {
            return 100.0;
        }

        let rs = gains / losses;
        100.0 - (100.0 / (1.0 + rs))
    }
}

impl FeatureExtractor for CausalFeatureEngineer {
    fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = [
            "volatility",
            "normalized_atr",
            "momentum",
            "vol_of_vol",
            "trend_strength",
            "mean_reversion",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if self.config.include_rsi {
            names.push(format!("rsi_{}", self.config.rsi_window));
        }
        if self.config.include_volume {
            names.push("volume_ratio".to_string());
        }
        if self.config.include_regime {
            names.push("regime_state".to_string());
        }
        names
    }

    fn extract(&self, context: &MarketContext<'_>) -> Result<Vec<f64>> {
        if context.is_empty() {
            return Err(MetalabelError::Validation(
                "cannot extract features from an empty context".to_string(),
            ));
        }

        let closes = Self::closes(context);
        let idx = closes.len() - 1;
        let close = closes[idx];

        let volatility = self.rolling_volatility(&closes, idx);
        let safe_vol = volatility.max(MIN_VOLATILITY);

        let normalized_atr = if close > 0.0 && context.volatility[idx].is_finite() {
            context.volatility[idx] / close
        } else {
            volatility * ANNUALIZATION.sqrt()
        };

        let momentum = self.momentum(&closes, idx);
        let mean = Self::rolling_mean(&closes, idx, self.config.lookback);
        let deviation = if mean != 0.0 { (close - mean) / mean } else { 0.0 };

        let mut features = vec![
            volatility,
            normalized_atr,
            momentum,
            self.vol_of_vol(&closes, idx),
            momentum.abs() / safe_vol,
            deviation / safe_vol,
        ];

        if self.config.include_rsi {
            features.push(self.rsi(&closes, idx));
        }

        if self.config.include_volume {
            let volume = context.volume.ok_or_else(|| {
                MetalabelError::Validation("volume_ratio feature requires a volume series".to_string())
            })?;
            let avg = Self::rolling_mean(volume, idx, self.config.lookback);
            let safe_avg = if avg > 0.0 { avg } else { 1.0 };
            features.push(volume[idx] / safe_avg);
        }

        if self.config.include_regime {
            let regime = context.regime.ok_or_else(|| {
                MetalabelError::Validation("regime_state feature requires a regime series".to_string())
            })?;
            features.push(regime[idx]);
        }

        for value in features.iter_mut() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }

        Ok(features)
    }
}
