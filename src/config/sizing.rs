use super::traits::{ensure_in_range, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratedSizingConfig {
    pub fractional_kelly: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Exponent applied to signal magnitude; sub-linear by construction.
    pub signal_exponent: f64,
    pub default_meta_confidence: f64,
    pub default_regime_weight: f64,
    pub default_toxicity: f64,
}

impl Default for IntegratedSizingConfig {
    fn default() -> Self {
        Self {
            fractional_kelly: 0.5,
            min_size: 0.01,
            max_size: 1.0,
            signal_exponent: 0.5,
            default_meta_confidence: 0.5,
            default_regime_weight: 0.8,
            default_toxicity: 0.0,
        }
    }
}

impl ConfigSection for IntegratedSizingConfig {
    fn section_name() -> &'static str {
        "sizing"
    }

    fn validate(&self) -> Result<()> {
        let section = Self::section_name();
        ensure_in_range(section, "fractional_kelly", self.fractional_kelly, f64::MIN_POSITIVE, 1.0)?;
        ensure_in_range(section, "min_size", self.min_size, 0.0, f64::MAX)?;
        ensure_in_range(section, "max_size", self.max_size, f64::MIN_POSITIVE, f64::MAX)?;
        if self.max_size <= self.min_size {
            return Err(MetalabelError::Configuration(format!(
                "sizing.max_size ({}) must exceed min_size ({})",
                self.max_size, self.min_size
            )));
        }
        ensure_in_range(section, "signal_exponent", self.signal_exponent, f64::MIN_POSITIVE, 1.0)?;
        ensure_in_range(section, "default_meta_confidence", self.default_meta_confidence, 0.0, 1.0)?;
        ensure_in_range(section, "default_regime_weight", self.default_regime_weight, 0.0, f64::MAX)?;
        ensure_in_range(section, "default_toxicity", self.default_toxicity, 0.0, 1.0)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let d = Self::default();
        ConfigManifest {
            section: "Integrated Sizing".to_string(),
            fields: vec![
                FieldManifest::new("fractional_kelly", "float", json!(d.fractional_kelly), Some(0.0), Some(1.0), "Kelly fraction applied to every size (exclusive min)"),
                FieldManifest::new("min_size", "float", json!(d.min_size), Some(0.0), None, "Sizes below this snap to zero (no trade)"),
                FieldManifest::new("max_size", "float", json!(d.max_size), Some(0.0), None, "Absolute size cap; must exceed min_size"),
                FieldManifest::new("signal_exponent", "float", json!(d.signal_exponent), Some(0.0), Some(1.0), "Exponent on signal magnitude (exclusive min)"),
                FieldManifest::new("default_meta_confidence", "float", json!(d.default_meta_confidence), Some(0.0), Some(1.0), "Used when the meta-model is unavailable"),
                FieldManifest::new("default_regime_weight", "float", json!(d.default_regime_weight), Some(0.0), None, "Used when no regime weight is supplied"),
                FieldManifest::new("default_toxicity", "float", json!(d.default_toxicity), Some(0.0), Some(1.0), "Used when no toxicity is supplied"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = IntegratedSizingConfig {
            min_size: 0.5,
            max_size: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_kelly() {
        let config = IntegratedSizingConfig {
            fractional_kelly: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
