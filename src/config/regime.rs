use super::traits::{ensure_at_least, ensure_in_range, ensure_positive, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Online changepoint detector settings (Normal-Inverse-Gamma prior).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BocdConfig {
    pub hazard_rate: f64,
    pub prior_mean: f64,
    pub prior_precision: f64, // kappa0
    pub prior_shape: f64,     // alpha0
    pub prior_scale: f64,     // beta0
    pub max_run_length: usize,
    pub detection_threshold: f64,
    /// Run lengths `0..=changepoint_window` count as "changed recently".
    pub changepoint_window: usize,
    pub warmup_observations: usize,
}

impl Default for BocdConfig {
    fn default() -> Self {
        Self {
            hazard_rate: 1.0 / 250.0,
            prior_mean: 0.0,
            prior_precision: 1.0,
            prior_shape: 1.0,
            prior_scale: 1.0,
            max_run_length: 500,
            detection_threshold: 0.8,
            changepoint_window: 5,
            warmup_observations: 10,
        }
    }
}

impl ConfigSection for BocdConfig {
    fn section_name() -> &'static str {
        "bocd"
    }

    fn validate(&self) -> Result<()> {
        let section = Self::section_name();
        if !(self.hazard_rate > 0.0 && self.hazard_rate < 1.0) {
            return Err(MetalabelError::Configuration(format!(
                "bocd.hazard_rate must be in (0, 1), got {}",
                self.hazard_rate
            )));
        }
        if !self.prior_mean.is_finite() {
            return Err(MetalabelError::Configuration(
                "bocd.prior_mean must be finite".to_string(),
            ));
        }
        ensure_positive(section, "prior_precision", self.prior_precision)?;
        ensure_positive(section, "prior_shape", self.prior_shape)?;
        ensure_positive(section, "prior_scale", self.prior_scale)?;
        ensure_at_least(section, "max_run_length", self.max_run_length, 1)?;
        ensure_in_range(section, "detection_threshold", self.detection_threshold, f64::MIN_POSITIVE, 1.0)?;
        if self.changepoint_window >= self.max_run_length {
            return Err(MetalabelError::Configuration(format!(
                "bocd.changepoint_window ({}) must be below max_run_length ({})",
                self.changepoint_window, self.max_run_length
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let d = Self::default();
        ConfigManifest {
            section: "Changepoint Detection".to_string(),
            fields: vec![
                FieldManifest::new("hazard_rate", "float", json!(d.hazard_rate), Some(0.0), Some(1.0), "Prior probability of a changepoint per observation (exclusive bounds)"),
                FieldManifest::new("prior_mean", "float", json!(d.prior_mean), None, None, "Prior mean of observations"),
                FieldManifest::new("prior_precision", "float", json!(d.prior_precision), Some(0.0), None, "Pseudo-observations backing the prior mean (exclusive min)"),
                FieldManifest::new("prior_shape", "float", json!(d.prior_shape), Some(0.0), None, "Inverse-Gamma shape (exclusive min)"),
                FieldManifest::new("prior_scale", "float", json!(d.prior_scale), Some(0.0), None, "Inverse-Gamma scale (exclusive min)"),
                FieldManifest::new("max_run_length", "integer", json!(d.max_run_length), Some(1.0), None, "Run lengths beyond this fold into the tail bucket"),
                FieldManifest::new("detection_threshold", "float", json!(d.detection_threshold), Some(0.0), Some(1.0), "Changepoint probability that emits an event"),
                FieldManifest::new("changepoint_window", "integer", json!(d.changepoint_window), Some(0.0), None, "Run lengths counted as a recent changepoint (below max_run_length)"),
                FieldManifest::new("warmup_observations", "integer", json!(d.warmup_observations), Some(0.0), None, "Events before this many observations never trigger a refit"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_bounds_are_exclusive() {
        for hazard in [0.0, 1.0, -0.1, f64::NAN] {
            let config = BocdConfig {
                hazard_rate: hazard,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "hazard {} accepted", hazard);
        }
        assert!(BocdConfig::default().validate().is_ok());
    }

    #[test]
    fn test_window_must_fit_under_max_run_length() {
        let config = BocdConfig {
            max_run_length: 5,
            changepoint_window: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_prior_must_be_proper() {
        let config = BocdConfig {
            prior_scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
