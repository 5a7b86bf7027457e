use super::traits::{ensure_at_least, ensure_in_range, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaModelConfig {
    pub estimator_count: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    /// Features tried per split; `None` means sqrt(feature count).
    pub max_features: Option<usize>,
    pub seed: u64,
    pub train_size: usize,
    pub test_size: usize,
    pub step_size: usize,
    pub embargo_size: usize,
    pub min_train_samples: usize,
    /// Probability returned by degenerate (untrained / insufficient) models.
    pub neutral_probability: f64,
}

impl Default for MetaModelConfig {
    fn default() -> Self {
        Self {
            estimator_count: 100,
            max_depth: 5,
            min_samples_leaf: 5,
            min_samples_split: 10,
            max_features: None,
            seed: 42,
            train_size: 252,
            test_size: 63,
            step_size: 21,
            embargo_size: 5,
            min_train_samples: 100,
            neutral_probability: 0.5,
        }
    }
}

/// Walk-forward geometry, in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub train_size: usize,
    pub test_size: usize,
    pub step_size: usize,
    pub embargo_size: usize,
}

impl MetaModelConfig {
    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            train_size: self.train_size,
            test_size: self.test_size,
            step_size: self.step_size,
            embargo_size: self.embargo_size,
        }
    }
}

impl WindowSpec {
    pub fn validate(&self) -> Result<()> {
        let section = MetaModelConfig::section_name();
        ensure_at_least(section, "train_size", self.train_size, 1)?;
        ensure_at_least(section, "test_size", self.test_size, 1)?;
        ensure_at_least(section, "step_size", self.step_size, 1)?;
        // a zero-width embargo would let train_end == test_start
        ensure_at_least(section, "embargo_size", self.embargo_size, 1)?;
        Ok(())
    }
}

impl ConfigSection for MetaModelConfig {
    fn section_name() -> &'static str {
        "meta_model"
    }

    fn validate(&self) -> Result<()> {
        let section = Self::section_name();
        ensure_at_least(section, "estimator_count", self.estimator_count, 1)?;
        ensure_at_least(section, "max_depth", self.max_depth, 1)?;
        ensure_at_least(section, "min_samples_leaf", self.min_samples_leaf, 1)?;
        ensure_at_least(section, "min_samples_split", self.min_samples_split, 2)?;
        if let Some(max_features) = self.max_features {
            ensure_at_least(section, "max_features", max_features, 1)?;
        }
        ensure_at_least(section, "min_train_samples", self.min_train_samples, 1)?;
        ensure_in_range(section, "neutral_probability", self.neutral_probability, 0.0, 1.0)?;
        self.window_spec().validate()?;
        if self.min_train_samples > self.train_size {
            return Err(MetalabelError::Configuration(format!(
                "meta_model.min_train_samples ({}) cannot exceed train_size ({})",
                self.min_train_samples, self.train_size
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let d = Self::default();
        ConfigManifest {
            section: "Meta Model".to_string(),
            fields: vec![
                FieldManifest::new("estimator_count", "integer", json!(d.estimator_count), Some(1.0), None, "Trees in the bagged ensemble"),
                FieldManifest::new("max_depth", "integer", json!(d.max_depth), Some(1.0), None, "Maximum depth of each tree"),
                FieldManifest::new("min_samples_leaf", "integer", json!(d.min_samples_leaf), Some(1.0), None, "Minimum samples in a leaf"),
                FieldManifest::new("min_samples_split", "integer", json!(d.min_samples_split), Some(2.0), None, "Minimum samples to split a node"),
                FieldManifest::new("max_features", "integer?", json!(null), Some(1.0), None, "Features tried per split (default sqrt)"),
                FieldManifest::new("seed", "integer", json!(d.seed), Some(0.0), None, "Seed for bootstrap and feature sampling"),
                FieldManifest::new("train_size", "integer", json!(d.train_size), Some(1.0), None, "Training window length in bars"),
                FieldManifest::new("test_size", "integer", json!(d.test_size), Some(1.0), None, "Test window length in bars"),
                FieldManifest::new("step_size", "integer", json!(d.step_size), Some(1.0), None, "Bars between consecutive windows"),
                FieldManifest::new("embargo_size", "integer", json!(d.embargo_size), Some(1.0), None, "Gap between train and test windows"),
                FieldManifest::new("min_train_samples", "integer", json!(d.min_train_samples), Some(1.0), None, "Below this the model is degenerate (neutral)"),
                FieldManifest::new("neutral_probability", "float", json!(d.neutral_probability), Some(0.0), Some(1.0), "Probability returned by degenerate models"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub lookback: usize,
    pub include_rsi: bool,
    pub rsi_window: usize,
    pub include_volume: bool,
    pub include_regime: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            include_rsi: true,
            rsi_window: 14,
            include_volume: false,
            include_regime: false,
        }
    }
}

impl ConfigSection for FeatureConfig {
    fn section_name() -> &'static str {
        "features"
    }

    fn validate(&self) -> Result<()> {
        ensure_at_least(Self::section_name(), "lookback", self.lookback, 2)?;
        ensure_at_least(Self::section_name(), "rsi_window", self.rsi_window, 2)?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        let d = Self::default();
        ConfigManifest {
            section: "Meta Features".to_string(),
            fields: vec![
                FieldManifest::new("lookback", "integer", json!(d.lookback), Some(2.0), None, "Rolling window for volatility, momentum and mean features"),
                FieldManifest::new("include_rsi", "bool", json!(d.include_rsi), None, None, "Add an RSI feature"),
                FieldManifest::new("rsi_window", "integer", json!(d.rsi_window), Some(2.0), None, "RSI window"),
                FieldManifest::new("include_volume", "bool", json!(d.include_volume), None, None, "Add volume ratio (requires volume)"),
                FieldManifest::new("include_regime", "bool", json!(d.include_regime), None, None, "Add regime state (requires regime series)"),
            ],
        }
    }
}
