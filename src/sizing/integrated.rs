use crate::config::{ConfigSection, IntegratedSizingConfig};
use crate::error::Result;
use crate::ml::models::MetaPrediction;
use serde::{Deserialize, Serialize};

/// Names an input of the sizing formula, for audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizingInput {
    SignalDirection,
    SignalMagnitude,
    MetaConfidence,
    RegimeWeight,
    Toxicity,
}

/// Per-bar inputs. Optional inputs fall back to configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizingInputs {
    pub signal_direction: i8,
    pub signal_magnitude: f64,
    pub meta_confidence: Option<f64>,
    pub regime_weight: Option<f64>,
    pub toxicity: Option<f64>,
}

impl SizingInputs {
    pub fn new(signal_direction: i8, signal_magnitude: f64) -> Self {
        Self {
            signal_direction,
            signal_magnitude,
            ..Default::default()
        }
    }

    /// Direction from the sign of `signal`, magnitude from its absolute value.
    pub fn from_signal(signal: f64) -> Self {
        let direction = if signal > 0.0 {
            1
        } else if signal < 0.0 {
            -1
        } else {
            0
        };
        Self::new(direction, signal.abs())
    }

    pub fn with_meta_confidence(mut self, confidence: f64) -> Self {
        self.meta_confidence = Some(confidence);
        self
    }

    /// Uses the probability only when the model is trained; a neutral
    /// fallback counts as missing.
    pub fn with_meta_prediction(mut self, prediction: &MetaPrediction) -> Self {
        self.meta_confidence = if prediction.is_low_confidence() {
            None
        } else {
            Some(prediction.probability)
        };
        self
    }

    pub fn with_regime_weight(mut self, weight: f64) -> Self {
        self.regime_weight = Some(weight);
        self
    }

    pub fn with_toxicity(mut self, toxicity: f64) -> Self {
        self.toxicity = Some(toxicity);
        self
    }
}

/// Every multiplicative term of the size, as used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    /// `signal_magnitude ^ signal_exponent`
    pub signal_term: f64,
    pub meta_term: f64,
    pub regime_term: f64,
    /// `1 - toxicity`
    pub toxicity_term: f64,
    pub kelly_fraction: f64,
}

impl FactorBreakdown {
    pub fn product(&self) -> f64 {
        self.signal_term * self.meta_term * self.regime_term * self.toxicity_term * self.kelly_fraction
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedSizeResult {
    /// Signed size in `[-max_size, max_size]`; 0 means no trade.
    pub final_size: f64,
    /// -1, 0 or +1; 0 whenever `final_size` is 0.
    pub direction: i8,
    pub factors: FactorBreakdown,
    /// Unsigned size before clipping and snapping.
    pub raw_size: f64,
    pub defaults_applied: Vec<SizingInput>,
    pub clamped_inputs: Vec<SizingInput>,
    /// Raw size exceeded `max_size`.
    pub clipped: bool,
    /// Raw size was positive but below `min_size`, so snapped to zero.
    pub below_minimum: bool,
}

impl IntegratedSizeResult {
    pub fn is_flat(&self) -> bool {
        self.final_size == 0.0
    }
}

/// Stateless combination of signal, meta-confidence, regime and toxicity.
#[derive(Debug, Clone)]
pub struct IntegratedSizer {
    config: IntegratedSizingConfig,
}

impl IntegratedSizer {
    pub fn new(config: IntegratedSizingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IntegratedSizingConfig {
        &self.config
    }

    /// `direction * magnitude^exp * meta * regime * (1 - toxicity) * kelly`,
    /// clipped to `max_size` and snapped to 0 under `min_size`.
    ///
    /// Never fails: missing or non-finite optional inputs take their
    /// configured default, and out-of-range inputs are clamped.
    pub fn calculate(&self, inputs: &SizingInputs) -> IntegratedSizeResult {
        let mut defaults_applied = Vec::new();
        let mut clamped_inputs = Vec::new();

        let direction = match inputs.signal_direction {
            d @ -1..=1 => d,
            d => {
                clamped_inputs.push(SizingInput::SignalDirection);
                d.signum()
            }
        };

        let magnitude = if inputs.signal_magnitude.is_finite() && inputs.signal_magnitude >= 0.0 {
            inputs.signal_magnitude
        } else {
            clamped_inputs.push(SizingInput::SignalMagnitude);
            0.0
        };

        let meta = self.resolve(
            SizingInput::MetaConfidence,
            inputs.meta_confidence,
            self.config.default_meta_confidence,
            (0.0, 1.0),
            &mut defaults_applied,
            &mut clamped_inputs,
        );
        let regime = self.resolve(
            SizingInput::RegimeWeight,
            inputs.regime_weight,
            self.config.default_regime_weight,
            (0.0, f64::INFINITY),
            &mut defaults_applied,
            &mut clamped_inputs,
        );
        let toxicity = self.resolve(
            SizingInput::Toxicity,
            inputs.toxicity,
            self.config.default_toxicity,
            (0.0, 1.0),
            &mut defaults_applied,
            &mut clamped_inputs,
        );

        if !clamped_inputs.is_empty() {
            log::warn!("Sizing inputs clamped into range: {:?}", clamped_inputs);
        }

        let factors = FactorBreakdown {
            signal_term: magnitude.powf(self.config.signal_exponent),
            meta_term: meta,
            regime_term: regime,
            toxicity_term: 1.0 - toxicity,
            kelly_fraction: self.config.fractional_kelly,
        };

        let raw_size = if direction == 0 { 0.0 } else { factors.product() };
        let clipped = raw_size > self.config.max_size;
        let below_minimum = raw_size > 0.0 && raw_size < self.config.min_size;

        let (final_size, direction) = if raw_size < self.config.min_size || raw_size == 0.0 {
            (0.0, 0)
        } else {
            (direction as f64 * raw_size.min(self.config.max_size), direction)
        };

        log::debug!(
            "Sizing: dir={} mag={:.4} meta={:.4} regime={:.4} tox={:.4} raw={:.4} final={:.4}",
            inputs.signal_direction,
            magnitude,
            meta,
            regime,
            toxicity,
            raw_size,
            final_size
        );

        IntegratedSizeResult {
            final_size,
            direction,
            factors,
            raw_size,
            defaults_applied,
            clamped_inputs,
            clipped,
            below_minimum,
        }
    }

    fn resolve(
        &self,
        input: SizingInput,
        value: Option<f64>,
        default: f64,
        (min, max): (f64, f64),
        defaults_applied: &mut Vec<SizingInput>,
        clamped_inputs: &mut Vec<SizingInput>,
    ) -> f64 {
        match value {
            Some(v) if v.is_finite() => {
                if v < min || v > max {
                    clamped_inputs.push(input);
                    v.clamp(min, max)
                } else {
                    v
                }
            }
            _ => {
                defaults_applied.push(input);
                default
            }
        }
    }
}
