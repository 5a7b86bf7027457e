use super::classifier::{ClassifierFactory, MetaClassifier};
use crate::config::MetaModelConfig;
use crate::engines::validation::{WalkForwardReport, WalkForwardTrainer};
use crate::error::{MetalabelError, Result};
use crate::ml::signals::MetaSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock};

/// How much a prediction can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    Trained,
    /// Fresh model; nothing fitted yet.
    Untrained,
    /// Fewer than `min_train_samples` rows.
    InsufficientData,
    /// Training rows held only one class.
    SingleClass,
}

impl Reliability {
    pub fn is_trained(self) -> bool {
        self == Reliability::Trained
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetaPrediction {
    pub probability: f64,
    pub reliability: Reliability,
}

impl MetaPrediction {
    pub fn is_low_confidence(&self) -> bool {
        !self.reliability.is_trained()
    }
}

/// Immutable result of one fit. Never mutated once built.
#[derive(Debug, Clone)]
pub struct MetaModelState {
    classifier: Option<Arc<dyn MetaClassifier>>,
    reliability: Reliability,
    neutral_probability: f64,
    feature_names: Vec<String>,
    fit_timestamp: DateTime<Utc>,
    window_id: Option<usize>,
    n_train_samples: usize,
}

impl MetaModelState {
    pub fn untrained(feature_names: Vec<String>, neutral_probability: f64) -> Self {
        Self {
            classifier: None,
            reliability: Reliability::Untrained,
            neutral_probability,
            feature_names,
            fit_timestamp: Utc::now(),
            window_id: None,
            n_train_samples: 0,
        }
    }

    /// Fits a state on `samples`; too few rows or a single class gives a
    /// neutral state instead of an error.
    pub fn fit(
        factory: &dyn ClassifierFactory,
        samples: &[&MetaSample],
        feature_names: &[String],
        config: &MetaModelConfig,
        window_id: Option<usize>,
    ) -> Result<Self> {
        if let Some(bad) = samples.iter().find(|s| s.features.len() != feature_names.len()) {
            return Err(MetalabelError::LengthMismatch {
                left: "feature_names",
                left_len: feature_names.len(),
                right: "features",
                right_len: bad.features.len(),
            });
        }

        let degenerate = |reliability| Self {
            classifier: None,
            reliability,
            neutral_probability: config.neutral_probability,
            feature_names: feature_names.to_vec(),
            fit_timestamp: Utc::now(),
            window_id,
            n_train_samples: samples.len(),
        };

        if samples.len() < config.min_train_samples {
            log::warn!(
                "Insufficient training data: {} samples (min: {}); model returns neutral probability",
                samples.len(),
                config.min_train_samples
            );
            return Ok(degenerate(Reliability::InsufficientData));
        }

        let positives = samples.iter().filter(|s| s.is_positive()).count();
        if positives == 0 || positives == samples.len() {
            log::warn!(
                "Only one class present in {} meta-labels; model returns neutral probability",
                samples.len()
            );
            return Ok(degenerate(Reliability::SingleClass));
        }

        let features: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
        let targets: Vec<u8> = samples.iter().map(|s| s.meta_target).collect();
        let classifier = factory.fit(&features, &targets)?;

        log::debug!(
            "Fitted {} on {} samples ({} positive) with {} features",
            factory.name(),
            samples.len(),
            positives,
            feature_names.len()
        );

        Ok(Self {
            classifier: Some(classifier),
            reliability: Reliability::Trained,
            neutral_probability: config.neutral_probability,
            feature_names: feature_names.to_vec(),
            fit_timestamp: Utc::now(),
            window_id,
            n_train_samples: samples.len(),
        })
    }

    /// P(primary signal is correct). Fails only on a feature-width mismatch.
    pub fn predict(&self, features: &[f64]) -> Result<MetaPrediction> {
        MetalabelError::ensure_same_len(
            "feature_names",
            self.feature_names.len(),
            "features",
            features.len(),
        )?;

        let probability = match &self.classifier {
            Some(classifier) => classifier.predict_proba(features),
            None => self.neutral_probability,
        };

        Ok(MetaPrediction {
            probability,
            reliability: self.reliability,
        })
    }

    pub fn reliability(&self) -> Reliability {
        self.reliability
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn fit_timestamp(&self) -> DateTime<Utc> {
        self.fit_timestamp
    }

    pub fn window_id(&self) -> Option<usize> {
        self.window_id
    }

    pub fn n_train_samples(&self) -> usize {
        self.n_train_samples
    }

    /// `(feature, importance)` pairs, sorted by descending importance.
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.classifier.as_ref()?.feature_importances()?;
        let mut pairs: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances)
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(pairs)
    }
}

/// Single-slot holder of the live model.
///
/// Readers clone the `Arc` and release the lock before predicting, so a
/// refit only ever waits for a pointer copy, and a prediction sees either
/// the old or the new state in full.
pub struct MetaModel {
    current: RwLock<Arc<MetaModelState>>,
}

impl MetaModel {
    pub fn new(feature_names: Vec<String>, neutral_probability: f64) -> Self {
        Self {
            current: RwLock::new(Arc::new(MetaModelState::untrained(
                feature_names,
                neutral_probability,
            ))),
        }
    }

    pub fn current(&self) -> Arc<MetaModelState> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn predict(&self, features: &[f64]) -> Result<MetaPrediction> {
        self.current().predict(features)
    }

    /// Swaps in a freshly fitted state.
    ///
    /// A model never returns to `Untrained`, and a degenerate state does not
    /// displace a trained one.
    pub fn install(&self, state: MetaModelState) -> Result<bool> {
        if state.reliability() == Reliability::Untrained {
            return Err(MetalabelError::Validation(
                "cannot install an untrained model state".to_string(),
            ));
        }

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if slot.feature_names() != state.feature_names() {
            return Err(MetalabelError::Validation(format!(
                "model expects features {:?}, refit produced {:?}",
                slot.feature_names(),
                state.feature_names()
            )));
        }
        if slot.reliability().is_trained() && !state.reliability().is_trained() {
            log::warn!(
                "Keeping trained model from {}; refit was {:?}",
                slot.fit_timestamp(),
                state.reliability()
            );
            return Ok(false);
        }

        log::info!(
            "Installed meta-model ({:?}, {} training samples)",
            state.reliability(),
            state.n_train_samples()
        );
        *slot = Arc::new(state);
        Ok(true)
    }

    /// Walk-forward evaluation, then a swap to a model fitted on the latest
    /// window. A cancelled evaluation leaves the live model untouched.
    pub fn refit(
        &self,
        trainer: &WalkForwardTrainer,
        samples: &[MetaSample],
        cancel: Option<&AtomicBool>,
    ) -> Result<WalkForwardReport> {
        let report = trainer.fit(samples, cancel)?;
        if report.cancelled {
            return Ok(report);
        }

        let latest = trainer.fit_latest(samples)?;
        self.install(latest)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::labeling::BarrierLabel;
    use crate::ml::models::BaggedTreesFactory;
    use crate::types::Direction;

    fn sample(i: usize, x: f64, target: u8) -> MetaSample {
        MetaSample {
            index: i,
            primary_direction: Direction::Long,
            true_label: if target == 1 {
                BarrierLabel::TakeProfit
            } else {
                BarrierLabel::StopLoss
            },
            meta_target: target,
            realized_return: 0.0,
            exit_index: i + 1,
            features: vec![x],
        }
    }

    fn config() -> MetaModelConfig {
        MetaModelConfig {
            estimator_count: 10,
            min_train_samples: 20,
            train_size: 50,
            ..Default::default()
        }
    }

    fn names() -> Vec<String> {
        vec!["x".to_string()]
    }

    #[test]
    fn test_insufficient_data_is_neutral() {
        let samples: Vec<MetaSample> = (0..5).map(|i| sample(i, i as f64, (i % 2) as u8)).collect();
        let refs: Vec<&MetaSample> = samples.iter().collect();
        let factory = BaggedTreesFactory::from_config(&config());
        let state = MetaModelState::fit(&factory, &refs, &names(), &config(), Some(0)).unwrap();

        let prediction = state.predict(&[1.0]).unwrap();
        assert_eq!(prediction.probability, 0.5);
        assert_eq!(prediction.reliability, Reliability::InsufficientData);
        assert!(prediction.is_low_confidence());
    }

    #[test]
    fn test_single_class_is_neutral() {
        let samples: Vec<MetaSample> = (0..30).map(|i| sample(i, i as f64, 1)).collect();
        let refs: Vec<&MetaSample> = samples.iter().collect();
        let factory = BaggedTreesFactory::from_config(&config());
        let state = MetaModelState::fit(&factory, &refs, &names(), &config(), None).unwrap();
        assert_eq!(state.reliability(), Reliability::SingleClass);
        assert_eq!(state.predict(&[3.0]).unwrap().probability, 0.5);
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let state = MetaModelState::untrained(names(), 0.5);
        assert!(state.predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_install_transitions() {
        let model = MetaModel::new(names(), 0.5);
        assert_eq!(model.current().reliability(), Reliability::Untrained);
        assert!(model
            .install(MetaModelState::untrained(names(), 0.5))
            .is_err());

        let samples: Vec<MetaSample> = (0..40).map(|i| sample(i, i as f64, u8::from(i >= 20))).collect();
        let refs: Vec<&MetaSample> = samples.iter().collect();
        let factory = BaggedTreesFactory::from_config(&config());
        let trained = MetaModelState::fit(&factory, &refs, &names(), &config(), Some(1)).unwrap();
        assert!(model.install(trained).unwrap());
        assert!(model.predict(&[35.0]).unwrap().probability > 0.5);

        let degenerate = MetaModelState::fit(&factory, &refs[..3], &names(), &config(), Some(2)).unwrap();
        assert!(!model.install(degenerate).unwrap());
        assert_eq!(model.current().window_id(), Some(1));
    }
}
