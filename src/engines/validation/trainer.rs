use super::walk_forward::{WalkForwardSplitter, WalkForwardWindow};
use crate::config::{ConfigSection, MetaModelConfig};
use crate::engines::metrics::{aggregate_metrics, ClassificationMetrics};
use crate::error::{MetalabelError, Result};
use crate::ml::models::{ClassifierFactory, MetaModelState};
use crate::ml::signals::MetaSample;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fit and out-of-sample evaluation of one window.
#[derive(Debug, Clone)]
pub struct WindowResult {
    pub window: WalkForwardWindow,
    pub state: Arc<MetaModelState>,
    pub metrics: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct WalkForwardReport {
    pub windows: Vec<WindowResult>,
    pub aggregate: HashMap<String, f64>,
    /// Stopped early by the cancel flag; `windows` holds the completed ones.
    pub cancelled: bool,
}

impl WalkForwardReport {
    pub fn window_metrics(&self) -> Vec<&HashMap<String, f64>> {
        self.windows.iter().map(|w| &w.metrics).collect()
    }
}

pub struct WalkForwardTrainer {
    config: MetaModelConfig,
    splitter: WalkForwardSplitter,
    factory: Arc<dyn ClassifierFactory>,
    feature_names: Vec<String>,
}

impl WalkForwardTrainer {
    pub fn new(
        config: MetaModelConfig,
        factory: Arc<dyn ClassifierFactory>,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        config.validate()?;
        let splitter = WalkForwardSplitter::new(config.window_spec())?;
        Ok(Self {
            config,
            splitter,
            factory,
            feature_names,
        })
    }

    pub fn config(&self) -> &MetaModelConfig {
        &self.config
    }

    pub fn splitter(&self) -> &WalkForwardSplitter {
        &self.splitter
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn check_samples(&self, samples: &[MetaSample]) -> Result<()> {
        for (position, pair) in samples.windows(2).enumerate() {
            if pair[1].index <= pair[0].index {
                return Err(MetalabelError::OutOfOrder {
                    position: position + 1,
                    previous: pair[0].index,
                    current: pair[1].index,
                });
            }
        }
        if let Some(bad) = samples
            .iter()
            .find(|s| s.features.len() != self.feature_names.len())
        {
            return Err(MetalabelError::LengthMismatch {
                left: "feature_names",
                left_len: self.feature_names.len(),
                right: "features",
                right_len: bad.features.len(),
            });
        }
        Ok(())
    }

    /// Walk-forward fit over `samples` (sorted by index).
    ///
    /// Windows run in order; `cancel` is checked before each window starts,
    /// never during one.
    pub fn fit(&self, samples: &[MetaSample], cancel: Option<&AtomicBool>) -> Result<WalkForwardReport> {
        self.check_samples(samples)?;

        let windows = self.splitter.windows_for(samples);
        if windows.is_empty() {
            log::warn!(
                "No complete walk-forward window fits {} samples (needs a span of {} bars)",
                samples.len(),
                self.splitter.min_span()
            );
        }

        let mut results = Vec::with_capacity(windows.len());
        let mut cancelled = false;

        for window in &windows {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                log::info!(
                    "Walk-forward cancelled after {} of {} windows",
                    results.len(),
                    windows.len()
                );
                cancelled = true;
                break;
            }

            let split = self.splitter.split(samples, window);
            let state = MetaModelState::fit(
                self.factory.as_ref(),
                &split.train,
                &self.feature_names,
                &self.config,
                Some(window.window_id),
            )?;

            let mut probabilities = Vec::with_capacity(split.test.len());
            for sample in &split.test {
                probabilities.push(state.predict(&sample.features)?.probability);
            }
            let targets: Vec<u8> = split.test.iter().map(|s| s.meta_target).collect();

            let mut metrics = ClassificationMetrics::calculate(&probabilities, &targets);
            metrics.insert("n_train".to_string(), split.train.len() as f64);
            metrics.insert("n_purged".to_string(), split.purged as f64);
            metrics.insert("n_test".to_string(), split.test.len() as f64);
            metrics.insert(
                "trained".to_string(),
                if state.reliability().is_trained() { 1.0 } else { 0.0 },
            );

            log::info!(
                "Window {} train [{}, {}) test [{}, {}): {} train ({} purged), {} test, auc {}",
                window.window_id,
                window.train_start,
                window.train_end,
                window.test_start,
                window.test_end,
                split.train.len(),
                split.purged,
                split.test.len(),
                metrics
                    .get("roc_auc")
                    .map_or_else(|| "n/a".to_string(), |auc| format!("{:.3}", auc))
            );

            results.push(WindowResult {
                window: *window,
                state: Arc::new(state),
                metrics,
            });
        }

        let per_window: Vec<HashMap<String, f64>> = results.iter().map(|w| w.metrics.clone()).collect();
        Ok(WalkForwardReport {
            aggregate: aggregate_metrics(&per_window),
            windows: results,
            cancelled,
        })
    }

    /// Production model on the trailing `train_size` bars.
    pub fn fit_latest(&self, samples: &[MetaSample]) -> Result<MetaModelState> {
        self.check_samples(samples)?;

        let train: Vec<&MetaSample> = match samples.last() {
            Some(last) => {
                let start = (last.index + 1).saturating_sub(self.config.train_size);
                samples.iter().filter(|s| s.index >= start).collect()
            }
            None => Vec::new(),
        };

        MetaModelState::fit(
            self.factory.as_ref(),
            &train,
            &self.feature_names,
            &self.config,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::labeling::BarrierLabel;
    use crate::ml::models::{BaggedTreesFactory, Reliability};
    use crate::types::Direction;

    fn config() -> MetaModelConfig {
        MetaModelConfig {
            estimator_count: 10,
            train_size: 60,
            test_size: 20,
            step_size: 20,
            embargo_size: 3,
            min_train_samples: 20,
            ..Default::default()
        }
    }

    fn samples(n: usize) -> Vec<MetaSample> {
        (0..n)
            .map(|i| {
                let x = ((i * 37) % 100) as f64;
                let target = u8::from(x >= 50.0);
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
                    exit_index: i + 4,
                    features: vec![x],
                }
            })
            .collect()
    }

    fn trainer() -> WalkForwardTrainer {
        let config = config();
        let factory = Arc::new(BaggedTreesFactory::from_config(&config));
        WalkForwardTrainer::new(config, factory, vec!["x".to_string()]).unwrap()
    }

    #[test]
    fn test_fit_reports_each_window() {
        let report = trainer().fit(&samples(200), None).unwrap();
        assert_eq!(report.windows.len(), 6);
        assert!(!report.cancelled);
        for result in &report.windows {
            assert_eq!(result.metrics["n_test"], 20.0);
            assert_eq!(result.metrics["n_purged"], 4.0);
            assert!(result.metrics["roc_auc"] > 0.9);
            assert_eq!(result.state.window_id(), Some(result.window.window_id));
        }
        assert!(report.aggregate.contains_key("roc_auc_mean"));
    }

    #[test]
    fn test_cancel_before_first_window() {
        let flag = AtomicBool::new(true);
        let report = trainer().fit(&samples(200), Some(&flag)).unwrap();
        assert!(report.cancelled);
        assert!(report.windows.is_empty());
    }

    #[test]
    fn test_too_few_samples_is_not_an_error() {
        let report = trainer().fit(&samples(50), None).unwrap();
        assert!(report.windows.is_empty());
        let state = trainer().fit_latest(&samples(10)).unwrap();
        assert_eq!(state.reliability(), Reliability::InsufficientData);
    }

    #[test]
    fn test_fit_latest_uses_trailing_window() {
        let state = trainer().fit_latest(&samples(200)).unwrap();
        assert_eq!(state.reliability(), Reliability::Trained);
        assert_eq!(state.n_train_samples(), 60);
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let mut data = samples(100);
        data[5].features.push(1.0);
        assert!(trainer().fit(&data, None).is_err());
    }
}
