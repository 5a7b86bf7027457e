//! Bayesian Online Changepoint Detection (Adams & MacKay, 2007).
//!
//! Tracks a posterior over run length (observations since the last regime
//! change) under a Normal-Inverse-Gamma model with constant hazard. All
//! probability arithmetic is done in log space.
//!
//! With a constant hazard the normalised mass on run length 0 equals the
//! hazard rate after every step, so it cannot signal anything. The reported
//! changepoint probability is instead the posterior mass on run lengths
//! `0..=changepoint_window`: the probability that the current regime began
//! within the last few observations.

use super::state::{log_add, log_sum_exp, BocdState, RunStatistics};
use crate::config::{BocdConfig, ConfigSection};
use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};

/// Upward crossing of the detection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Changepoint {
    /// Zero-based observation index.
    pub index: usize,
    pub probability: f64,
    /// Most likely run length just before this observation.
    pub run_length_before: usize,
    /// False during warm-up, where high probabilities are an artefact of
    /// having no history.
    pub triggers_refit: bool,
}

/// Online detector. Not safe for concurrent `update` calls; callers
/// serialize access.
#[derive(Debug, Clone)]
pub struct ChangepointDetector {
    config: BocdConfig,
    prior: RunStatistics,
    state: BocdState,
}

impl ChangepointDetector {
    pub fn new(config: BocdConfig) -> Result<Self> {
        config.validate()?;
        let state = BocdState::new(&config);
        Ok(Self {
            prior: RunStatistics::prior(&config),
            config,
            state,
        })
    }

    /// Resumes from a checkpoint taken with [`state`](Self::state).
    pub fn from_state(config: BocdConfig, state: BocdState) -> Result<Self> {
        config.validate()?;
        if state.hazard_rate != config.hazard_rate {
            return Err(MetalabelError::Validation(format!(
                "state hazard rate {} differs from configured {}",
                state.hazard_rate, config.hazard_rate
            )));
        }
        MetalabelError::ensure_same_len(
            "log_posterior",
            state.log_posterior.len(),
            "stats",
            state.stats.len(),
        )?;
        if state.log_posterior.is_empty() || state.log_posterior.len() > config.max_run_length + 1 {
            return Err(MetalabelError::Validation(format!(
                "state tracks {} run lengths, expected 1..={}",
                state.log_posterior.len(),
                config.max_run_length + 1
            )));
        }
        Ok(Self {
            prior: RunStatistics::prior(&config),
            config,
            state,
        })
    }

    pub fn config(&self) -> &BocdConfig {
        &self.config
    }

    pub fn state(&self) -> &BocdState {
        &self.state
    }

    /// Absorbs one observation and returns the changepoint probability.
    ///
    /// The first observation after construction or `reset` returns exactly
    /// 1.0. Non-finite observations are rejected and leave the state intact.
    pub fn update(&mut self, observation: f64) -> Result<f64> {
        if !observation.is_finite() {
            return Err(MetalabelError::Validation(format!(
                "changepoint detector received non-finite observation {}",
                observation
            )));
        }

        let max_rl = self.config.max_run_length;
        let hazard = self.state.hazard_rate;
        let log_hazard = hazard.ln();
        let log_growth = (-hazard).ln_1p();

        let n = self.state.log_posterior.len();

        // Step 1: joint of prior run length and predictive of the observation
        let joint: Vec<f64> = self
            .state
            .log_posterior
            .iter()
            .zip(&self.state.stats)
            .map(|(lp, stats)| lp + stats.log_predictive(observation))
            .collect();

        let new_len = (n + 1).min(max_rl + 1);
        let mut new_log = vec![f64::NEG_INFINITY; new_len];
        let mut new_stats = vec![self.prior; new_len];

        // Step 2: growth mass shifts r -> r + 1; the tail bucket absorbs overflow
        for (r, joint_r) in joint.iter().enumerate() {
            let growth = joint_r + log_growth;
            let updated = self.state.stats[r].update(observation);
            let target = (r + 1).min(max_rl);
            if target == r {
                if growth > new_log[target] {
                    new_stats[target] = updated;
                }
                new_log[target] = log_add(new_log[target], growth);
            } else {
                new_log[target] = growth;
                new_stats[target] = updated;
            }
        }

        // Step 3: changepoint mass restarts at run length 0 with the prior
        new_log[0] = log_hazard + log_sum_exp(&joint);

        // Step 4: normalise
        let total = log_sum_exp(&new_log);
        if total.is_finite() {
            new_log.iter_mut().for_each(|v| *v -= total);
        } else {
            log::warn!("Run-length posterior degenerated; resetting to uniform");
            let uniform = -(new_len as f64).ln();
            new_log.iter_mut().for_each(|v| *v = uniform);
        }

        let run_length_before = self.most_likely_run_length();
        self.state.log_posterior = new_log;
        self.state.stats = new_stats;

        let probability = if self.state.observations == 0 {
            1.0
        } else {
            self.window_mass()
        };
        self.state.observations += 1;
        self.state.last_probability = Some(probability);

        log::trace!(
            "BOCD obs {} -> p={:.4} (run length before {})",
            self.state.observations,
            probability,
            run_length_before
        );

        Ok(probability)
    }

    fn window_mass(&self) -> f64 {
        let end = (self.config.changepoint_window + 1).min(self.state.log_posterior.len());
        self.state.log_posterior[..end]
            .iter()
            .map(|lp| lp.exp())
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// Updates and reports an upward crossing of `detection_threshold`.
    pub fn observe(&mut self, observation: f64) -> Result<Option<Changepoint>> {
        let run_length_before = self.most_likely_run_length();
        let probability = self.update(observation)?;

        let above = probability >= self.config.detection_threshold;
        let crossed = above && !self.state.in_alarm;
        self.state.in_alarm = above;

        if !crossed {
            return Ok(None);
        }

        let changepoint = Changepoint {
            index: self.state.observations - 1,
            probability,
            run_length_before,
            triggers_refit: self.is_warmed_up(),
        };
        if changepoint.triggers_refit {
            log::info!(
                "Changepoint at observation {} (p={:.3}, previous run length {})",
                changepoint.index,
                probability,
                run_length_before
            );
        } else {
            log::debug!("Ignoring warm-up changepoint at observation {}", changepoint.index);
        }
        Ok(Some(changepoint))
    }

    /// Compares the last `update` result against `threshold`; no mutation.
    pub fn is_changepoint(&self, threshold: f64) -> bool {
        self.state
            .last_probability
            .is_some_and(|p| p >= threshold)
    }

    pub fn last_probability(&self) -> Option<f64> {
        self.state.last_probability
    }

    /// Back to the prior, as if freshly constructed.
    pub fn reset(&mut self) {
        self.state = BocdState::new(&self.config);
    }

    pub fn run_length_posterior(&self) -> Vec<f64> {
        self.state.posterior()
    }

    pub fn most_likely_run_length(&self) -> usize {
        self.state
            .log_posterior
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(r, _)| r)
    }

    pub fn expected_run_length(&self) -> f64 {
        self.state
            .log_posterior
            .iter()
            .enumerate()
            .map(|(r, lp)| r as f64 * lp.exp())
            .sum()
    }

    pub fn observation_count(&self) -> usize {
        self.state.observations
    }

    pub fn is_warmed_up(&self) -> bool {
        self.state.observations > self.config.warmup_observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ChangepointDetector {
        ChangepointDetector::new(BocdConfig::default()).unwrap()
    }

    #[test]
    fn test_first_observation_is_certain_changepoint() {
        let mut bocd = detector();
        assert!(!bocd.is_changepoint(0.8));
        assert_eq!(bocd.update(0.3).unwrap(), 1.0);
        assert!(bocd.is_changepoint(0.8));
    }

    #[test]
    fn test_zero_window_reports_raw_run_length_zero() {
        let mut bocd = ChangepointDetector::new(BocdConfig {
            changepoint_window: 0,
            ..Default::default()
        })
        .unwrap();
        bocd.update(0.0).unwrap();
        let p = bocd.update(0.1).unwrap();
        // constant hazard: normalised r=0 mass is the hazard itself
        assert!((p - 1.0 / 250.0).abs() < 1e-12);
    }

    #[test]
    fn test_posterior_sums_to_one() {
        let mut bocd = detector();
        for i in 0..50 {
            bocd.update((i as f64 * 0.37).sin()).unwrap();
            let total: f64 = bocd.run_length_posterior().iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_memory_is_bounded() {
        let mut bocd = ChangepointDetector::new(BocdConfig {
            max_run_length: 20,
            changepoint_window: 3,
            ..Default::default()
        })
        .unwrap();
        for i in 0..100 {
            bocd.update((i % 7) as f64 * 0.1).unwrap();
        }
        assert_eq!(bocd.run_length_posterior().len(), 21);
        assert_eq!(bocd.state().stats.len(), 21);
        let total: f64 = bocd.run_length_posterior().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_observation_is_rejected() {
        let mut bocd = detector();
        bocd.update(0.1).unwrap();
        let before = bocd.state().clone();
        assert!(bocd.update(f64::NAN).is_err());
        assert!(bocd.update(f64::INFINITY).is_err());
        assert_eq!(bocd.state(), &before);
    }

    #[test]
    fn test_reset_restores_prior() {
        let mut bocd = detector();
        for x in [0.1, -0.2, 0.3] {
            bocd.update(x).unwrap();
        }
        bocd.reset();
        assert_eq!(bocd.observation_count(), 0);
        assert_eq!(bocd.run_length_posterior(), vec![1.0]);
        assert_eq!(bocd.update(0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_warmup_crossing_does_not_trigger_refit() {
        let mut bocd = detector();
        let first = bocd.observe(0.0).unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert!(!first.triggers_refit);
    }

    #[test]
    fn test_inconsistent_state_is_rejected() {
        let mut state = BocdState::new(&BocdConfig::default());
        state.stats.clear();
        assert!(ChangepointDetector::from_state(BocdConfig::default(), state).is_err());
    }
}
