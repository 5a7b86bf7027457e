use crate::config::BocdConfig;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Normal-Inverse-Gamma posterior for one run-length hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Observations absorbed since the prior.
    pub count: usize,
    pub mean: f64,      // mu
    pub precision: f64, // kappa
    pub shape: f64,     // alpha
    pub scale: f64,     // beta
}

impl RunStatistics {
    pub fn prior(config: &BocdConfig) -> Self {
        Self {
            count: 0,
            mean: config.prior_mean,
            precision: config.prior_precision,
            shape: config.prior_shape,
            scale: config.prior_scale,
        }
    }

    /// Conjugate update with one observation.
    pub fn update(&self, x: f64) -> Self {
        let precision = self.precision + 1.0;
        let delta = x - self.mean;
        Self {
            count: self.count + 1,
            mean: (self.precision * self.mean + x) / precision,
            precision,
            shape: self.shape + 0.5,
            scale: self.scale + self.precision * delta * delta / (2.0 * precision),
        }
    }

    /// Log density of `x` under the Student-t posterior predictive.
    ///
    /// `df = 2 alpha`, `scale^2 = beta (kappa + 1) / (alpha kappa)`.
    pub fn log_predictive(&self, x: f64) -> f64 {
        let df = 2.0 * self.shape;
        let scale = (self.scale * (self.precision + 1.0) / (self.shape * self.precision)).sqrt();
        let z = (x - self.mean) / scale;

        libm::lgamma((df + 1.0) / 2.0)
            - libm::lgamma(df / 2.0)
            - 0.5 * (df * PI).ln()
            - scale.ln()
            - (df + 1.0) / 2.0 * (z * z / df).ln_1p()
    }
}

/// Complete detector state; restoring it reproduces all later outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BocdState {
    pub hazard_rate: f64,
    /// `ln P(r_t = r | x_1..t)` for `r = 0..len`; the last slot is the tail
    /// bucket once `max_run_length` is reached.
    pub log_posterior: Vec<f64>,
    /// Sufficient statistics aligned with `log_posterior`.
    pub stats: Vec<RunStatistics>,
    pub observations: usize,
    /// Result of the most recent `update`.
    pub last_probability: Option<f64>,
    /// Whether `last_probability` was at or above the detection threshold.
    pub in_alarm: bool,
}

impl BocdState {
    pub fn new(config: &BocdConfig) -> Self {
        Self {
            hazard_rate: config.hazard_rate,
            log_posterior: vec![0.0],
            stats: vec![RunStatistics::prior(config)],
            observations: 0,
            last_probability: None,
            in_alarm: false,
        }
    }

    pub fn posterior(&self) -> Vec<f64> {
        self.log_posterior.iter().map(|lp| lp.exp()).collect()
    }
}

pub(crate) fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}

pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjugate_update() {
        let prior = RunStatistics::prior(&BocdConfig::default());
        let post = prior.update(2.0);
        assert_eq!(post.count, 1);
        assert_eq!(post.precision, 2.0);
        assert_eq!(post.mean, 1.0);
        assert_eq!(post.shape, 1.5);
        // beta + kappa (x - mu)^2 / (2 kappa') = 1 + 4 / 4
        assert_eq!(post.scale, 2.0);
    }

    #[test]
    fn test_predictive_is_a_density() {
        let prior = RunStatistics::prior(&BocdConfig::default());
        // crude Riemann sum over a wide grid
        let step = 0.01;
        let mass: f64 = (-20000..20000)
            .map(|i| (prior.log_predictive(i as f64 * step)).exp() * step)
            .sum();
        assert!((mass - 1.0).abs() < 0.01);
        assert!(prior.log_predictive(0.0) > prior.log_predictive(3.0));
    }

    #[test]
    fn test_log_helpers() {
        assert!((log_add(0.0, 0.0) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(log_add(f64::NEG_INFINITY, -1.0), -1.0);
        assert!((log_sum_exp(&[1f64.ln(), 3f64.ln()]) - 4f64.ln()).abs() < 1e-12);
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }
}
