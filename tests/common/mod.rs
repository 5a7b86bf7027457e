#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use metalabel::ml::labeling::BarrierLabel;
use metalabel::ml::signals::MetaSample;
use metalabel::types::{Direction, PricePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn ts(i: usize) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(i as i64)
}

/// Bars whose open/high/low equal the close.
pub fn flat_bars(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::flat(i, c, ts(i)))
        .collect()
}

/// Standard normal draw via Box-Muller.
pub fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Geometric random walk with intrabar range around open and close.
pub fn random_walk(n: usize, seed: u64) -> Vec<PricePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 100.0;
    (0..n)
        .map(|i| {
            let open = close;
            close = open * (1.0 + 0.01 * gaussian(&mut rng));
            let high = open.max(close) * (1.0 + 0.003 * rng.gen::<f64>());
            let low = open.min(close) * (1.0 - 0.003 * rng.gen::<f64>());
            PricePoint::new(i, open, high, low, close, ts(i))
        })
        .collect()
}

/// +1/-1 on every `every`-th bar, alternating, 0 elsewhere.
pub fn periodic_signals(n: usize, every: usize) -> Vec<f64> {
    (0..n)
        .map(|i| match (i % every, (i / every) % 2) {
            (0, 0) => 1.0,
            (0, _) => -1.0,
            _ => 0.0,
        })
        .collect()
}

pub fn sample(index: usize, exit_index: usize, target: u8, features: Vec<f64>) -> MetaSample {
    MetaSample {
        index,
        primary_direction: Direction::Long,
        true_label: if target == 1 {
            BarrierLabel::TakeProfit
        } else {
            BarrierLabel::StopLoss
        },
        meta_target: target,
        realized_return: if target == 1 { 0.01 } else { -0.01 },
        exit_index,
        features,
    }
}
