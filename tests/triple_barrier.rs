mod common;

use common::{flat_bars, periodic_signals, random_walk};
use metalabel::config::{BarrierConfig, TieBreak};
use metalabel::data::causal_atr;
use metalabel::ml::labeling::{BarrierLabel, LabelingStatus, SkipReason, TripleBarrierLabeler};
use metalabel::ml::signals::meta_target;
use metalabel::types::PricePoint;
use proptest::prelude::*;

fn labeler(max_holding_bars: usize) -> TripleBarrierLabeler {
    TripleBarrierLabeler::new(BarrierConfig {
        profit_multiple: 2.0,
        loss_multiple: 1.0,
        max_holding_bars,
        volatility_window: 2,
        ..Default::default()
    })
    .unwrap()
}

fn long_at_zero(n: usize) -> Vec<f64> {
    let mut signals = vec![0.0; n];
    signals[0] = 1.0;
    signals
}

#[test]
fn test_profit_barrier_touched_first() {
    let prices = flat_bars(&[100.0, 101.0, 103.0, 99.0, 98.0]);
    let labels = labeler(10).label(&prices, &[1.0; 5], &long_at_zero(5)).unwrap();

    assert_eq!(labels.events.len(), 1);
    let event = &labels.events[0];
    assert_eq!(event.profit_level, 102.0);
    assert_eq!(event.loss_level, 99.0);
    assert_eq!(event.label, BarrierLabel::TakeProfit);
    assert_eq!(event.exit_index, 2);
    assert_eq!(event.exit_price, 102.0);
    assert!((event.realized_return() - 0.02).abs() < 1e-12);
}

#[test]
fn test_loss_barrier_touched_first() {
    let prices = flat_bars(&[100.0, 99.0, 98.0, 97.0, 96.0]);
    let labels = labeler(10).label(&prices, &[1.0; 5], &long_at_zero(5)).unwrap();

    let event = &labels.events[0];
    assert_eq!(event.label, BarrierLabel::StopLoss);
    assert_eq!(event.exit_index, 1);
    assert_eq!(event.exit_price, 99.0);
}

#[test]
fn test_flat_prices_time_out() {
    let prices = flat_bars(&[100.0; 8]);
    let labels = labeler(3).label(&prices, &[1.0; 8], &long_at_zero(8)).unwrap();

    let event = &labels.events[0];
    assert_eq!(event.label, BarrierLabel::Timeout);
    assert_eq!(event.exit_index, 3);
    assert_eq!(event.timeout_index, 3);
    assert!(!event.truncated);
    assert_eq!(event.realized_return(), 0.0);
    assert_eq!(meta_target(event.label, event.realized_return()), 0);
}

#[test]
fn test_short_barriers_mirror() {
    let prices = flat_bars(&[100.0, 99.5, 97.0, 101.0]);
    let mut signals = vec![0.0; 4];
    signals[0] = -1.0;
    let labels = labeler(10).label(&prices, &[1.0; 4], &signals).unwrap();

    let event = &labels.events[0];
    assert_eq!(event.profit_level, 98.0);
    assert_eq!(event.loss_level, 101.0);
    assert_eq!(event.label, BarrierLabel::TakeProfit);
    assert_eq!(event.exit_index, 2);
    assert!(event.realized_return() > 0.0);
}

#[test]
fn test_tie_break_on_wide_bar() {
    let mut prices = flat_bars(&[100.0, 100.0, 100.0]);
    prices[1] = PricePoint::new(1, 100.0, 105.0, 95.0, 100.0, prices[1].timestamp);

    let stop_first = labeler(5).label(&prices, &[1.0; 3], &long_at_zero(3)).unwrap();
    assert_eq!(stop_first.events[0].label, BarrierLabel::StopLoss);

    let profit_first = TripleBarrierLabeler::new(BarrierConfig {
        tie_break: TieBreak::TakeProfit,
        volatility_window: 2,
        ..Default::default()
    })
    .unwrap()
    .label(&prices, &[1.0; 3], &long_at_zero(3))
    .unwrap();
    assert_eq!(profit_first.events[0].label, BarrierLabel::TakeProfit);
}

#[test]
fn test_skips_are_reported() {
    let prices = flat_bars(&[100.0, 100.5, 101.0, 100.0]);
    let volatility = [f64::NAN, 1.0, 0.0, 1.0];
    let signals = [1.0, 1.0, -1.0, 1.0];
    let labels = labeler(5).label(&prices, &volatility, &signals).unwrap();

    assert_eq!(labels.events.len(), 1);
    assert_eq!(labels.events[0].entry_index, 1);
    assert!(labels.events[0].truncated);

    let reasons: Vec<(usize, SkipReason)> = labels.skipped.iter().map(|s| (s.index, s.reason)).collect();
    assert_eq!(
        reasons,
        vec![
            (0, SkipReason::InvalidVolatility),
            (2, SkipReason::InvalidVolatility),
            (3, SkipReason::NoForwardBars),
        ]
    );
}

#[test]
fn test_short_series_is_insufficient() {
    let prices = flat_bars(&[100.0; 5]);
    let labels = TripleBarrierLabeler::new(BarrierConfig::default())
        .unwrap()
        .label(&prices, &[1.0; 5], &[1.0; 5])
        .unwrap();
    assert!(labels.events.is_empty());
    assert_eq!(
        labels.status,
        LabelingStatus::InsufficientData {
            required: 14,
            available: 5
        }
    );
}

#[test]
fn test_rejects_misaligned_and_unordered_input() {
    let prices = flat_bars(&[100.0; 4]);
    assert!(labeler(3).label(&prices, &[1.0; 3], &[0.0; 4]).is_err());

    let mut shuffled = prices.clone();
    shuffled.swap(1, 2);
    assert!(labeler(3).label(&shuffled, &[1.0; 4], &[0.0; 4]).is_err());

    assert!(labeler(3).label(&prices, &[1.0; 4], &[0.0, f64::NAN, 0.0, 0.0]).is_err());
}

#[test]
fn test_labeling_is_deterministic() {
    let prices = random_walk(300, 11);
    let volatility = causal_atr(&prices, 14);
    let signals = periodic_signals(300, 4);
    let labeler = TripleBarrierLabeler::new(BarrierConfig::default()).unwrap();

    let first = labeler.label(&prices, &volatility, &signals).unwrap();
    let second = labeler.label(&prices, &volatility, &signals).unwrap();
    assert_eq!(first, second);
    assert!(!first.events.is_empty());
}

proptest! {
    #[test]
    fn prop_events_stay_inside_their_barriers(
        seed in 0u64..1_000,
        every in 1usize..6,
        max_holding_bars in 1usize..20,
        profit_multiple in 0.5f64..3.0,
        loss_multiple in 0.5f64..3.0,
    ) {
        let n = 120;
        let prices = random_walk(n, seed);
        let volatility = causal_atr(&prices, 5);
        let signals = periodic_signals(n, every);
        let labeler = TripleBarrierLabeler::new(BarrierConfig {
            profit_multiple,
            loss_multiple,
            max_holding_bars,
            volatility_window: 5,
            ..Default::default()
        })
        .unwrap();

        let labels = labeler.label(&prices, &volatility, &signals).unwrap();

        for pair in labels.events.windows(2) {
            prop_assert!(pair[0].entry_index < pair[1].entry_index);
        }
        for event in &labels.events {
            prop_assert!(event.exit_index > event.entry_index);
            prop_assert!(event.exit_index <= event.timeout_index);
            prop_assert!(event.timeout_index <= event.entry_index + max_holding_bars);
            prop_assert!(event.timeout_index < n);
            match event.label {
                BarrierLabel::TakeProfit => prop_assert_eq!(event.exit_price, event.profit_level),
                BarrierLabel::StopLoss => prop_assert_eq!(event.exit_price, event.loss_level),
                BarrierLabel::Timeout => {
                    prop_assert_eq!(event.exit_index, event.timeout_index);
                    prop_assert_eq!(event.exit_price, prices[event.timeout_index].close);
                }
            }
            // no earlier bar touched either barrier
            for bar in &prices[event.entry_index + 1..event.exit_index] {
                let (profit, loss) = match event.direction {
                    metalabel::types::Direction::Long => (bar.high >= event.profit_level, bar.low <= event.loss_level),
                    metalabel::types::Direction::Short => (bar.low <= event.profit_level, bar.high >= event.loss_level),
                };
                prop_assert!(!profit && !loss);
            }
        }
        prop_assert!(labels.events.iter().all(|e| e.entry_index + 1 < n));
    }
}
