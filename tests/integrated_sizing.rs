use metalabel::config::IntegratedSizingConfig;
use metalabel::sizing::{IntegratedSizer, SizingInput, SizingInputs};
use proptest::prelude::*;

fn sizer() -> IntegratedSizer {
    IntegratedSizer::new(IntegratedSizingConfig::default()).unwrap()
}

#[test]
fn test_documented_example() {
    let result = sizer().calculate(&SizingInputs {
        signal_direction: 1,
        signal_magnitude: 0.8,
        meta_confidence: Some(0.75),
        regime_weight: Some(1.0),
        toxicity: Some(0.2),
    });
    assert!((result.final_size - 0.268).abs() < 1e-3);
    assert!((result.factors.product() - result.raw_size).abs() < 1e-15);
}

#[test]
fn test_full_toxicity_means_no_trade() {
    let result = sizer().calculate(
        &SizingInputs::new(1, 1.0)
            .with_meta_confidence(1.0)
            .with_toxicity(1.0),
    );
    assert!(result.is_flat());
    assert!(result.defaults_applied.contains(&SizingInput::RegimeWeight));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = IntegratedSizingConfig {
        fractional_kelly: 1.5,
        ..Default::default()
    };
    assert!(IntegratedSizer::new(config).is_err());
}

proptest! {
    #[test]
    fn prop_size_is_bounded(
        direction in -3i8..=3,
        magnitude in -2.0f64..5.0,
        meta in proptest::option::of(-1.0f64..2.0),
        regime in proptest::option::of(-1.0f64..3.0),
        toxicity in proptest::option::of(-1.0f64..2.0),
    ) {
        let config = IntegratedSizingConfig::default();
        let result = sizer().calculate(&SizingInputs {
            signal_direction: direction,
            signal_magnitude: magnitude,
            meta_confidence: meta,
            regime_weight: regime,
            toxicity,
        });

        prop_assert!(result.final_size.is_finite());
        prop_assert!(result.final_size.abs() <= config.max_size);
        prop_assert!(result.final_size == 0.0 || result.final_size.abs() >= config.min_size);
        match result.direction {
            0 => prop_assert_eq!(result.final_size, 0.0),
            d => prop_assert_eq!(result.final_size.signum(), d as f64),
        }
        if direction == 0 {
            prop_assert_eq!(result.final_size, 0.0);
        }
    }

    #[test]
    fn prop_size_grows_with_confidence_and_shrinks_with_toxicity(
        magnitude in 0.0f64..2.0,
        low in 0.0f64..1.0,
        high in 0.0f64..1.0,
        regime in 0.0f64..2.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let sizer = sizer();
        let at = |meta: f64, toxicity: f64| {
            sizer
                .calculate(
                    &SizingInputs::new(1, magnitude)
                        .with_meta_confidence(meta)
                        .with_regime_weight(regime)
                        .with_toxicity(toxicity),
                )
                .final_size
        };

        prop_assert!(at(low, 0.1) <= at(high, 0.1));
        prop_assert!(at(0.7, high) <= at(0.7, low));
    }
}
