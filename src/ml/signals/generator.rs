use super::types::MetaSample;
use crate::error::{MetalabelError, Result};
use crate::ml::features::{FeatureExtractor, MarketContext};
use crate::ml::labeling::BarrierEvent;
use polars::prelude::*;

/// Turns barrier events into feature-bearing meta-samples.
pub struct MetaLabelGenerator {
    extractor: Box<dyn FeatureExtractor>,
}

impl MetaLabelGenerator {
    pub fn new(extractor: Box<dyn FeatureExtractor>) -> Self {
        Self { extractor }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.extractor.feature_names()
    }

    pub fn extractor(&self) -> &dyn FeatureExtractor {
        self.extractor.as_ref()
    }

    /// One sample per event, in entry order.
    ///
    /// Features for the sample at entry `i` see only bars `<= i`.
    pub fn build_meta_samples(
        &self,
        events: &[BarrierEvent],
        context: &MarketContext<'_>,
    ) -> Result<Vec<MetaSample>> {
        for (position, pair) in events.windows(2).enumerate() {
            if pair[1].entry_index <= pair[0].entry_index {
                return Err(MetalabelError::OutOfOrder {
                    position: position + 1,
                    previous: pair[0].entry_index,
                    current: pair[1].entry_index,
                });
            }
        }

        let samples = events
            .iter()
            .map(|event| {
                let features = self.extractor.extract_at(context, event.entry_index)?;
                Ok(MetaSample::from_event(event, features))
            })
            .collect::<Result<Vec<_>>>()?;

        let positives = samples.iter().filter(|s| s.is_positive()).count();
        log::debug!(
            "Built {} meta-samples ({} positive) with {} features",
            samples.len(),
            positives,
            self.extractor.feature_names().len()
        );

        Ok(samples)
    }
}

/// Flattens samples into a frame, one column per feature.
pub fn samples_to_frame(samples: &[MetaSample], feature_names: &[String]) -> Result<DataFrame> {
    if let Some(bad) = samples.iter().find(|s| s.features.len() != feature_names.len()) {
        return Err(MetalabelError::LengthMismatch {
            left: "feature_names",
            left_len: feature_names.len(),
            right: "features",
            right_len: bad.features.len(),
        });
    }

    let mut columns = vec![
        Column::new(
            "index".into(),
            samples.iter().map(|s| s.index as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "primary_direction".into(),
            samples
                .iter()
                .map(|s| s.primary_direction.as_i8() as i32)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "true_label".into(),
            samples
                .iter()
                .map(|s| s.true_label.value() as i32)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "meta_target".into(),
            samples.iter().map(|s| s.meta_target as u32).collect::<Vec<_>>(),
        ),
        Column::new(
            "realized_return".into(),
            samples.iter().map(|s| s.realized_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "exit_index".into(),
            samples.iter().map(|s| s.exit_index as u64).collect::<Vec<_>>(),
        ),
    ];

    for (col, name) in feature_names.iter().enumerate() {
        columns.push(Column::new(
            name.as_str().into(),
            samples.iter().map(|s| s.features[col]).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}
