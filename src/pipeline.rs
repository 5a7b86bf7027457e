use crate::config::AppConfig;
use crate::data::BarSeries;
use crate::engines::validation::{WalkForwardTrainer, WalkForwardWindow};
use crate::error::{MetalabelError, Result};
use crate::ml::features::{CausalFeatureEngineer, FeatureExtractor, MarketContext};
use crate::ml::labeling::{LabelStats, LabelingStatus, TripleBarrierLabeler};
use crate::ml::models::{BaggedTreesFactory, MetaModel, MetaPrediction};
use crate::ml::signals::{MetaLabelGenerator, MetaSample};
use crate::regime::{Changepoint, ChangepointDetector};
use crate::sizing::{IntegratedSizeResult, IntegratedSizer, SizingInputs};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub window: WalkForwardWindow,
    pub metrics: HashMap<String, f64>,
}

/// Everything one offline pass over a bar series produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub bars: usize,
    pub labeling_status: LabelingStatus,
    pub events: usize,
    pub skipped_entries: usize,
    pub label_stats: LabelStats,
    pub samples: usize,
    pub feature_names: Vec<String>,
    pub windows: Vec<WindowSummary>,
    pub aggregate: HashMap<String, f64>,
    pub feature_importances: Option<Vec<(String, f64)>>,
    pub changepoints: Vec<Changepoint>,
    pub last_changepoint_probability: Option<f64>,
    pub last_prediction: MetaPrediction,
    pub last_size: IntegratedSizeResult,
}

/// Label, build meta-samples, walk-forward fit, monitor regime, and size
/// the final bar.
pub fn run(config: &AppConfig, bars: &BarSeries, cancel: Option<&AtomicBool>) -> Result<PipelineSummary> {
    config.validate()?;
    if bars.is_empty() {
        return Err(MetalabelError::DataLoading("bar series is empty".to_string()));
    }

    let volatility = bars.volatility_or_atr(config.labeling.volatility_window);

    let labeler = TripleBarrierLabeler::new(config.labeling.clone())?;
    let labels = labeler.label(&bars.prices, &volatility, &bars.signals)?;
    let label_stats = LabelStats::from_events(&labels.events);
    log::info!(
        "Labeled {} events: {:.1}% take-profit, {:.1}% stop-loss, {:.1}% timeout",
        label_stats.total_count,
        label_stats.profit_pct,
        label_stats.loss_pct,
        label_stats.timeout_pct
    );

    let mut context = MarketContext::new(&bars.prices, &volatility)?;
    if config.features.include_volume {
        let volume = bars.volume.as_deref().ok_or_else(|| {
            MetalabelError::Configuration("features.include_volume needs a volume column".to_string())
        })?;
        context = context.with_volume(volume)?;
    }
    if config.features.include_regime {
        let regime = bars.regime_weight.as_deref().ok_or_else(|| {
            MetalabelError::Configuration("features.include_regime needs a regime_weight column".to_string())
        })?;
        context = context.with_regime(regime)?;
    }

    let generator = MetaLabelGenerator::new(Box::new(CausalFeatureEngineer::new(
        config.features.clone(),
    )?));
    let feature_names = generator.feature_names();
    let samples: Vec<MetaSample> = generator.build_meta_samples(&labels.events, &context)?;

    let factory = Arc::new(BaggedTreesFactory::from_config(&config.meta_model));
    let trainer = WalkForwardTrainer::new(config.meta_model.clone(), factory, feature_names.clone())?;
    let model = MetaModel::new(feature_names.clone(), config.meta_model.neutral_probability);
    let report = model.refit(&trainer, &samples, cancel)?;

    let mut detector = ChangepointDetector::new(config.bocd.clone())?;
    let mut changepoints = Vec::new();
    for pair in bars.prices.windows(2) {
        let ret = if pair[0].close > 0.0 && pair[1].close > 0.0 {
            (pair[1].close / pair[0].close).ln()
        } else {
            0.0
        };
        if let Some(cp) = detector.observe(ret)? {
            if cp.triggers_refit {
                changepoints.push(cp);
            }
        }
    }

    let last = bars.len() - 1;
    let features = generator.extractor().extract_at(&context, last)?;
    let last_prediction = model.predict(&features)?;

    let mut inputs = SizingInputs::from_signal(bars.signals[last]).with_meta_prediction(&last_prediction);
    if let Some(weight) = bars.regime_weight.as_ref().map(|w| w[last]) {
        inputs = inputs.with_regime_weight(weight);
    }
    if let Some(toxicity) = bars.toxicity.as_ref().map(|t| t[last]) {
        inputs = inputs.with_toxicity(toxicity);
    }
    let sizer = IntegratedSizer::new(config.sizing.clone())?;
    let last_size = sizer.calculate(&inputs);

    Ok(PipelineSummary {
        bars: bars.len(),
        labeling_status: labels.status,
        events: labels.events.len(),
        skipped_entries: labels.skipped.len(),
        label_stats,
        samples: samples.len(),
        feature_names,
        windows: report
            .windows
            .iter()
            .map(|w| WindowSummary {
                window: w.window,
                metrics: w.metrics.clone(),
            })
            .collect(),
        aggregate: report.aggregate,
        feature_importances: model.current().feature_importances(),
        changepoints,
        last_changepoint_probability: detector.last_probability(),
        last_prediction,
        last_size,
    })
}
