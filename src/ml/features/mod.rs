pub mod engineer;

pub use engineer::CausalFeatureEngineer;

use crate::error::{MetalabelError, Result};
use crate::types::PricePoint;

/// Market data visible to a feature extractor.
///
/// All series are aligned 1:1 with `prices`.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub prices: &'a [PricePoint],
    /// Causal volatility estimate per bar (same series the labeler uses).
    pub volatility: &'a [f64],
    pub volume: Option<&'a [f64]>,
    pub regime: Option<&'a [f64]>,
}

impl<'a> MarketContext<'a> {
    pub fn new(prices: &'a [PricePoint], volatility: &'a [f64]) -> Result<Self> {
        MetalabelError::ensure_same_len("prices", prices.len(), "volatility", volatility.len())?;
        Ok(Self {
            prices,
            volatility,
            volume: None,
            regime: None,
        })
    }

    pub fn with_volume(mut self, volume: &'a [f64]) -> Result<Self> {
        MetalabelError::ensure_same_len("prices", self.prices.len(), "volume", volume.len())?;
        self.volume = Some(volume);
        Ok(self)
    }

    pub fn with_regime(mut self, regime: &'a [f64]) -> Result<Self> {
        MetalabelError::ensure_same_len("prices", self.prices.len(), "regime", regime.len())?;
        self.regime = Some(regime);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// View containing only bars `0..=index`.
    pub fn up_to(&self, index: usize) -> Result<MarketContext<'a>> {
        if index >= self.prices.len() {
            return Err(MetalabelError::Validation(format!(
                "feature index {} outside series of {} bars",
                index,
                self.prices.len()
            )));
        }
        let end = index + 1;
        Ok(MarketContext {
            prices: &self.prices[..end],
            volatility: &self.volatility[..end],
            volume: self.volume.map(|v| &v[..end]),
            regime: self.regime.map(|r| &r[..end]),
        })
    }
}

/// Pluggable feature computation for meta-samples.
///
/// Implementations receive a context already truncated to the sample's bar,
/// so the last element of every series is the current bar.
pub trait FeatureExtractor: Send + Sync {
    /// Column names, in the order `extract` produces values.
    fn feature_names(&self) -> Vec<String>;

    fn extract(&self, context: &MarketContext<'_>) -> Result<Vec<f64>>;

    /// Features for bar `index` computed from data at indices `<= index` only.
    fn extract_at(&self, context: &MarketContext<'_>, index: usize) -> Result<Vec<f64>> {
        let visible = context.up_to(index)?;
        let features = self.extract(&visible)?;
        if features.len() != self.feature_names().len() {
            return Err(MetalabelError::Computation(format!(
                "extractor produced {} features, declared {}",
                features.len(),
                self.feature_names().len()
            )));
        }
        Ok(features)
    }
}
