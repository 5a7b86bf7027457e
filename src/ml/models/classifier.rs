use crate::error::Result;
use std::fmt::Debug;
use std::sync::Arc;

/// A fitted binary classifier producing P(meta_target = 1).
pub trait MetaClassifier: Send + Sync + Debug {
    /// Probability in [0, 1] for a single feature vector.
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Normalised importances, one per feature, if the model has them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Builds classifiers from training rows.
///
/// `features` rows all share one width; `targets` holds 0/1 and is aligned
/// with `features`. Callers guarantee both classes are present.
pub trait ClassifierFactory: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&self, features: &[Vec<f64>], targets: &[u8]) -> Result<Arc<dyn MetaClassifier>>;
}
