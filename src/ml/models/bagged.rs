use super::classifier::{ClassifierFactory, MetaClassifier};
use super::tree::{DecisionTree, TreeParams};
use crate::config::MetaModelConfig;
use crate::error::{MetalabelError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bootstrap-aggregated shallow trees; the probability is the mean leaf rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaggedTrees {
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl BaggedTrees {
    /// Trees are built in parallel; tree `t` draws from `seed + t`, so the
    /// ensemble is reproducible regardless of thread scheduling.
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[u8],
        estimator_count: usize,
        params: &TreeParams,
        seed: u64,
    ) -> Result<Self> {
        MetalabelError::ensure_same_len("features", features.len(), "targets", targets.len())?;
        if features.is_empty() {
            return Err(MetalabelError::Validation(
                "cannot fit an ensemble on zero rows".to_string(),
            ));
        }
        let width = features[0].len();
        if let Some(bad) = features.iter().find(|row| row.len() != width) {
            return Err(MetalabelError::LengthMismatch {
                left: "first row",
                left_len: width,
                right: "row",
                right_len: bad.len(),
            });
        }

        let n = features.len();
        let trees: Vec<DecisionTree> = (0..estimator_count)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(features, targets, &rows, params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; width];
        for tree in &trees {
            for (total, decrease) in importances.iter_mut().zip(tree.impurity_decrease()) {
                *total += decrease;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            importances.iter_mut().for_each(|v| *v /= sum);
        }

        Ok(Self { trees, importances })
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl MetaClassifier for BaggedTrees {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}

/// Fits `BaggedTrees` with hyper-parameters from `MetaModelConfig`.
#[derive(Debug, Clone)]
pub struct BaggedTreesFactory {
    estimator_count: usize,
    max_depth: usize,
    min_samples_leaf: usize,
    min_samples_split: usize,
    max_features: Option<usize>,
    seed: u64,
}

impl BaggedTreesFactory {
    pub fn from_config(config: &MetaModelConfig) -> Self {
        Self {
            estimator_count: config.estimator_count,
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features,
            seed: config.seed,
        }
    }

    fn params_for(&self, n_features: usize) -> TreeParams {
        let default_features = (n_features as f64).sqrt().ceil() as usize;
        TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_samples_split: self.min_samples_split,
            max_features: self
                .max_features
                .unwrap_or(default_features)
                .clamp(1, n_features.max(1)),
        }
    }
}

impl ClassifierFactory for BaggedTreesFactory {
    fn name(&self) -> &str {
        "bagged_trees"
    }

    fn fit(&self, features: &[Vec<f64>], targets: &[u8]) -> Result<Arc<dyn MetaClassifier>> {
        let n_features = features.first().map_or(0, |row| row.len());
        let model = BaggedTrees::fit(
            features,
            targets,
            self.estimator_count,
            &self.params_for(n_features),
            self.seed,
        )?;
        Ok(Arc::new(model))
    }
}
