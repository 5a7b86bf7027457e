use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// Growth limits for one CART tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    /// Features considered at each split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        probability: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Gini-impurity classification tree over 0/1 targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    /// Unnormalised impurity decrease per feature.
    impurity_decrease: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

impl DecisionTree {
    /// Grows a tree on the rows named by `rows` (duplicates allowed, as in a bootstrap).
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[u8],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = features.first().map_or(0, |row| row.len());
        let mut tree = Self {
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
        };
        let mut rows = rows.to_vec();
        tree.grow(features, targets, &mut rows, 0, params, rng);
        tree
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[u8],
        rows: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> usize {
        let total = rows.len();
        let positives = rows.iter().filter(|&&r| targets[r] == 1).count();
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            probability: if total > 0 {
                positives as f64 / total as f64
            } else {
                0.5
            },
        });

        let pure = positives == 0 || positives == total;
        if pure || depth >= params.max_depth || total < params.min_samples_split {
            return node_id;
        }

        let best = match self.best_split(features, targets, rows, positives, params, rng) {
            Some(best) => best,
            None => return node_id,
        };

        // Partition in place: left rows first
        let mut boundary = 0;
        for i in 0..rows.len() {
            if features[rows[i]][best.feature] <= best.threshold {
                rows.swap(i, boundary);
                boundary += 1;
            }
        }

        self.impurity_decrease[best.feature] += best.decrease;
        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(features, targets, left_rows, depth + 1, params, rng);
        let right = self.grow(features, targets, right_rows, depth + 1, params, rng);

        self.nodes[node_id] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(
        &self,
        features: &[Vec<f64>],
        targets: &[u8],
        rows: &[usize],
        positives: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n_features = self.impurity_decrease.len();
        let total = rows.len();
        if n_features == 0 || total < 2 {
            return None;
        }
        let parent = total as f64 * gini(positives, total);
        let tried = params.max_features.clamp(1, n_features);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in sample(rng, n_features, tried).into_iter() {
            sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

            let mut left_pos = 0usize;
            for i in 0..total - 1 {
                left_pos += targets[sorted[i]] as usize;
                let left_n = i + 1;
                let right_n = total - left_n;
                if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
                    continue;
                }

                let here = features[sorted[i]][feature];
                let next = features[sorted[i + 1]][feature];
                if here == next {
                    continue;
                }

                let child = left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(positives - left_pos, right_n);
                let decrease = parent - child;
                if decrease > 1e-12 && best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { probability } => return *probability,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn impurity_decrease(&self) -> &[f64] {
        &self.impurity_decrease
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], node: usize) -> usize {
            match &nodes[node] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}
