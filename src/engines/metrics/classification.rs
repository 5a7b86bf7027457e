use std::collections::HashMap;

const EPS: f64 = 1e-15;

pub struct ClassificationMetrics;

impl ClassificationMetrics {
    /// Out-of-sample quality of probabilities against 0/1 targets.
    ///
    /// `roc_auc` is omitted when the targets hold a single class.
    pub fn calculate(probabilities: &[f64], targets: &[u8]) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();

        if probabilities.is_empty() || probabilities.len() != targets.len() {
            return metrics;
        }

        let n = probabilities.len() as f64;

        if let Some(auc) = roc_auc(probabilities, targets) {
            metrics.insert("roc_auc".to_string(), auc);
        }

        let correct = probabilities
            .iter()
            .zip(targets)
            .filter(|(&p, &t)| u8::from(p >= 0.5) == t)
            .count();
        metrics.insert("accuracy".to_string(), correct as f64 / n);

        let brier = probabilities
            .iter()
            .zip(targets)
            .map(|(&p, &t)| (p - t as f64).powi(2))
            .sum::<f64>()
            / n;
        metrics.insert("brier_score".to_string(), brier);

        let log_loss = probabilities
            .iter()
            .zip(targets)
            .map(|(&p, &t)| {
                let p = p.clamp(EPS, 1.0 - EPS);
                if t == 1 {
                    -p.ln()
                } else {
                    -(1.0 - p).ln()
                }
            })
            .sum::<f64>()
            / n;
        metrics.insert("log_loss".to_string(), log_loss);

        let positives = targets.iter().filter(|&&t| t == 1).count();
        metrics.insert("positive_rate".to_string(), positives as f64 / n);

        metrics
    }
}

/// Area under the ROC curve via the Mann-Whitney rank statistic.
///
/// Tied scores share their average rank. `None` if either class is absent.
pub fn roc_auc(scores: &[f64], targets: &[u8]) -> Option<f64> {
    let n_pos = targets.iter().filter(|&&t| t == 1).count();
    let n_neg = targets.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || scores.len() != targets.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = avg_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = ranks
        .iter()
        .zip(targets)
        .filter(|(_, &t)| t == 1)
        .map(|(r, _)| r)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_ranking() {
        let auc = roc_auc(&[0.1, 0.2, 0.8, 0.9], &[0, 0, 1, 1]).unwrap();
        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_ranking() {
        let auc = roc_auc(&[0.9, 0.8, 0.2, 0.1], &[0, 0, 1, 1]).unwrap();
        assert!(auc.abs() < 1e-12);
    }

    #[test]
    fn test_constant_scores_give_half() {
        let auc = roc_auc(&[0.5; 6], &[0, 1, 0, 1, 1, 0]).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_has_no_auc() {
        assert!(roc_auc(&[0.3, 0.7], &[1, 1]).is_none());
        let metrics = ClassificationMetrics::calculate(&[0.3, 0.7], &[1, 1]);
        assert!(!metrics.contains_key("roc_auc"));
        assert!((metrics["accuracy"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_brier_and_log_loss() {
        let metrics = ClassificationMetrics::calculate(&[1.0, 0.0], &[1, 0]);
        assert!(metrics["brier_score"].abs() < 1e-12);
        assert!(metrics["log_loss"] < 1e-10);
        assert!((metrics["positive_rate"] - 0.5).abs() < 1e-12);
    }
}
