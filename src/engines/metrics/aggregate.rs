use std::collections::{BTreeSet, HashMap};

/// Mean, std, min and max of every metric across walk-forward windows.
///
/// A metric missing from some windows is aggregated over the windows that
/// report it.
pub fn aggregate_metrics(windows: &[HashMap<String, f64>]) -> HashMap<String, f64> {
    let mut aggregated = HashMap::new();

    if windows.is_empty() {
        return aggregated;
    }

    let metric_names: BTreeSet<&String> = windows.iter().flat_map(|w| w.keys()).collect();

    for metric_name in metric_names {
        let values: Vec<f64> = windows
            .iter()
            .filter_map(|w| w.get(metric_name).copied())
            .filter(|v| v.is_finite())
            .collect();

        if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let std = calculate_std(&values, mean);

            aggregated.insert(format!("{}_mean", metric_name), mean);
            aggregated.insert(format!("{}_std", metric_name), std);
            aggregated.insert(format!("{}_min", metric_name), values.iter().copied().fold(f64::INFINITY, f64::min));
            aggregated.insert(format!("{}_max", metric_name), values.iter().copied().fold(f64::NEG_INFINITY, f64::max));
        }
    }

    aggregated.insert("window_count".to_string(), windows.len() as f64);
    aggregated
}

fn calculate_std(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_each_metric() {
        let windows = vec![
            HashMap::from([("roc_auc".to_string(), 0.6), ("n_test".to_string(), 10.0)]),
            HashMap::from([("roc_auc".to_string(), 0.8), ("n_test".to_string(), 10.0)]),
        ];
        let agg = aggregate_metrics(&windows);
        assert!((agg["roc_auc_mean"] - 0.7).abs() < 1e-12);
        assert!((agg["roc_auc_min"] - 0.6).abs() < 1e-12);
        assert!((agg["roc_auc_max"] - 0.8).abs() < 1e-12);
        assert_eq!(agg["n_test_std"], 0.0);
        assert_eq!(agg["window_count"], 2.0);
    }

    #[test]
    fn test_partial_metric() {
        let windows = vec![
            HashMap::from([("roc_auc".to_string(), 0.6)]),
            HashMap::new(),
        ];
        let agg = aggregate_metrics(&windows);
        assert_eq!(agg["roc_auc_mean"], 0.6);
        assert_eq!(agg["roc_auc_std"], 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(aggregate_metrics(&[]).is_empty());
    }
}
