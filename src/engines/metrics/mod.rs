pub mod aggregate;
pub mod classification;

pub use aggregate::aggregate_metrics;
pub use classification::{roc_auc, ClassificationMetrics};
