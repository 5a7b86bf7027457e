pub mod connectors;
pub mod series;

pub use connectors::{BarColumn, CsvConnector, DataValidator};
pub use series::{causal_atr, BarSeries};
