pub mod bocd;
pub mod state;

pub use bocd::{Changepoint, ChangepointDetector};
pub use state::{BocdState, RunStatistics};
