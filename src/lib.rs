//! Meta-labeling and regime-aware position sizing.
//!
//! Primary signals are labeled with the triple-barrier method, a secondary
//! classifier learns which of them to trust under purged walk-forward
//! validation, an online changepoint detector watches for regime shifts, and
//! the integrated sizer turns all of it into a bounded position.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod regime;
pub mod sizing;
pub mod types;

pub use error::{MetalabelError, Result};
pub use pipeline::PipelineSummary;
