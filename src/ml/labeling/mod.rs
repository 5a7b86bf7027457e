pub mod config;
pub mod triple_barrier;

pub use config::{
    BarrierEvent, BarrierLabel, BarrierLabels, LabelingStatus, SkipReason, SkippedEntry,
};
pub use triple_barrier::{LabelStats, TripleBarrierLabeler};
