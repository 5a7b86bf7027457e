pub mod generator;
pub mod types;

pub use generator::{samples_to_frame, MetaLabelGenerator};
pub use types::{meta_target, MetaSample};
