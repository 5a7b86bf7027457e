pub mod trainer;
pub mod walk_forward;

pub use trainer::{WalkForwardReport, WalkForwardTrainer, WindowResult};
pub use walk_forward::{WalkForwardSplitter, WalkForwardWindow, WindowSplit};
