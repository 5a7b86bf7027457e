pub mod traits;
pub mod labeling;
pub mod ml;
pub mod regime;
pub mod sizing;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use labeling::{BarrierConfig, TieBreak};
pub use ml::{FeatureConfig, MetaModelConfig, WindowSpec};
pub use regime::BocdConfig;
pub use sizing::IntegratedSizingConfig;
pub use traits::{ConfigManifest, ConfigSection, FieldManifest};
