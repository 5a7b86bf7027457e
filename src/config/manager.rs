use super::{
    labeling::BarrierConfig,
    ml::{FeatureConfig, MetaModelConfig},
    regime::BocdConfig,
    sizing::IntegratedSizingConfig,
    traits::{ConfigManifest, ConfigSection},
};
use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub labeling: BarrierConfig,
    pub features: FeatureConfig,
    pub meta_model: MetaModelConfig,
    pub bocd: BocdConfig,
    pub sizing: IntegratedSizingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.labeling.validate()?;
        self.features.validate()?;
        self.meta_model.validate()?;
        self.bocd.validate()?;
        self.sizing.validate()?;
        Ok(())
    }

    /// Field ranges of every section.
    pub fn manifests(&self) -> Vec<ConfigManifest> {
        vec![
            self.labeling.to_manifest(),
            self.features.to_manifest(),
            self.meta_model.to_manifest(),
            self.bocd.to_manifest(),
            self.sizing.to_manifest(),
        ]
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MetalabelError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    /// Layers an optional file under environment overrides.
    ///
    /// Keys are nested with `__`, e.g. `METALABEL__BOCD__HAZARD_RATE=0.01`.
    pub fn load_layered<P: AsRef<Path>>(&self, path: Option<P>, env_prefix: &str) -> Result<()> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::debug!("Loaded layered configuration with env prefix {}", env_prefix);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = {
            let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
            toml::to_string_pretty(&*config)?
        };

        std::fs::write(path, toml_str)
            .map_err(|e| MetalabelError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies `f` and keeps the result only if it still validates.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
