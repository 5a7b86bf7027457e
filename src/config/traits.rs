use crate::error::{MetalabelError, Result};
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<()>;
    fn to_manifest(&self) -> ConfigManifest;
}

/// Enumerates every field of a section with its accepted range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigManifest {
    pub section: String,
    pub fields: Vec<FieldManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldManifest {
    pub name: String,
    pub field_type: String,
    pub default: serde_json::Value,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub description: String,
}

impl FieldManifest {
    pub fn new(
        name: &str,
        field_type: &str,
        default: serde_json::Value,
        min: Option<f64>,
        max: Option<f64>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            default,
            min,
            max,
            description: description.to_string(),
        }
    }
}

impl ConfigManifest {
    pub fn field(&self, name: &str) -> Option<&FieldManifest> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Rejects non-finite values and values outside `[min, max]`.
pub(crate) fn ensure_in_range(section: &str, name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(MetalabelError::Configuration(format!(
            "{}.{} must be in [{}, {}], got {}",
            section, name, min, max, value
        )));
    }
    Ok(())
}

/// Rejects non-finite and non-positive values.
pub(crate) fn ensure_positive(section: &str, name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MetalabelError::Configuration(format!(
            "{}.{} must be positive, got {}",
            section, name, value
        )));
    }
    Ok(())
}

pub(crate) fn ensure_at_least(section: &str, name: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(MetalabelError::Configuration(format!(
            "{}.{} must be at least {}, got {}",
            section, name, min, value
        )));
    }
    Ok(())
}
