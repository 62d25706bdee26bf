//! Configuration system
//!
//! Any serde-capable type with a default gets [`Config::load_from_file`] and
//! [`Config::save_to_file`]; the format is picked from the `.toml` or `.ron`
//! extension. [`CollisionsConfig`] is the one configuration the crate itself
//! consumes.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::spatial::{BvhConfig, InsertionCost};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl<T> Config for T where T: Serialize + for<'de> Deserialize<'de> + Default {}

/// On-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value parsed but is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for a [`Collisions`](crate::physics::Collisions) instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionsConfig {
    /// Padding given to every body built by the `create_*` helpers
    pub default_padding: f64,

    /// Cost minimised when inserting into the BVH
    pub insertion_cost: InsertionCost,

    /// Number of bodies the arenas are sized for up front
    pub initial_capacity: usize,
}

impl Default for CollisionsConfig {
    fn default() -> Self {
        Self {
            default_padding: 0.0,
            insertion_cost: InsertionCost::Area,
            initial_capacity: 64,
        }
    }
}

impl CollisionsConfig {
    /// Reject values the collision system cannot use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_padding.is_finite() || self.default_padding < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_padding must be finite and non-negative, got {}",
                self.default_padding
            )));
        }
        Ok(())
    }

    /// Load from a `.toml` or `.ron` file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// BVH settings derived from this configuration
    pub fn bvh_config(&self) -> BvhConfig {
        BvhConfig {
            insertion_cost: self.insertion_cost,
        }
    }
}
