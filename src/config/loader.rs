use super::types::AppConfig;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
///
/// Layers, lowest precedence first: built-in defaults, a config file, then
/// the environment (`MONGO_URI`, `META_SOFT_DEL`, and `MONGO_GRID_*` with
/// `__` as the nesting separator).
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    load_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_file: None,
            load_env: false,
        }
    }

    /// Load configuration from file
    pub fn load_from_file(mut self, path: Option<&Path>) -> Self {
        self.config_file = path.map(Path::to_path_buf);
        self
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let defaults = Config::try_from(&AppConfig::default())
            .map_err(|e| Error::Config(format!("Failed to load defaults: {}", e)))?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(config_path) = &self.config_file {
            if !config_path.exists() {
                return Err(Error::Config(format!(
                    "Configuration file not found: {}",
                    config_path.display()
                )));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        } else {
            builder = builder
                .add_source(File::with_name("mongo-grid").required(false))
                .add_source(File::with_name("config/mongo-grid").required(false));
        }

        if self.load_env {
            builder = builder
                .add_source(
                    Environment::with_prefix("MONGO_GRID")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                )
                .set_override_option("mongo_uri", std::env::var("MONGO_URI").ok())
                .and_then(|b| {
                    b.set_override_option("meta_soft_del", std::env::var("META_SOFT_DEL").ok())
                })
                .map_err(|e| Error::Config(format!("Failed to read environment: {}", e)))?;
        }

        builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize configuration: {}", e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
