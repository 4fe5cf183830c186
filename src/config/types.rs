use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Connection string, read from `MONGO_URI`
    #[serde(default)]
    pub mongo_uri: Option<String>,

    /// Archive documents before deleting them, read from `META_SOFT_DEL`
    #[serde(default = "default_soft_delete")]
    pub meta_soft_del: bool,

    /// Driver pool options
    #[serde(default)]
    pub pool: MongoConnectionOptions,

    /// Logging options
    #[serde(default)]
    pub logging: LogSettings,
}

fn default_soft_delete() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mongo_uri: None,
            meta_soft_del: default_soft_delete(),
            pool: MongoConnectionOptions::default(),
            logging: LogSettings::default(),
        }
    }
}

/// MongoDB Connection Pool Options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConnectionOptions {
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Server selection timeout in seconds
    pub server_selection_timeout_secs: u64,
    /// Application name reported to the server
    pub app_name: Option<String>,
}

impl Default for MongoConnectionOptions {
    fn default() -> Self {
        Self {
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
            app_name: Some("mongo-grid".to_string()),
        }
    }
}

impl MongoConnectionOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (error, warn, info, debug, trace); `RUST_LOG` wins when set
    pub level: String,

    /// Log format (json, human)
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Human,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
        }
    }
}
