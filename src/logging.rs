//! Logging initialisation
//!
//! Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over
//! the configured level.

use crate::config::{LogFormat, LogSettings};
use crate::error::{Error, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the level filter for `settings`
pub fn env_filter(settings: &LogSettings) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", settings.level, e)))
}

/// Initialize global logging
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(settings)?);

    let installed = match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Human => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))?;

    info!(level = %settings.level, format = ?settings.format, "Logging system initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = LogSettings {
            level: "mongo_grid=loudest".to_string(),
            format: LogFormat::Human,
        };
        assert!(env_filter(&settings).is_err());
    }

    #[test]
    fn test_valid_level_builds_filter() {
        let settings = LogSettings::default();
        assert!(env_filter(&settings).is_ok());
    }
}
