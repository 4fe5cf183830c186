//! Configuration
//!
//! Settings are layered through the `config` crate; see [`ConfigLoader`].

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, LogFormat, LogSettings, MongoConnectionOptions};

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::io::Write;
    use std::sync::Mutex;

    /// Serialises tests that touch the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets an environment variable and restores the previous value on drop
    struct EnvVarGuard {
        name: &'static str,
        previous: Option<OsString>,
    }

    impl EnvVarGuard {
        fn set(name: &'static str, value: &str) -> Self {
            let previous = std::env::var_os(name);
            std::env::set_var(name, value);
            Self { name, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => std::env::set_var(self.name, value),
                None => std::env::remove_var(self.name),
            }
        }
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let config = ConfigLoader::new()
            .load_from_file(Some(std::path::Path::new("does-not-exist.toml")))
            .build();
        assert!(matches!(config, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.mongo_uri.is_none());
        assert!(config.meta_soft_del);
        assert_eq!(config.pool.max_pool_size, 100);
        assert_eq!(config.pool.connect_timeout().as_secs(), 10);
        assert_eq!(config.logging.format, LogFormat::Human);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
mongo_uri = "mongodb://db.internal:27017"
meta_soft_del = false

[pool]
max_pool_size = 20

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .load_from_file(Some(file.path()))
            .build()
            .unwrap();

        assert_eq!(config.mongo_uri.as_deref(), Some("mongodb://db.internal:27017"));
        assert!(!config.meta_soft_del);
        assert_eq!(config.pool.max_pool_size, 20);
        assert_eq!(config.pool.min_pool_size, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_prefixed_environment_overrides() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _app_name = EnvVarGuard::set("MONGO_GRID_POOL__APP_NAME", "grid-env-test");

        let config = ConfigLoader::new().load_from_env().build().unwrap();
        assert_eq!(config.pool.app_name.as_deref(), Some("grid-env-test"));
    }

    #[test]
    fn test_unprefixed_environment_is_limited_to_known_keys() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _pool = EnvVarGuard::set("POOL", "shared-worker-pool");
        let _logging = EnvVarGuard::set("LOGGING", "verbose");
        let _uri = EnvVarGuard::set("MONGO_URI", "mongodb://env-host:27017");
        let _soft_del = EnvVarGuard::set("META_SOFT_DEL", "false");

        let config = ConfigLoader::new().load_from_env().build().unwrap();
        assert_eq!(config.mongo_uri.as_deref(), Some("mongodb://env-host:27017"));
        assert!(!config.meta_soft_del);
        assert_eq!(config.pool, MongoConnectionOptions::default());
        assert_eq!(config.logging, LogSettings::default());
    }
}
