//! Configuration Loader
//!
//! Environment-aware configuration loading. A file (TOML, YAML or JSON, picked
//! by extension) provides the base layer and `SELF_HEALING_CACHE__*`
//! environment variables override individual fields, e.g.
//! `SELF_HEALING_CACHE__RECOVERY__IMMEDIATE_BATCH_SIZE=10`.

use super::error::ConfigResult;
use super::CacheConfig;
use crate::constants::system;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loaded and validated configuration plus the context it was loaded in
#[derive(Debug)]
pub struct ConfigManager {
    config: CacheConfig,
    environment: String,
    source_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from an optional file plus environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_prefix(Some(path.as_ref()), system::ENV_PREFIX)
    }

    /// Load configuration from environment overrides only
    pub fn load_from_env() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_prefix(None, system::ENV_PREFIX)
    }

    /// Load with an explicit environment-variable prefix
    ///
    /// Useful for testing without touching the process-wide prefix.
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(
                path = %path.display(),
                exists = path.exists(),
                "Adding configuration file source"
            );
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: CacheConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            max_entries = config.max_entries,
            health_check_interval_ms = config.health_check_interval_ms,
            enable_ml = config.enable_ml,
            enable_adaptive_recovery = config.enable_adaptive_recovery,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            source_path: path.map(Path::to_path_buf),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Environment the configuration was loaded for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// File the base layer came from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Detect the current environment from environment variables
    pub fn detect_environment() -> String {
        env::var(format!("{}_ENV", system::ENV_PREFIX))
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str, extension: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(
            r#"
max_entries = 500
prediction_threshold = 0.6
enable_ml = false

[recovery]
immediate_batch_size = 4

[circuit_breaker]
timeout_ms = 10000
"#,
            ".toml",
        );

        let manager =
            ConfigManager::load_with_prefix(Some(file.path()), "SHC_TEST_TOML").unwrap();
        let config = manager.config();

        assert_eq!(config.max_entries, 500);
        assert_eq!(config.prediction_threshold, 0.6);
        assert!(!config.enable_ml);
        assert_eq!(config.recovery.immediate_batch_size, 4);
        assert_eq!(config.circuit_breaker.timeout_ms, 10_000);
        // Untouched fields keep their defaults
        assert_eq!(config.health_check_interval_ms, 10_000);
        assert_eq!(manager.source_path(), Some(file.path()));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let manager = ConfigManager::load_with_prefix(
            Some(Path::new("/nonexistent/self-healing-cache.toml")),
            "SHC_TEST_MISSING",
        )
        .unwrap();
        assert_eq!(manager.config(), &CacheConfig::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(r#"{"max_entries": 100}"#, ".json");

        env::set_var("SHC_TEST_ENV__MAX_ENTRIES", "250");
        env::set_var("SHC_TEST_ENV__RECOVERY__GRADUAL_BATCH_SIZE", "2");
        let manager = ConfigManager::load_with_prefix(Some(file.path()), "SHC_TEST_ENV").unwrap();
        env::remove_var("SHC_TEST_ENV__MAX_ENTRIES");
        env::remove_var("SHC_TEST_ENV__RECOVERY__GRADUAL_BATCH_SIZE");

        assert_eq!(manager.config().max_entries, 250);
        assert_eq!(manager.config().recovery.gradual_batch_size, 2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = write_config("max_entries = 0\n", ".toml");
        let result = ConfigManager::load_with_prefix(Some(file.path()), "SHC_TEST_INVALID");
        assert!(result.is_err());
    }
}
