//! Configuration Loader
//!
//! Layers built-in defaults, an optional configuration file and
//! `CIRCUIT_GUARD__*` environment overrides, then validates the result.

use super::error::{ConfigResult, ConfigurationError};
use super::GuardConfig;
use ::config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix for environment overrides, e.g. `CIRCUIT_GUARD__DATABASE__RECOVERABLE_ERRORS_TRIP`
pub const ENV_PREFIX: &str = "CIRCUIT_GUARD";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: GuardConfig,
    environment: String,
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from a file, applying environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_source(Some(path.as_ref()), None)
    }

    /// Load built-in defaults with environment overrides only
    pub fn load_from_env() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_source(None, None)
    }

    /// Wrap an already constructed configuration, validating it first
    pub fn from_config(config: GuardConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            source_file: None,
        }))
    }

    /// Load with an explicit set of environment variables instead of the process
    /// environment. Keys use the same `CIRCUIT_GUARD__SECTION__KEY` form.
    pub fn load_with_env_source(
        path: Option<&Path>,
        env_source: Option<::config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let mut builder = Config::builder().add_source(Config::try_from(&GuardConfig::default())?);

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigurationError::file_not_found(path.display().to_string()));
            }
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config: GuardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            source_file = ?path.map(|p| p.display().to_string()),
            database_failure_threshold = config.database.breaker.failure_threshold,
            recoverable_errors_trip = config.database.recoverable_errors_trip,
            component_configs = config.circuit_breakers.component_configs.len(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
            source_file: path.map(Path::to_path_buf),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Configuration as JSON, for debug endpoints and startup logs
    pub fn debug_config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Detect the deployment environment from environment variables
    pub fn detect_environment() -> String {
        env::var("CIRCUIT_GUARD_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
