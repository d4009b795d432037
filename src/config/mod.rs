//! # Configuration
//!
//! File and environment driven settings for circuit breakers. Values are loaded
//! from a YAML (or TOML/JSON) file layered over built-in defaults, then
//! overridden by `CIRCUIT_GUARD__*` environment variables, and validated before
//! use.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use circuit_guard::config::ConfigManager;
//! use circuit_guard::database::DatabaseCircuitBreaker;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_file("config/circuit-guard.yaml")?;
//! let db_breaker = DatabaseCircuitBreaker::from_settings(&manager.config().database);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Circuit breakers managed per component
    pub circuit_breakers: CircuitBreakerSettings,

    /// The dedicated database breaker
    pub database: DatabaseBreakerSettings,
}

impl GuardConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.circuit_breakers.validate()?;
        self.database
            .breaker
            .to_resilience_config()
            .validate()
            .map_err(|e| e.in_section("database.breaker"))
    }
}

/// Circuit breaker settings for named components
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub global_settings: CircuitBreakerGlobalSettings,

    /// Configuration for components without an entry in `component_configs`
    pub default_config: CircuitBreakerComponentConfig,

    /// Specific configurations for named components
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl CircuitBreakerSettings {
    /// Get configuration for a specific component
    pub fn config_for_component(&self, component_name: &str) -> CircuitBreakerComponentConfig {
        self.component_configs
            .get(component_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.global_settings.max_circuit_breakers == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breakers.global_settings.max_circuit_breakers",
                "0",
                "must be greater than 0",
            ));
        }

        self.default_config
            .to_resilience_config()
            .validate()
            .map_err(|e| e.in_section("circuit_breakers.default_config"))?;

        for (name, component) in &self.component_configs {
            component
                .to_resilience_config()
                .validate()
                .map_err(|e| e.in_section(&format!("circuit_breakers.component_configs.{name}")))?;
        }

        Ok(())
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        let mut component_configs = HashMap::new();
        component_configs.insert(
            "external_api".to_string(),
            CircuitBreakerComponentConfig::from(&CircuitBreakerConfig::for_external_api()),
        );
        component_configs.insert(
            "queue".to_string(),
            CircuitBreakerComponentConfig::from(&CircuitBreakerConfig::for_queue()),
        );

        Self {
            global_settings: CircuitBreakerGlobalSettings::default(),
            default_config: CircuitBreakerComponentConfig::default(),
            component_configs,
        }
    }
}

/// Global circuit breaker settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerGlobalSettings {
    /// Number of managed breakers above which creation is logged as a warning
    pub max_circuit_breakers: usize,
}

impl Default for CircuitBreakerGlobalSettings {
    fn default() -> Self {
        Self {
            max_circuit_breakers: 50,
        }
    }
}

/// Circuit breaker configuration for a specific component, in file units
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CircuitBreakerComponentConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: u32,

    /// Number of successful trial calls in half-open state to close circuit
    pub success_threshold: u32,

    /// Time to wait in open state before attempting recovery (milliseconds)
    pub timeout_ms: u64,

    /// Per-call ceiling (milliseconds); absent means no timer
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl CircuitBreakerComponentConfig {
    /// Convert to resilience module's format
    pub fn to_resilience_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            timeout: Duration::from_millis(self.timeout_ms),
            operation_timeout: self.operation_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl From<&CircuitBreakerConfig> for CircuitBreakerComponentConfig {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            timeout_ms: config.timeout.as_millis() as u64,
            operation_timeout_ms: config.operation_timeout.map(|t| t.as_millis() as u64),
        }
    }
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

/// Settings for the dedicated database breaker
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseBreakerSettings {
    pub breaker: CircuitBreakerComponentConfig,

    /// Whether unique/foreign-key violations and not-found errors feed the
    /// failure streak like any other database error
    pub recoverable_errors_trip: bool,
}

impl Default for DatabaseBreakerSettings {
    fn default() -> Self {
        Self {
            breaker: CircuitBreakerComponentConfig::from(&CircuitBreakerConfig::for_database()),
            recoverable_errors_trip: true,
        }
    }
}
