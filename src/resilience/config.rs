//! # Circuit Breaker Configuration
//!
//! Threshold and timeout tuples for a single circuit breaker, the named presets
//! used across the codebase, and the factory that applies a preset to a name.
//!
//! For file/environment driven settings see [`crate::config`], whose component
//! entries convert into [`CircuitBreakerConfig`].

use crate::config::{ConfigResult, ConfigurationError};
use crate::resilience::CircuitBreaker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: u32,

    /// Number of consecutive successful trial calls in half-open state to close circuit
    pub success_threshold: u32,

    /// Time to wait in open state before attempting recovery
    pub timeout: Duration,

    /// Ceiling for a single wrapped call; `None` awaits the call without a timer
    pub operation_timeout: Option<Duration>,
}

impl CircuitBreakerConfig {
    /// Create configuration for database operations
    pub fn for_database() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout: Duration::from_secs(30),
            operation_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Create configuration for external API calls
    pub fn for_external_api() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(45),
            operation_timeout: Some(Duration::from_secs(15)),
        }
    }

    /// Create configuration for queue operations
    pub fn for_queue() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 2,
            timeout: Duration::from_secs(15),
            operation_timeout: None,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "failure_threshold",
                self.failure_threshold.to_string(),
                "must be greater than 0",
            ));
        }

        if self.failure_threshold > 100 {
            return Err(ConfigurationError::invalid_value(
                "failure_threshold",
                self.failure_threshold.to_string(),
                "should not exceed 100",
            ));
        }

        if self.success_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "success_threshold",
                self.success_threshold.to_string(),
                "must be greater than 0",
            ));
        }

        if self.success_threshold > 50 {
            return Err(ConfigurationError::invalid_value(
                "success_threshold",
                self.success_threshold.to_string(),
                "should not exceed 50",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "timeout",
                format!("{}ms", self.timeout.as_millis()),
                "must be greater than 0",
            ));
        }

        if self.timeout > Duration::from_secs(300) {
            return Err(ConfigurationError::invalid_value(
                "timeout",
                format!("{}ms", self.timeout.as_millis()),
                "should not exceed 300 seconds",
            ));
        }

        if let Some(operation_timeout) = self.operation_timeout {
            if operation_timeout.is_zero() {
                return Err(ConfigurationError::invalid_value(
                    "operation_timeout",
                    "0ms".to_string(),
                    "must be greater than 0 when set",
                ));
            }
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(30),
            operation_timeout: None,
        }
    }
}

/// Named presets so thresholds are not repeated at every construction site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerProfile {
    Database,
    ExternalApi,
    Queue,
}

impl BreakerProfile {
    pub const ALL: [BreakerProfile; 3] = [
        BreakerProfile::Database,
        BreakerProfile::ExternalApi,
        BreakerProfile::Queue,
    ];

    /// Concrete thresholds for this profile
    pub fn config(self) -> CircuitBreakerConfig {
        match self {
            BreakerProfile::Database => CircuitBreakerConfig::for_database(),
            BreakerProfile::ExternalApi => CircuitBreakerConfig::for_external_api(),
            BreakerProfile::Queue => CircuitBreakerConfig::for_queue(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BreakerProfile::Database => "database",
            BreakerProfile::ExternalApi => "external_api",
            BreakerProfile::Queue => "queue",
        }
    }
}

impl fmt::Display for BreakerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreakerProfile {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "database" | "db" => Ok(BreakerProfile::Database),
            "external_api" | "api" => Ok(BreakerProfile::ExternalApi),
            "queue" => Ok(BreakerProfile::Queue),
            other => Err(ConfigurationError::invalid_value(
                "profile",
                other.to_string(),
                "expected one of: database, external_api, queue",
            )),
        }
    }
}

/// Builds circuit breakers from named profiles
pub struct CircuitBreakerFactory;

impl CircuitBreakerFactory {
    /// Create a breaker called `name` using the thresholds of `profile`
    pub fn create(name: impl Into<String>, profile: BreakerProfile) -> CircuitBreaker {
        CircuitBreaker::new(name, profile.config())
    }

    pub fn create_database(name: impl Into<String>) -> CircuitBreaker {
        Self::create(name, BreakerProfile::Database)
    }

    pub fn create_external_api(name: impl Into<String>) -> CircuitBreaker {
        Self::create(name, BreakerProfile::ExternalApi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_breaker_config_validation() {
        // Valid config should pass
        let valid_config = CircuitBreakerConfig::default();
        assert!(valid_config.validate().is_ok());

        // Invalid failure threshold
        let mut invalid_config = CircuitBreakerConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        assert!(invalid_config.validate().is_err());

        // Invalid timeout
        invalid_config = CircuitBreakerConfig {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(invalid_config.validate().is_err());

        // Invalid success threshold
        invalid_config = CircuitBreakerConfig {
            success_threshold: 0,
            ..Default::default()
        };
        assert!(invalid_config.validate().is_err());

        // Zero operation timeout is rejected, absent is fine
        invalid_config = CircuitBreakerConfig {
            operation_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_preset_configurations() {
        let db_config = CircuitBreakerConfig::for_database();
        assert_eq!(db_config.failure_threshold, 5);
        assert_eq!(db_config.success_threshold, 3);
        assert_eq!(db_config.timeout, Duration::from_secs(30));
        assert_eq!(db_config.operation_timeout, Some(Duration::from_secs(10)));

        for profile in BreakerProfile::ALL {
            assert!(profile.config().validate().is_ok(), "{profile} preset invalid");
        }
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("database".parse::<BreakerProfile>().unwrap(), BreakerProfile::Database);
        assert_eq!("External-API".parse::<BreakerProfile>().unwrap(), BreakerProfile::ExternalApi);
        assert!("mainframe".parse::<BreakerProfile>().is_err());
    }

    #[tokio::test]
    async fn test_factory_applies_profile() {
        let breaker = CircuitBreakerFactory::create("payments", BreakerProfile::ExternalApi);
        assert_eq!(breaker.name(), "payments");
        assert_eq!(breaker.config(), &CircuitBreakerConfig::for_external_api());
        assert!(breaker.is_closed());
    }
}
