//! # Database Circuit Breaker
//!
//! Guarded entry point for database calls. Owns exactly one [`CircuitBreaker`]
//! configured with the database preset and classifies database errors.
//!
//! Construct one at the composition root and share it (`Arc`) with every
//! repository. [`DatabaseCircuitBreaker::global`] exists for call sites that
//! cannot have it injected.

use crate::config::DatabaseBreakerSettings;
use crate::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Name the database breaker reports in logs and stats
pub const DATABASE_BREAKER_NAME: &str = "database";

static GLOBAL_DATABASE_BREAKER: OnceLock<DatabaseCircuitBreaker> = OnceLock::new();

/// Database errors that indicate a healthy database rejecting a specific request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverableKind {
    UniqueViolation,
    ForeignKeyViolation,
    NotFound,
}

impl fmt::Display for RecoverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverableKind::UniqueViolation => write!(f, "unique_violation"),
            RecoverableKind::ForeignKeyViolation => write!(f, "foreign_key_violation"),
            RecoverableKind::NotFound => write!(f, "not_found"),
        }
    }
}

/// Classification of errors returned by database client code
pub trait ClassifyDatabaseError {
    /// `Some` when the error is a recoverable, request-specific failure
    fn recoverable_kind(&self) -> Option<RecoverableKind>;
}

impl ClassifyDatabaseError for sqlx::Error {
    fn recoverable_kind(&self) -> Option<RecoverableKind> {
        match self {
            sqlx::Error::RowNotFound => Some(RecoverableKind::NotFound),
            sqlx::Error::Database(db_error) => match db_error.kind() {
                sqlx::error::ErrorKind::UniqueViolation => Some(RecoverableKind::UniqueViolation),
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    Some(RecoverableKind::ForeignKeyViolation)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Circuit breaker dedicated to database calls
#[derive(Debug)]
pub struct DatabaseCircuitBreaker {
    breaker: CircuitBreaker,

    /// Whether recoverable errors count toward failure accounting
    recoverable_errors_trip: bool,
}

impl DatabaseCircuitBreaker {
    /// Database preset, recoverable errors counted like any other error
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::for_database(), true)
    }

    pub fn with_config(config: CircuitBreakerConfig, recoverable_errors_trip: bool) -> Self {
        Self {
            breaker: CircuitBreaker::new(DATABASE_BREAKER_NAME, config),
            recoverable_errors_trip,
        }
    }

    pub fn from_settings(settings: &DatabaseBreakerSettings) -> Self {
        Self::with_config(
            settings.breaker.to_resilience_config(),
            settings.recoverable_errors_trip,
        )
    }

    /// Process-wide instance with the database preset, created on first access
    pub fn global() -> &'static DatabaseCircuitBreaker {
        GLOBAL_DATABASE_BREAKER.get_or_init(DatabaseCircuitBreaker::new)
    }

    /// Run a database operation through the breaker.
    ///
    /// `CircuitOpen` means the operation never ran; `OperationFailed` carries the
    /// database client's own error unchanged.
    pub async fn execute<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifyDatabaseError,
    {
        let recoverable_errors_trip = self.recoverable_errors_trip;
        let result = self
            .breaker
            .execute_classified(operation, |error: &E| match error.recoverable_kind() {
                Some(kind) => {
                    debug!(
                        component = DATABASE_BREAKER_NAME,
                        kind = %kind,
                        counts_as_failure = recoverable_errors_trip,
                        "Recoverable database error"
                    );
                    recoverable_errors_trip
                }
                None => true,
            })
            .await;

        if let Err(CircuitBreakerError::CircuitOpen { .. }) = &result {
            warn!(component = DATABASE_BREAKER_NAME, "Database call rejected, circuit open");
        }

        result
    }

    /// Whether recoverable errors count toward failure accounting
    pub fn recoverable_errors_trip(&self) -> bool {
        self.recoverable_errors_trip
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    pub fn is_open(&self) -> bool {
        self.breaker.is_open()
    }

    pub fn is_closed(&self) -> bool {
        self.breaker.is_closed()
    }

    pub fn reset(&self) {
        self.breaker.reset();
    }

    pub fn trip(&self) {
        self.breaker.trip();
    }
}

impl Default for DatabaseCircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_error_classification() {
        assert_eq!(
            sqlx::Error::RowNotFound.recoverable_kind(),
            Some(RecoverableKind::NotFound)
        );
        assert_eq!(sqlx::Error::PoolTimedOut.recoverable_kind(), None);
        assert_eq!(
            sqlx::Error::Protocol("unexpected message".into()).recoverable_kind(),
            None
        );
    }

    #[test]
    fn test_default_uses_database_preset() {
        let db_breaker = DatabaseCircuitBreaker::default();
        assert_eq!(db_breaker.state(), CircuitState::Closed);
        assert!(db_breaker.recoverable_errors_trip());
        assert_eq!(db_breaker.stats().name, DATABASE_BREAKER_NAME);
    }

    #[test]
    fn test_global_instance_is_shared() {
        let first = DatabaseCircuitBreaker::global();
        let second = DatabaseCircuitBreaker::global();
        assert!(std::ptr::eq(first, second));
    }
}
