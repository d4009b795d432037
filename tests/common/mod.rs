#![allow(dead_code)]

pub mod strategies;

use circuit_guard::database::{ClassifyDatabaseError, RecoverableKind};
use circuit_guard::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Install the crate's subscriber once per test binary
pub fn init_test_logging() {
    circuit_guard::logging::init_structured_logging();
}

/// Breaker config without an operation timeout
pub fn breaker_config(
    failure_threshold: u32,
    success_threshold: u32,
    timeout_ms: u64,
) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        timeout: Duration::from_millis(timeout_ms),
        operation_timeout: None,
    }
}

/// Error type for exercising database classification without a database
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeDbError {
    #[error("duplicate key value violates unique constraint")]
    Duplicate,
    #[error("insert violates foreign key constraint")]
    MissingParent,
    #[error("no rows returned")]
    NotFound,
    #[error("connection refused")]
    ConnectionRefused,
}

impl ClassifyDatabaseError for FakeDbError {
    fn recoverable_kind(&self) -> Option<RecoverableKind> {
        match self {
            FakeDbError::Duplicate => Some(RecoverableKind::UniqueViolation),
            FakeDbError::MissingParent => Some(RecoverableKind::ForeignKeyViolation),
            FakeDbError::NotFound => Some(RecoverableKind::NotFound),
            FakeDbError::ConnectionRefused => None,
        }
    }
}

/// Counts how many times the wrapped operation actually ran
#[derive(Debug, Default)]
pub struct InvocationCounter(AtomicUsize);

impl InvocationCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub async fn succeed(breaker: &CircuitBreaker) -> Result<(), CircuitBreakerError<&'static str>> {
    breaker.execute(|| async { Ok::<_, &'static str>(()) }).await
}

pub async fn fail(breaker: &CircuitBreaker) -> Result<(), CircuitBreakerError<&'static str>> {
    breaker.execute(|| async { Err::<(), _>("dependency down") }).await
}

/// Run `n` failing calls, asserting each one actually reached the operation
pub async fn fail_times(breaker: &CircuitBreaker, n: u32) {
    for _ in 0..n {
        let error = fail(breaker).await.unwrap_err();
        assert_eq!(error.operation_error(), Some(&"dependency down"));
    }
}
