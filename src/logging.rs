//! # Structured Logging Module
//!
//! Environment-aware `tracing` setup. Console output by default, JSON lines when
//! `CIRCUIT_GUARD_LOG_FORMAT=json`. `RUST_LOG` wins over the environment default.

use crate::resilience::{CircuitBreakerStats, SystemCircuitBreakerStats};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call repeatedly; an already installed global subscriber is kept.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json_output = std::env::var("CIRCUIT_GUARD_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let layer = if json_output {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Use try_init to avoid panic if global subscriber already set
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json_output = json_output,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
pub fn get_environment() -> String {
    std::env::var("CIRCUIT_GUARD_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log a single breaker snapshot
pub fn log_breaker_stats(stats: &CircuitBreakerStats) {
    tracing::info!(
        component = %stats.name,
        state = %stats.state,
        failures = stats.failures,
        successes = stats.successes,
        total_requests = stats.total_requests,
        total_failures = stats.total_failures,
        total_rejections = stats.total_rejections,
        "{}",
        stats.format_summary()
    );
}

/// Log an aggregate of all managed breakers
pub fn log_system_summary(stats: &SystemCircuitBreakerStats) {
    tracing::info!(
        circuit_breakers = stats.circuit_breakers.len(),
        health_score = stats.health_score(),
        "{}",
        stats.format_summary()
    );
    for breaker in stats.unhealthy_circuits() {
        log_breaker_stats(breaker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_by_environment() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("staging"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
