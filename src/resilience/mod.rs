//! # Resilience Module
//!
//! Circuit breaker fault isolation for unreliable downstream dependencies.
//!
//! ## Architecture
//!
//! - **Circuit Breaker**: Closed/Open/HalfOpen state machine with fail-fast
//!   rejection, recovery timer and per-call timeout racing
//! - **Presets**: Named threshold profiles and a factory applying them
//! - **Stats**: Owned snapshots of counters for logging and health checks
//! - **Manager**: One breaker per named component, built from configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use circuit_guard::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     success_threshold: 2,
//!     timeout: Duration::from_secs(30),
//!     operation_timeout: Some(Duration::from_secs(10)),
//! };
//!
//! let circuit_breaker = CircuitBreaker::new("inventory_api", config);
//!
//! let value = circuit_breaker
//!     .execute(|| async { Ok::<&str, std::io::Error>("success") })
//!     .await?;
//! assert_eq!(value, "success");
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod manager;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use config::{BreakerProfile, CircuitBreakerConfig, CircuitBreakerFactory};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerStats, SystemCircuitBreakerStats};
