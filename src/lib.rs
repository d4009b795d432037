#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Circuit Guard
//!
//! Per-process circuit breaker for guarding calls to an unreliable dependency,
//! first of all the relational database behind the repositories.
//!
//! ## Overview
//!
//! A [`CircuitBreaker`] wraps any async operation and decides whether it runs at
//! all. After `failure_threshold` consecutive failures it opens and rejects calls
//! without touching the dependency; once `timeout` has elapsed it admits a single
//! trial call at a time, and closes again after `success_threshold` consecutive
//! trial successes. An optional per-call `operation_timeout` turns hanging calls
//! into failures.
//!
//! [`DatabaseCircuitBreaker`] owns one breaker with the database preset and
//! classifies database errors (unique/foreign-key violations, not-found).
//!
//! ## Module Organization
//!
//! - [`resilience`] - State machine, presets/factory, stats, manager
//! - [`database`] - Database breaker, error classification, guarded pool
//! - [`config`] - File and environment configuration
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use circuit_guard::database::DatabaseCircuitBreaker;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! circuit_guard::logging::init_structured_logging();
//! let db_breaker = Arc::new(DatabaseCircuitBreaker::new());
//!
//! match db_breaker.execute(|| async { Err::<u64, sqlx::Error>(sqlx::Error::RowNotFound) }).await {
//!     Ok(count) => println!("{count} rows"),
//!     Err(e) if e.is_circuit_open() => println!("database unavailable, failing fast"),
//!     Err(e) => println!("query failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod logging;
pub mod resilience;

pub use crate::config::{ConfigManager, ConfigurationError, GuardConfig};
pub use crate::database::{ClassifyDatabaseError, DatabaseCircuitBreaker, RecoverableKind};
pub use crate::resilience::{
    BreakerProfile, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
    CircuitBreakerFactory, CircuitBreakerManager, CircuitBreakerStats, CircuitState,
};
