//! # Database Module
//!
//! The database-facing side of the circuit breaker: error classification, the
//! dedicated [`DatabaseCircuitBreaker`], and a Postgres pool that routes every
//! query through it.

pub mod circuit_breaker;
#[cfg(feature = "postgres")]
pub mod connection;

pub use circuit_breaker::{
    ClassifyDatabaseError, DatabaseCircuitBreaker, RecoverableKind, DATABASE_BREAKER_NAME,
};
#[cfg(feature = "postgres")]
pub use connection::{GuardedPool, GuardedResult};
