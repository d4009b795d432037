//! # Circuit Breaker Metrics
//!
//! Owned snapshots of circuit breaker counters. A snapshot is a copy: mutating it
//! never reaches back into the breaker it was taken from.

use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Snapshot of a single circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    /// Breaker name
    pub name: String,

    /// State at the time of the snapshot
    pub state: CircuitState,

    /// Current failure streak (Closed) or failures in the current half-open window
    pub failures: u32,

    /// Consecutive successes in the current half-open window
    pub successes: u32,

    /// Every call made through the breaker, admitted or not
    pub total_requests: u64,

    /// Failed calls, including admission rejections
    pub total_failures: u64,

    pub total_successes: u64,

    /// Calls rejected by admission control (subset of `total_failures`)
    pub total_rejections: u64,

    pub last_failure_time: Option<DateTime<Utc>>,

    pub last_success_time: Option<DateTime<Utc>>,

    /// Wall-clock time after which an open breaker admits a trial call
    pub next_attempt_at: Option<DateTime<Utc>>,

    /// Average duration of admitted calls
    pub average_duration: Duration,
}

impl CircuitBreakerStats {
    /// Failure rate over all requests (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_failures as f64 / self.total_requests as f64
    }

    /// Check if the snapshot indicates healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.state {
            // Closed is healthy if failure rate is reasonable
            CircuitState::Closed => self.failure_rate() < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true,
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing system health",
        }
    }

    /// Format the snapshot for logging
    pub fn format_summary(&self) -> String {
        format!(
            "{}: {} | Requests: {} | Failures: {} ({} rejected) | Failure rate: {:.1}% | Avg Duration: {}ms",
            self.name,
            self.state_description(),
            self.total_requests,
            self.total_failures,
            self.total_rejections,
            self.failure_rate() * 100.0,
            self.average_duration.as_millis()
        )
    }
}

/// Process-wide aggregate of named breaker snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCircuitBreakerStats {
    pub circuit_breakers: HashMap<String, CircuitBreakerStats>,

    /// Timestamp of last collection
    pub collected_at: DateTime<Utc>,
}

impl SystemCircuitBreakerStats {
    pub fn new() -> Self {
        Self {
            circuit_breakers: HashMap::new(),
            collected_at: Utc::now(),
        }
    }

    /// Add a snapshot, keyed by the breaker name it carries
    pub fn add_circuit_breaker(&mut self, stats: CircuitBreakerStats) {
        self.circuit_breakers.insert(stats.name.clone(), stats);
        self.collected_at = Utc::now();
    }

    /// Get count of circuit breakers by state
    pub fn count_by_state(&self) -> HashMap<CircuitState, usize> {
        let mut counts = HashMap::new();
        for stats in self.circuit_breakers.values() {
            *counts.entry(stats.state).or_insert(0) += 1;
        }
        counts
    }

    /// Get list of unhealthy circuit breakers
    pub fn unhealthy_circuits(&self) -> Vec<&CircuitBreakerStats> {
        self.circuit_breakers
            .values()
            .filter(|stats| !stats.is_healthy())
            .collect()
    }

    /// System-wide health score (0.0 to 1.0)
    pub fn health_score(&self) -> f64 {
        if self.circuit_breakers.is_empty() {
            return 1.0;
        }

        let healthy_count = self
            .circuit_breakers
            .values()
            .filter(|stats| stats.is_healthy())
            .count();

        healthy_count as f64 / self.circuit_breakers.len() as f64
    }

    pub fn total_requests(&self) -> u64 {
        self.circuit_breakers.values().map(|s| s.total_requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.circuit_breakers.values().map(|s| s.total_failures).sum()
    }

    /// Format summary for logging
    pub fn format_summary(&self) -> String {
        let state_counts = self.count_by_state();
        format!(
            "Circuit Breakers: {} total | {} closed | {} open | {} half-open | Health: {:.1}%",
            self.circuit_breakers.len(),
            state_counts.get(&CircuitState::Closed).unwrap_or(&0),
            state_counts.get(&CircuitState::Open).unwrap_or(&0),
            state_counts.get(&CircuitState::HalfOpen).unwrap_or(&0),
            self.health_score() * 100.0
        )
    }
}

impl Default for SystemCircuitBreakerStats {
    fn default() -> Self {
        Self::new()
    }
}
