//! # Circuit Breaker Implementation
//!
//! Provides fault isolation for a single downstream dependency so that a degraded
//! dependency fails fast instead of piling up slow or failing calls.
//! Three states: Closed (normal operation), Open (failing fast), and Half-Open
//! (probing recovery with one trial call at a time).
//!
//! Bookkeeping lives behind a `parking_lot::Mutex` that is never held across an
//! `.await`; cumulative counters are lock-free atomics. Every transition bumps a
//! generation number, and an outcome is only applied to the state machine if the
//! breaker is still in the generation that admitted the call.

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerStats};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single trial call at a time is allowed through
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open (or its half-open trial slot is taken); the operation never ran
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// The operation did not settle within the configured operation timeout
    #[error("Operation timed out after {}ms for {component}", .timeout.as_millis())]
    Timeout { component: String, timeout: Duration },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    /// True when the call was rejected by admission control
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::CircuitOpen { .. })
    }

    /// True when the operation lost the race against the operation timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, CircuitBreakerError::Timeout { .. })
    }

    /// Borrow the wrapped operation's own error, if that is what failed
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            CircuitBreakerError::OperationFailed(error) => Some(error),
            _ => None,
        }
    }

    /// Unwrap the operation's own error, if that is what failed
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CircuitBreakerError::OperationFailed(error) => Some(error),
            _ => None,
        }
    }
}

/// Lock-free cumulative counters. Never reset by state transitions.
#[derive(Debug, Default)]
struct AtomicCallCounters {
    total_requests: AtomicU64,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    total_rejections: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicCallCounters {
    #[inline]
    fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_rejection(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        self.total_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_success(&self, duration: Duration) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self, duration: Duration) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }
}

/// Mutable state machine data guarded by the breaker mutex
#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    failures: u32,
    successes: u32,
    /// `None` while Open means the timeout is beyond the clock's range: no automatic recovery
    next_attempt: Option<Instant>,
    next_attempt_at: Option<DateTime<Utc>>,
    last_failure_time: Option<DateTime<Utc>>,
    last_success_time: Option<DateTime<Utc>>,
    generation: u64,
    trial_in_flight: bool,
}

impl BreakerCore {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            successes: 0,
            next_attempt: None,
            next_attempt_at: None,
            last_failure_time: None,
            last_success_time: None,
            generation: 0,
            trial_in_flight: false,
        }
    }
}

/// How an admitted call's outcome is applied to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
    /// Error excluded from failure accounting by the caller's classifier
    Ignored,
}

/// Admission ticket for one call. Releases the half-open trial slot on drop, so a
/// cancelled trial cannot wedge the breaker in HalfOpen.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.trial {
            let mut core = self.breaker.core.lock();
            if core.generation == self.generation {
                core.trial_in_flight = false;
            }
        }
    }
}

/// Core circuit breaker implementation
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    /// State machine data
    core: Mutex<BreakerCore>,

    /// Lock-free cumulative counters
    counters: AtomicCallCounters,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            timeout_ms = config.timeout.as_millis() as u64,
            operation_timeout_ms = config.operation_timeout.map(|t| t.as_millis() as u64),
            "Circuit breaker initialized"
        );

        Self {
            name,
            config,
            core: Mutex::new(BreakerCore::new()),
            counters: AtomicCallCounters::default(),
        }
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the immutable configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.core.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    pub fn is_half_open(&self) -> bool {
        self.state() == CircuitState::HalfOpen
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Every error the operation returns counts as a failure.
    pub async fn execute<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_classified(operation, |_: &E| true).await
    }

    /// Execute an operation, letting `counts_as_failure` decide whether an operation
    /// error feeds the failure streak. Errors it rejects are still returned to the
    /// caller and counted in `total_failures`, but leave the state machine untouched.
    /// Timeouts always count as failures.
    pub async fn execute_classified<F, T, E, Fut, C>(
        &self,
        operation: F,
        counts_as_failure: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        self.counters.record_request();

        let Some(mut permit) = self.admit() else {
            self.counters.record_rejection();
            debug!(component = %self.name, "Call rejected (failing fast)");
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        };

        let start_time = Instant::now();
        let result = match self.config.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(outcome) => outcome.map_err(CircuitBreakerError::OperationFailed),
                Err(_) => Err(CircuitBreakerError::Timeout {
                    component: self.name.clone(),
                    timeout: limit,
                }),
            },
            None => operation()
                .await
                .map_err(CircuitBreakerError::OperationFailed),
        };
        let duration = start_time.elapsed();

        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(CircuitBreakerError::OperationFailed(error)) if !counts_as_failure(error) => {
                Outcome::Ignored
            }
            Err(_) => Outcome::Failure,
        };
        self.record_outcome(&mut permit, outcome, duration);
        drop(permit);

        result
    }

    /// Admission control. Evaluated once per call; admitting an Open breaker whose
    /// recovery timer has elapsed performs the Open -> HalfOpen transition.
    fn admit(&self) -> Option<CallPermit<'_>> {
        let mut core = self.core.lock();
        match core.state {
            CircuitState::Closed => Some(CallPermit {
                breaker: self,
                generation: core.generation,
                trial: false,
            }),
            CircuitState::Open => {
                let ready = core
                    .next_attempt
                    .is_some_and(|next_attempt| Instant::now() >= next_attempt);
                if !ready {
                    return None;
                }
                self.transition_to_half_open(&mut core);
                core.trial_in_flight = true;
                Some(CallPermit {
                    breaker: self,
                    generation: core.generation,
                    trial: true,
                })
            }
            CircuitState::HalfOpen => {
                if core.trial_in_flight {
                    debug!(component = %self.name, "Half-open trial already in flight");
                    return None;
                }
                core.trial_in_flight = true;
                Some(CallPermit {
                    breaker: self,
                    generation: core.generation,
                    trial: true,
                })
            }
        }
    }

    fn record_outcome(&self, permit: &mut CallPermit<'_>, outcome: Outcome, duration: Duration) {
        match outcome {
            Outcome::Success => self.counters.record_success(duration),
            Outcome::Failure | Outcome::Ignored => self.counters.record_failure(duration),
        }

        let mut core = self.core.lock();
        match outcome {
            Outcome::Success => core.last_success_time = Some(Utc::now()),
            Outcome::Failure | Outcome::Ignored => core.last_failure_time = Some(Utc::now()),
        }

        debug!(
            component = %self.name,
            outcome = ?outcome,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );

        // The slot is released under this guard; the permit's drop only covers cancellation
        let trial = std::mem::replace(&mut permit.trial, false);
        if core.generation != permit.generation {
            debug!(
                component = %self.name,
                state = %core.state,
                "Outcome belongs to an earlier breaker generation, state unchanged"
            );
            return;
        }
        if trial {
            core.trial_in_flight = false;
        }

        match (outcome, core.state) {
            (Outcome::Success, CircuitState::HalfOpen) => {
                core.successes += 1;
                if core.successes >= self.config.success_threshold {
                    self.transition_to_closed(&mut core);
                }
            }
            (Outcome::Success, CircuitState::Closed) => {
                // Reset failure streak on success
                core.failures = 0;
            }
            (Outcome::Failure, CircuitState::Closed) => {
                core.failures += 1;
                if core.failures >= self.config.failure_threshold {
                    self.transition_to_open(&mut core);
                }
            }
            (Outcome::Failure, CircuitState::HalfOpen) => {
                // Any failure in half-open state immediately opens circuit
                core.failures += 1;
                self.transition_to_open(&mut core);
            }
            (Outcome::Ignored, _) => {
                debug!(component = %self.name, "Error excluded from failure accounting");
            }
            (_, CircuitState::Open) => {
                warn!(component = %self.name, "Outcome recorded while circuit is open");
            }
        }
    }

    /// Transition to closed state (normal operation)
    fn transition_to_closed(&self, core: &mut BreakerCore) {
        let from = core.state;
        core.state = CircuitState::Closed;
        core.failures = 0;
        core.successes = 0;
        core.next_attempt = None;
        core.next_attempt_at = None;
        core.trial_in_flight = false;
        core.generation += 1;

        info!(
            component = %self.name,
            from = %from,
            total_requests = self.counters.total_requests.load(Ordering::Relaxed),
            "Circuit breaker closed (recovered)"
        );
    }

    /// Transition to open state (failing fast)
    fn transition_to_open(&self, core: &mut BreakerCore) {
        let from = core.state;
        let timeout = self.config.timeout;
        core.state = CircuitState::Open;
        core.successes = 0;
        core.next_attempt = Instant::now().checked_add(timeout);
        core.next_attempt_at = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|reopen_in| Utc::now().checked_add_signed(reopen_in));
        core.trial_in_flight = false;
        core.generation += 1;

        error!(
            component = %self.name,
            from = %from,
            failures = core.failures,
            failure_threshold = self.config.failure_threshold,
            timeout_ms = timeout.as_millis() as u64,
            "Circuit breaker opened (failing fast)"
        );
    }

    /// Transition to half-open state (testing recovery)
    fn transition_to_half_open(&self, core: &mut BreakerCore) {
        core.state = CircuitState::HalfOpen;
        core.failures = 0;
        core.successes = 0;
        core.trial_in_flight = false;
        core.generation += 1;

        info!(
            component = %self.name,
            success_threshold = self.config.success_threshold,
            "Circuit breaker half-open (testing recovery)"
        );
    }

    /// Force circuit to closed state, regardless of counters (operational recovery)
    pub fn reset(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut core = self.core.lock();
        self.transition_to_closed(&mut core);
    }

    /// Force circuit to open state, regardless of counters (maintenance or drain)
    pub fn trip(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut core = self.core.lock();
        self.transition_to_open(&mut core);
    }

    /// Get an owned snapshot of the counters and current state
    pub fn stats(&self) -> CircuitBreakerStats {
        let core = self.core.lock();
        let total_successes = self.counters.total_successes.load(Ordering::Relaxed);
        let total_duration_nanos = self.counters.total_duration_nanos.load(Ordering::Relaxed);
        let completed = (total_successes + self.counters.total_failures.load(Ordering::Relaxed))
            .saturating_sub(self.counters.total_rejections.load(Ordering::Relaxed));
        let average_duration = if completed > 0 {
            Duration::from_nanos(total_duration_nanos / completed)
        } else {
            Duration::ZERO
        };

        CircuitBreakerStats {
            name: self.name.clone(),
            state: core.state,
            failures: core.failures,
            successes: core.successes,
            total_requests: self.counters.total_requests.load(Ordering::Relaxed),
            total_failures: self.counters.total_failures.load(Ordering::Relaxed),
            total_successes,
            total_rejections: self.counters.total_rejections.load(Ordering::Relaxed),
            last_failure_time: core.last_failure_time,
            last_success_time: core.last_success_time,
            next_attempt_at: core.next_attempt_at,
            average_duration,
        }
    }
}
