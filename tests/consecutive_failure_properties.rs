mod common;

use circuit_guard::resilience::{CircuitBreaker, CircuitState};
use common::strategies::*;
use common::*;
use proptest::prelude::*;

/// Expected result of feeding one outcome to a breaker that never recovers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Ran,
    Rejected,
}

/// Reference model: the circuit opens exactly when the current run of
/// failures reaches the threshold, and stays open from then on.
fn model(threshold: u32, outcomes: &[CallOutcome]) -> (Vec<Expected>, Vec<CircuitState>) {
    let mut streak = 0;
    let mut open = false;
    let mut expected = Vec::with_capacity(outcomes.len());
    let mut states = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        if open {
            expected.push(Expected::Rejected);
        } else {
            expected.push(Expected::Ran);
            match outcome {
                CallOutcome::Success => streak = 0,
                CallOutcome::Failure => {
                    streak += 1;
                    open = streak >= threshold;
                }
            }
        }
        states.push(if open {
            CircuitState::Open
        } else {
            CircuitState::Closed
        });
    }
    (expected, states)
}

fn run_breaker(threshold: u32, outcomes: &[CallOutcome]) -> (Vec<Expected>, Vec<CircuitState>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    runtime.block_on(async {
        let breaker = CircuitBreaker::new("proptest", breaker_config(threshold, 1, 3_600_000));
        let mut observed = Vec::with_capacity(outcomes.len());
        let mut states = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            let result = match outcome {
                CallOutcome::Success => succeed(&breaker).await,
                CallOutcome::Failure => fail(&breaker).await,
            };
            observed.push(match result {
                Err(e) if e.is_circuit_open() => Expected::Rejected,
                _ => Expected::Ran,
            });
            states.push(breaker.state());
        }
        (observed, states)
    })
}

proptest! {
    /// Property: the breaker opens on exactly `threshold` consecutive failures
    #[test]
    fn breaker_matches_consecutive_failure_model(
        threshold in failure_threshold_strategy(),
        outcomes in call_sequence_strategy(),
    ) {
        let (expected_calls, expected_states) = model(threshold, &outcomes);
        let (observed_calls, observed_states) = run_breaker(threshold, &outcomes);
        prop_assert_eq!(observed_calls, expected_calls);
        prop_assert_eq!(observed_states, expected_states);
    }

    /// Property: cumulative counters always add up, whatever the call mix
    #[test]
    fn cumulative_counters_are_consistent(
        threshold in failure_threshold_strategy(),
        outcomes in call_sequence_strategy(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let stats = runtime.block_on(async {
            let breaker = CircuitBreaker::new("proptest", breaker_config(threshold, 1, 3_600_000));
            for outcome in &outcomes {
                let _ = match outcome {
                    CallOutcome::Success => succeed(&breaker).await,
                    CallOutcome::Failure => fail(&breaker).await,
                };
            }
            breaker.stats()
        });

        prop_assert_eq!(stats.total_requests, outcomes.len() as u64);
        prop_assert_eq!(stats.total_successes + stats.total_failures, stats.total_requests);
        prop_assert!(stats.total_rejections <= stats.total_failures);
        prop_assert!(stats.failures <= threshold);
    }
}
