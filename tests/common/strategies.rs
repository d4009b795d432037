use proptest::prelude::*;

/// Outcome of one call fed to a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

pub fn call_outcome_strategy() -> impl Strategy<Value = CallOutcome> {
    prop_oneof![Just(CallOutcome::Success), Just(CallOutcome::Failure)]
}

/// Sequences biased toward failures so thresholds are actually reached
pub fn call_sequence_strategy() -> impl Strategy<Value = Vec<CallOutcome>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(CallOutcome::Success),
            3 => Just(CallOutcome::Failure),
        ],
        0..40,
    )
}

pub fn failure_threshold_strategy() -> impl Strategy<Value = u32> {
    1u32..8
}
