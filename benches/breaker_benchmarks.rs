use circuit_guard::resilience::{CircuitBreaker, CircuitBreakerConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn benchmark_closed_execute(c: &mut Criterion) {
    let rt = runtime();
    let breaker = CircuitBreaker::new("bench", CircuitBreakerConfig::for_database());

    c.bench_function("execute_closed_success", |b| {
        b.iter(|| {
            rt.block_on(breaker.execute(|| async { Ok::<_, ()>(black_box(1u64)) }))
        })
    });
}

fn benchmark_open_rejection(c: &mut Criterion) {
    let rt = runtime();
    let breaker = CircuitBreaker::new(
        "bench",
        CircuitBreakerConfig {
            timeout: Duration::from_secs(300),
            ..CircuitBreakerConfig::default()
        },
    );
    breaker.trip();

    c.bench_function("execute_open_rejection", |b| {
        b.iter(|| {
            rt.block_on(breaker.execute(|| async { Ok::<_, ()>(black_box(1u64)) }))
        })
    });
}

fn benchmark_operation_timeout_overhead(c: &mut Criterion) {
    let rt = runtime();
    let breaker = CircuitBreaker::new("bench", CircuitBreakerConfig::for_external_api());

    c.bench_function("execute_with_operation_timeout", |b| {
        b.iter(|| {
            rt.block_on(breaker.execute(|| async { Ok::<_, ()>(black_box(1u64)) }))
        })
    });
}

fn benchmark_stats_snapshot(c: &mut Criterion) {
    let breaker = CircuitBreaker::new("bench", CircuitBreakerConfig::for_database());

    c.bench_function("stats_snapshot", |b| b.iter(|| black_box(breaker.stats())));
}

criterion_group!(
    benches,
    benchmark_closed_execute,
    benchmark_open_rejection,
    benchmark_operation_timeout_overhead,
    benchmark_stats_snapshot
);
criterion_main!(benches);
