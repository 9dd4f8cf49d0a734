use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chaingate_core::cache::{deviate_ttl, CacheRouter};
use chaingate_core::resilience::{CircuitBreaker, CircuitBreakerPolicy};

fn benchmark_ttl_deviation(c: &mut Criterion) {
    c.bench_function("ttl_deviation", |b| {
        b.iter(|| deviate_ttl(black_box(60), black_box(10)))
    });
}

fn benchmark_cache_key_routing(c: &mut Criterion) {
    c.bench_function("balances_key_routing", |b| {
        b.iter(|| {
            CacheRouter::account_balances(
                black_box("1"),
                black_box("0xAbC123DeF456"),
                black_box(true),
                black_box(false),
            )
        })
    });
}

fn benchmark_closed_circuit_admission(c: &mut Criterion) {
    let breaker = CircuitBreaker::new("indexer", CircuitBreakerPolicy::default());
    c.bench_function("closed_circuit_admission", |b| {
        b.iter(|| {
            let admitted = breaker.can_proceed();
            breaker.record_success();
            black_box(admitted)
        })
    });
}

criterion_group!(
    benches,
    benchmark_ttl_deviation,
    benchmark_cache_key_routing,
    benchmark_closed_circuit_admission
);
criterion_main!(benches);
