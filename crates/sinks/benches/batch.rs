//! Batch dispatcher benchmark suite
//!
//! Run with: `cargo bench -p harvest-sinks --bench batch`
//!
//! # What we measure
//!
//! - Evicting buffer add/drain (the window's hot path)
//! - Dispatcher throughput per result for several window sizes
//! - Full decorator chain: BatchDispatcher(CircuitBreaker(NullSink))

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use harvest_protocol::{MetricKind, MetricResult, SystemClock};
use harvest_sinks::null::NullSink;
use harvest_sinks::util::BoundedEvictingBuffer;
use harvest_sinks::{BatchDispatcher, CircuitBreaker, MetricSink};
use tokio::runtime::Runtime;

const RESULTS_PER_ITER: usize = 1_000;

fn results(count: usize) -> Vec<MetricResult> {
    (0..count)
        .map(|i| {
            // reverse order so every flush has to sort
            let epoch = (count - i) as i64;
            MetricResult::new(format!("bench.metric{}", i % 16), MetricKind::Gauge, epoch, epoch)
        })
        .collect()
}

// =============================================================================
// Buffer Benchmarks
// =============================================================================

fn bench_evicting_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("evicting_buffer");
    group.throughput(Throughput::Elements(RESULTS_PER_ITER as u64));

    for capacity in [16usize, 256] {
        group.bench_with_input(
            BenchmarkId::new("add_evict", capacity),
            &capacity,
            |b, &capacity| {
                let mut buffer = BoundedEvictingBuffer::new(capacity).unwrap();
                b.iter(|| {
                    for i in 0..RESULTS_PER_ITER {
                        black_box(buffer.add(i));
                    }
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Dispatcher Benchmarks
// =============================================================================

fn bench_dispatcher(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let input = results(RESULTS_PER_ITER);

    let mut group = c.benchmark_group("batch_dispatcher");
    group.throughput(Throughput::Elements(RESULTS_PER_ITER as u64));

    for batch_size in [10usize, 100, 500] {
        let dispatcher = BatchDispatcher::new(NullSink::new("bench"), batch_size).unwrap();
        group.bench_with_input(
            BenchmarkId::new("null", batch_size),
            &batch_size,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    for result in &input {
                        black_box(dispatcher.write(result).await.unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_decorated_chain(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let input = results(RESULTS_PER_ITER);

    let mut group = c.benchmark_group("decorated_chain");
    group.throughput(Throughput::Elements(RESULTS_PER_ITER as u64));

    let unbatched = CircuitBreaker::new(NullSink::new("bench"), Arc::new(SystemClock));
    group.bench_function("breaker_only", |b| {
        b.to_async(&rt).iter(|| async {
            for result in &input {
                black_box(unbatched.write(result).await.unwrap());
            }
        });
    });

    let batched = BatchDispatcher::new(
        CircuitBreaker::new(NullSink::new("bench"), Arc::new(SystemClock)),
        100,
    )
    .unwrap();
    group.bench_function("dispatcher_and_breaker", |b| {
        b.to_async(&rt).iter(|| async {
            for result in &input {
                black_box(batched.write(result).await.unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_evicting_buffer,
    bench_dispatcher,
    bench_decorated_chain
);
criterion_main!(benches);
