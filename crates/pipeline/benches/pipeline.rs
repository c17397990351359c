//! Pipeline benchmark suite
//!
//! Benchmarks for pool submission and query fan-out.
//!
//! Run with: `cargo bench -p harvest-pipeline`

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use harvest_pipeline::{
    CollectionStage, Deadline, PipelineMetrics, PoolConfig, ResultDispatchStage, SinkSet,
    SystemClock, WorkerPool,
};
use harvest_protocol::{Clock, Query};
use harvest_sinks::MetricSink;
use harvest_sinks::null::NullSink;
use harvest_sources::StaticRegistry;
use tokio::runtime::Runtime;

/// Registry with `entities` matching `app:*`
fn registry(entities: usize) -> Arc<StaticRegistry> {
    let registry = StaticRegistry::new();
    for i in 0..entities {
        registry.set(format!("app:id={i}"), "requests", i as i64);
    }
    Arc::new(registry)
}

fn null_sinks(count: usize) -> SinkSet {
    (0..count)
        .map(|i| Arc::new(NullSink::new(format!("null_{i}"))) as Arc<dyn MetricSink>)
        .collect()
}

/// Benchmark raw submission into a worker pool
fn bench_pool_submit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let _guard = rt.enter();
    let pool = WorkerPool::new("bench", PoolConfig::new(4, 100_000)).unwrap();

    let mut group = c.benchmark_group("pool_submit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("noop_job", |b| {
        b.iter(|| black_box(pool.submit(async {})));
    });
    group.finish();
}

/// Benchmark one query fanned out to several sinks, drained to completion
fn bench_query_fanout(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("query_fanout");

    for num_sinks in [1, 3, 10] {
        group.throughput(Throughput::Elements(num_sinks as u64 * 50));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_sinks),
            &num_sinks,
            |b, &num_sinks| {
                let source = registry(50);
                let sinks = null_sinks(num_sinks);
                let query = Arc::new(Query::new("app:*", ["requests"]).unwrap());

                b.to_async(&rt).iter(|| {
                    let source = Arc::clone(&source);
                    let sinks = Arc::clone(&sinks);
                    let query = Arc::clone(&query);
                    async move {
                        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
                        let metrics = Arc::new(PipelineMetrics::new());
                        let collection =
                            Arc::new(WorkerPool::new("collection", PoolConfig::new(1, 16)).unwrap());
                        let delivery = Arc::new(
                            WorkerPool::new("delivery", PoolConfig::new(4, 4096)).unwrap(),
                        );
                        let dispatch = ResultDispatchStage::new(
                            Arc::clone(&delivery),
                            Arc::clone(&clock),
                            Arc::clone(&metrics),
                        );
                        let stage = CollectionStage::new(
                            Arc::clone(&collection),
                            source,
                            Arc::clone(&clock),
                            dispatch,
                            metrics,
                        );

                        let deadline = Deadline::after(clock.as_ref(), Duration::from_secs(60)).unwrap();
                        stage.process(deadline, query, sinks).unwrap();

                        collection.shutdown();
                        collection.await_termination(Duration::from_secs(10)).await;
                        delivery.shutdown();
                        black_box(delivery.await_termination(Duration::from_secs(10)).await)
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pool_submit, bench_query_fanout);

criterion_main!(benches);
