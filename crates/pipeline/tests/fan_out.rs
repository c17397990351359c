//! Fan-out independence
//!
//! One sink that fails every call must not hold up or starve the others,
//! and its circuit breaker must take it out of the rotation.

use std::sync::Arc;
use std::time::Duration;

use harvest_metrics::PipelineMetricsProvider;
use harvest_pipeline::{Coordinator, PipelineConfig, PoolConfig, Schedule, TokioClock};
use harvest_protocol::{Clock, Query};
use harvest_sinks::memory::MemorySink;
use harvest_sinks::{BatchDispatcher, CircuitBreaker, MAX_FAILURES, MetricSink};
use harvest_sources::StaticRegistry;

const PERIOD: Duration = Duration::from_secs(10);

fn registry() -> Arc<StaticRegistry> {
    let registry = StaticRegistry::new();
    for host in ["a", "b", "c"] {
        registry.set(format!("host:name={host}"), "load", 1.5);
    }
    Arc::new(registry)
}

fn dead_sink() -> Arc<MemorySink> {
    let sink = Arc::new(MemorySink::new("dead"));
    sink.set_fail_writes(true);
    sink.set_fail_hooks(true);
    sink
}

#[tokio::test(start_paused = true)]
async fn test_failing_sink_does_not_affect_others() {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(0));
    let healthy_a = Arc::new(MemorySink::new("healthy_a"));
    let healthy_b = Arc::new(MemorySink::new("healthy_b"));
    let dead = dead_sink();
    let breaker = Arc::new(CircuitBreaker::new(Arc::clone(&dead), Arc::clone(&clock)));

    let sinks: Vec<Arc<dyn MetricSink>> =
        vec![healthy_a.clone(), breaker.clone(), healthy_b.clone()];
    let query = Query::new("host:*", ["load"]).unwrap();
    let schedule = Schedule::new(PERIOD, [query], sinks).unwrap();

    let config = PipelineConfig {
        collection: PoolConfig::new(1, 16),
        delivery: PoolConfig::new(1, 64),
        shutdown_timeout: Duration::from_secs(5),
    };
    let coordinator = Coordinator::new(config, registry(), schedule, clock);
    let handle = coordinator.metrics_handle();

    coordinator.start().unwrap();
    // wakes at 0s, 10s and 20s
    tokio::time::sleep(PERIOD * 2 + PERIOD / 2).await;
    coordinator.stop().await.unwrap();

    assert_eq!(healthy_a.results().len(), 9);
    assert_eq!(healthy_b.results().len(), 9);

    // every call that reached the dead sink failed, until the breaker opened
    assert!(breaker.is_disabled());
    let reached = dead
        .events()
        .into_iter()
        .filter(|e| !matches!(e, harvest_sinks::memory::SinkEvent::Close))
        .count();
    assert_eq!(reached, MAX_FAILURES as usize);

    let snapshot = handle.pipeline_snapshot();
    assert_eq!(snapshot.cycles, 3);
    assert_eq!(snapshot.deliveries_submitted, 27);
    assert_eq!(snapshot.deliveries_succeeded, 18 + 6);
    assert_eq!(snapshot.deliveries_failed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_failing_sink_comes_back_after_cool_down() {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(0));
    let dead = dead_sink();
    let breaker = Arc::new(CircuitBreaker::with_limits(
        Arc::clone(&dead),
        Arc::clone(&clock),
        2,
        Duration::from_secs(15),
    ));

    let sinks: Vec<Arc<dyn MetricSink>> = vec![breaker.clone()];
    let query = Query::new("host:name=a", ["load"]).unwrap();
    let schedule = Schedule::new(PERIOD, [query], sinks).unwrap();
    let coordinator = Coordinator::new(PipelineConfig::default(), registry(), schedule, clock);

    // cycle at 0s: pre_collect fails, post_collect fails, breaker opens until 15s
    coordinator.start().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(breaker.is_disabled());

    // cycle at 10s is skipped entirely
    tokio::time::sleep(PERIOD).await;
    assert_eq!(dead.events().len(), 2);

    // cycle at 20s reaches the sink again
    tokio::time::sleep(PERIOD).await;
    assert_eq!(dead.events().len(), 4);

    coordinator.stop().await.unwrap();
}

// ============================================================================
// Sinks that accept hooks but reject every result
// ============================================================================

fn rejecting_sink() -> Arc<MemorySink> {
    let sink = Arc::new(MemorySink::new("rejecting"));
    sink.set_fail_writes(true);
    sink
}

fn single_worker_config() -> PipelineConfig {
    PipelineConfig {
        collection: PoolConfig::new(1, 16),
        delivery: PoolConfig::new(1, 64),
        shutdown_timeout: Duration::from_secs(5),
    }
}

fn writes_reaching(sink: &MemorySink) -> usize {
    sink.events()
        .iter()
        .filter(|e| matches!(e, harvest_sinks::memory::SinkEvent::Write(_)))
        .count()
}

/// Four cycles of three results each, at 0s, 10s, 20s and 30s
async fn run_four_cycles(sink: Arc<dyn MetricSink>, clock: Arc<dyn Clock>) {
    let query = Query::new("host:*", ["load"]).unwrap();
    let schedule = Schedule::new(PERIOD, [query], [sink]).unwrap();
    let coordinator = Coordinator::new(single_worker_config(), registry(), schedule, clock);

    coordinator.start().unwrap();
    tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rejected_writes_trip_breaker_unbatched() {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(0));
    let rejecting = rejecting_sink();
    let breaker = Arc::new(CircuitBreaker::new(Arc::clone(&rejecting), Arc::clone(&clock)));

    run_four_cycles(breaker.clone(), clock).await;

    // three failures in the first cycle, the trip on the second write of the next
    assert!(breaker.is_disabled());
    assert_eq!(writes_reaching(&rejecting), MAX_FAILURES as usize);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_writes_trip_breaker_batched() {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(0));
    let rejecting = rejecting_sink();
    let breaker = Arc::new(CircuitBreaker::new(Arc::clone(&rejecting), Arc::clone(&clock)));
    let batched: Arc<dyn MetricSink> =
        Arc::new(BatchDispatcher::new(Arc::clone(&breaker), 2).unwrap());

    run_four_cycles(batched, clock).await;

    // before/after hooks of each window succeed but do not hide the failed writes
    assert!(breaker.is_disabled());
    assert_eq!(writes_reaching(&rejecting), MAX_FAILURES as usize);
}
