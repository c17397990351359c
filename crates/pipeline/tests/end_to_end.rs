//! End-to-end tests for the pipeline
//!
//! These tests drive a real coordinator over a static registry and check
//! what reaches a recording sink behind the usual decorator chain.

use std::sync::Arc;
use std::time::Duration;

use harvest_metrics::PipelineMetricsProvider;
use harvest_pipeline::{
    Coordinator, CoordinatorState, ManualClock, PipelineConfig, PoolConfig, Schedule,
};
use harvest_protocol::{Clock, MetricKind, MetricResult, Query};
use harvest_sinks::memory::{MemorySink, SinkEvent};
use harvest_sinks::{BatchDispatcher, CircuitBreaker, MetricSink};
use harvest_sources::StaticRegistry;

fn config() -> PipelineConfig {
    PipelineConfig {
        collection: PoolConfig::new(1, 16),
        // one delivery worker keeps the recorded order deterministic
        delivery: PoolConfig::new(1, 64),
        shutdown_timeout: Duration::from_secs(5),
    }
}

fn three_entities() -> Arc<StaticRegistry> {
    let registry = StaticRegistry::new();
    registry.set("queue:name=orders", "depth", 4i64);
    registry.set("queue:name=billing", "depth", 9i64);
    registry.set("queue:name=email", "depth", 1i64);
    Arc::new(registry)
}

/// Only the calls a batch dispatcher makes on its inner sink
fn batch_events(sink: &MemorySink) -> Vec<SinkEvent> {
    sink.events()
        .into_iter()
        .filter(|e| !matches!(e, SinkEvent::PreCollect | SinkEvent::PostCollect))
        .collect()
}

#[tokio::test]
async fn test_one_query_three_entities_batched_by_two() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_700_000_000_000));
    let memory = Arc::new(MemorySink::new("recording"));
    let chain: Arc<dyn MetricSink> = Arc::new(
        BatchDispatcher::new(
            CircuitBreaker::new(Arc::clone(&memory), Arc::clone(&clock)),
            2,
        )
        .unwrap(),
    );

    let query = Query::new("queue:*", ["depth"]).unwrap();
    let schedule = Schedule::new(Duration::from_secs(60), [query], [chain]).unwrap();
    let coordinator = Coordinator::new(config(), three_entities(), schedule, clock);

    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);

    // a full window of two is flushed by the third write, the last one on close
    let events = batch_events(&memory);
    assert_eq!(events.len(), 8, "events: {events:?}");
    assert_eq!(events[0], SinkEvent::BeforeBatch);
    assert!(matches!(events[1], SinkEvent::Write(_)));
    assert!(matches!(events[2], SinkEvent::Write(_)));
    assert_eq!(events[3], SinkEvent::AfterBatch);
    assert_eq!(events[4], SinkEvent::BeforeBatch);
    assert!(matches!(events[5], SinkEvent::Write(_)));
    assert_eq!(events[6], SinkEvent::AfterBatch);
    assert_eq!(events[7], SinkEvent::Close);

    let mut names: Vec<String> = memory.results().iter().map(|r| r.name().to_string()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "queue:name=billing.depth",
            "queue:name=email.depth",
            "queue:name=orders.depth",
        ]
    );
    assert!(memory.results().iter().all(|r| r.epoch_millis() == 1_700_000_000_000));
}

#[tokio::test]
async fn test_results_within_a_flush_are_time_ordered() {
    let clock = Arc::new(ManualClock::new(0));
    let memory = Arc::new(MemorySink::new("recording"));
    let dispatcher = BatchDispatcher::new(Arc::clone(&memory), 3).unwrap();

    // arrive out of order, as concurrent deliveries do
    for epoch in [300, 100, 200, 50] {
        clock.set(epoch);
        let result = MetricResult::new("x", MetricKind::Gauge, 1i64, clock.now_millis());
        dispatcher.write(&result).await.unwrap();
    }

    let epochs: Vec<i64> = memory.results().iter().map(|r| r.epoch_millis()).collect();
    assert_eq!(epochs, vec![100, 200, 300]);

    dispatcher.close().await.unwrap();
    let epochs: Vec<i64> = memory.results().iter().map(|r| r.epoch_millis()).collect();
    assert_eq!(epochs, vec![100, 200, 300, 50]);
}

#[tokio::test]
async fn test_expired_cycle_delivers_nothing() {
    // a deadline already behind the clock when workers pick the work up
    let clock = Arc::new(ManualClock::new(10_000));
    let memory = Arc::new(MemorySink::new("recording"));
    let sink: Arc<dyn MetricSink> = memory.clone();

    let query = Query::new("queue:*", ["depth"]).unwrap();
    let schedule = Schedule::new(Duration::from_secs(60), [query], [sink]).unwrap();
    let coordinator = Coordinator::new(config(), three_entities(), schedule, clock.clone());
    let handle = coordinator.metrics_handle();

    coordinator.start().unwrap();
    // the first cycle is queued; move time past its deadline before it runs
    clock.advance(60_001);
    coordinator.stop().await.unwrap();

    let snapshot = handle.pipeline_snapshot();
    assert_eq!(snapshot.queries_expired, 1);
    assert!(memory.results().is_empty());
}
