//! Tests for the coordinator lifecycle

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use harvest_protocol::{Clock, ManualClock, MetricKind, MetricResult, Query};
use harvest_sinks::memory::{MemorySink, SinkEvent};
use harvest_sinks::{BatchDispatcher, MetricSink, SinkError};
use harvest_sources::StaticRegistry;

use super::{Coordinator, CoordinatorState, PipelineConfig};
use crate::error::PipelineError;
use crate::pool::PoolConfig;
use crate::schedule::Schedule;

// =============================================================================
// Helpers
// =============================================================================

/// Sink whose `close` always fails
struct UnclosableSink;

#[async_trait]
impl MetricSink for UnclosableSink {
    fn name(&self) -> &str {
        "unclosable"
    }

    fn sink_type(&self) -> &'static str {
        "test"
    }

    async fn write(&self, _result: &MetricResult) -> harvest_sinks::Result<usize> {
        Ok(1)
    }

    async fn close(&self) -> harvest_sinks::Result<()> {
        Err(SinkError::write("disk gone"))
    }
}

/// Sink whose writes never finish in any reasonable time
struct StuckSink;

#[async_trait]
impl MetricSink for StuckSink {
    fn name(&self) -> &str {
        "stuck"
    }

    fn sink_type(&self) -> &'static str {
        "test"
    }

    async fn write(&self, _result: &MetricResult) -> harvest_sinks::Result<usize> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(1)
    }
}

/// Sink whose `close` never finishes in any reasonable time
struct SlowClosingSink;

#[async_trait]
impl MetricSink for SlowClosingSink {
    fn name(&self) -> &str {
        "slow_close"
    }

    fn sink_type(&self) -> &'static str {
        "test"
    }

    async fn write(&self, _result: &MetricResult) -> harvest_sinks::Result<usize> {
        Ok(1)
    }

    async fn close(&self) -> harvest_sinks::Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

fn config() -> PipelineConfig {
    PipelineConfig {
        collection: PoolConfig::new(1, 16),
        delivery: PoolConfig::new(1, 16),
        shutdown_timeout: Duration::from_secs(5),
    }
}

fn source() -> Arc<StaticRegistry> {
    let registry = StaticRegistry::new();
    registry.set("db:name=orders", "connections", 12i64);
    Arc::new(registry)
}

fn schedule(sinks: Vec<Arc<dyn MetricSink>>) -> Schedule {
    let query = Query::new("db:*", ["connections"]).unwrap();
    Schedule::new(Duration::from_secs(60), [query], sinks).unwrap()
}

fn coordinator(sinks: Vec<Arc<dyn MetricSink>>) -> Coordinator {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(5_000));
    Coordinator::new(config(), source(), schedule(sinks), clock)
}

// =============================================================================
// State machine
// =============================================================================

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let sink = Arc::new(MemorySink::new("mem"));
    let coordinator = coordinator(vec![sink.clone()]);
    assert_eq!(coordinator.state(), CoordinatorState::New);
    assert!(!coordinator.is_shut_down());

    coordinator.start().unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Running);
    assert!(!coordinator.is_shut_down());

    coordinator.stop().await.unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);
    assert!(coordinator.is_shut_down());
    assert!(coordinator.is_drained());

    // the first cycle was delivered before the pools drained
    assert_eq!(sink.results().len(), 1);
    assert_eq!(sink.count(&SinkEvent::Close), 1);
}

#[tokio::test]
async fn test_start_twice_is_invalid() {
    let coordinator = coordinator(Vec::new());
    coordinator.start().unwrap();

    let err = coordinator.start().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidState {
            operation: "start",
            state: CoordinatorState::Running
        }
    ));

    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_before_start_is_invalid() {
    let coordinator = coordinator(Vec::new());

    let err = coordinator.stop().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidState {
            state: CoordinatorState::New,
            ..
        }
    ));
    assert_eq!(coordinator.state(), CoordinatorState::New);
}

#[tokio::test]
async fn test_terminated_rejects_everything() {
    let coordinator = coordinator(Vec::new());
    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();

    assert!(coordinator.start().is_err());
    assert!(coordinator.stop().await.is_err());
    assert!(coordinator.reconfigure(schedule(Vec::new())).is_err());
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);
}

#[test]
fn test_start_without_runtime_fails() {
    let coordinator = coordinator(Vec::new());

    let err = coordinator.start().unwrap_err();

    assert!(matches!(err, PipelineError::Runtime(_)));
    assert_eq!(coordinator.state(), CoordinatorState::Failed);
}

#[tokio::test]
async fn test_invalid_pool_size_fails_start() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let mut config = config();
    config.delivery = PoolConfig::new(0, 16);
    let coordinator = Coordinator::new(config, source(), schedule(Vec::new()), clock);

    assert!(matches!(
        coordinator.start(),
        Err(PipelineError::InvalidArgument(_))
    ));
    assert_eq!(coordinator.state(), CoordinatorState::Failed);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_stop_flushes_pending_batch() {
    let memory = Arc::new(MemorySink::new("mem"));
    let batched: Arc<dyn MetricSink> =
        Arc::new(BatchDispatcher::new(Arc::clone(&memory), 10).unwrap());
    let coordinator = coordinator(vec![batched]);

    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();

    assert_eq!(
        memory.events(),
        vec![
            SinkEvent::PreCollect,
            SinkEvent::PostCollect,
            SinkEvent::BeforeBatch,
            SinkEvent::Write(MetricResult::new(
                "db:name=orders.connections",
                MetricKind::Unknown,
                12i64,
                5_000
            )),
            SinkEvent::AfterBatch,
            SinkEvent::Close,
        ]
    );
}

#[tokio::test]
async fn test_close_failure_fails_stop() {
    let memory = Arc::new(MemorySink::new("mem"));
    let coordinator = coordinator(vec![Arc::new(UnclosableSink), memory.clone()]);

    coordinator.start().unwrap();
    let err = coordinator.stop().await.unwrap_err();

    assert!(matches!(err, PipelineError::Sink(_)));
    assert_eq!(coordinator.state(), CoordinatorState::Failed);
    // the other sink was still closed
    assert_eq!(memory.count(&SinkEvent::Close), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_bounded_by_shutdown_timeout() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let mut config = config();
    config.shutdown_timeout = Duration::from_secs(2);
    let coordinator =
        Coordinator::new(config, source(), schedule(vec![Arc::new(StuckSink)]), clock);

    coordinator.start().unwrap();
    let started = tokio::time::Instant::now();
    coordinator.stop().await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(3));
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);
    assert!(coordinator.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn test_slow_sink_close_is_bounded_by_shutdown_timeout() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
    let mut config = config();
    config.shutdown_timeout = Duration::from_secs(1);
    let memory = Arc::new(MemorySink::new("mem"));
    let sinks: Vec<Arc<dyn MetricSink>> = vec![Arc::new(SlowClosingSink), memory.clone()];
    let coordinator = Coordinator::new(config, source(), schedule(sinks), clock);

    coordinator.start().unwrap();
    let started = tokio::time::Instant::now();
    coordinator.stop().await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(2));
    assert_eq!(coordinator.state(), CoordinatorState::Terminated);
    // the stuck close does not keep the other sink from closing
    assert_eq!(memory.count(&SinkEvent::Close), 1);
}

#[tokio::test]
async fn test_sink_listed_twice_is_closed_once() {
    let sink = Arc::new(MemorySink::new("mem"));
    let coordinator = coordinator(vec![sink.clone(), sink.clone()]);

    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();

    assert_eq!(sink.count(&SinkEvent::Close), 1);
}

// =============================================================================
// Reconfiguration
// =============================================================================

#[tokio::test]
async fn test_reconfigure_before_start() {
    let old = Arc::new(MemorySink::new("old"));
    let new = Arc::new(MemorySink::new("new"));
    let coordinator = coordinator(vec![old.clone()]);

    coordinator.reconfigure(schedule(vec![new.clone()])).unwrap();
    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();

    assert!(old.results().is_empty());
    assert_eq!(new.results().len(), 1);
    // both were handed to the coordinator, both are closed
    assert_eq!(old.count(&SinkEvent::Close), 1);
    assert_eq!(new.count(&SinkEvent::Close), 1);
}

#[tokio::test]
async fn test_reconfigure_while_running() {
    let sink = Arc::new(MemorySink::new("mem"));
    let coordinator = coordinator(vec![sink.clone()]);
    coordinator.start().unwrap();

    let replacement = schedule(vec![sink.clone()]);
    coordinator.reconfigure(replacement).unwrap();
    assert_eq!(coordinator.schedule().sinks().len(), 1);

    coordinator.stop().await.unwrap();
    // shared sink is closed once
    assert_eq!(sink.count(&SinkEvent::Close), 1);
}

#[tokio::test]
async fn test_metrics_handle_outlives_stop() {
    use harvest_metrics::PipelineMetricsProvider;

    let coordinator = coordinator(vec![Arc::new(MemorySink::new("mem"))]);
    let handle = coordinator.metrics_handle();

    coordinator.start().unwrap();
    coordinator.stop().await.unwrap();

    let snapshot = handle.pipeline_snapshot();
    assert_eq!(snapshot.cycles, 1);
    assert_eq!(snapshot.queries_submitted, 1);
    assert_eq!(snapshot.deliveries_succeeded, 1);
}
