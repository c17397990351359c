//! Sink contracts
//!
//! `MetricSink` is what the delivery stage writes to. `BatchSink` adds the
//! bracketing hooks a `BatchDispatcher` calls around every flushed window.
//!
//! Sinks are shared by every delivery worker, so all methods take `&self`
//! and implementations must tolerate concurrent calls. Both traits are
//! implemented for `Box<T>` and `Arc<T>`, so decorators can wrap boxed or
//! shared sinks as well as concrete ones.

use std::sync::Arc;

use async_trait::async_trait;
use harvest_protocol::MetricResult;

use crate::error::Result;

/// Destination for collected results
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Configured instance name
    fn name(&self) -> &str;

    /// Sink type (e.g. "stdout", "null")
    fn sink_type(&self) -> &'static str;

    /// Called before every delivery
    async fn pre_collect(&self) -> Result<()> {
        Ok(())
    }

    /// Write one result, returning how many results were emitted
    async fn write(&self, result: &MetricResult) -> Result<usize>;

    /// Called after every delivery, whether or not the write succeeded
    async fn post_collect(&self) -> Result<()> {
        Ok(())
    }

    /// Flush anything buffered and release resources
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Sink that can receive results in ordered groups
#[async_trait]
pub trait BatchSink: MetricSink {
    /// Called once before the results of a window are written
    async fn before_batch(&self) -> Result<()> {
        Ok(())
    }

    /// Called once after the results of a window were written
    async fn after_batch(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: MetricSink + ?Sized> MetricSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sink_type(&self) -> &'static str {
        (**self).sink_type()
    }

    async fn pre_collect(&self) -> Result<()> {
        (**self).pre_collect().await
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        (**self).write(result).await
    }

    async fn post_collect(&self) -> Result<()> {
        (**self).post_collect().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: BatchSink + ?Sized> BatchSink for Box<T> {
    async fn before_batch(&self) -> Result<()> {
        (**self).before_batch().await
    }

    async fn after_batch(&self) -> Result<()> {
        (**self).after_batch().await
    }
}

#[async_trait]
impl<T: MetricSink + ?Sized> MetricSink for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sink_type(&self) -> &'static str {
        (**self).sink_type()
    }

    async fn pre_collect(&self) -> Result<()> {
        (**self).pre_collect().await
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        (**self).write(result).await
    }

    async fn post_collect(&self) -> Result<()> {
        (**self).post_collect().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

#[async_trait]
impl<T: BatchSink + ?Sized> BatchSink for Arc<T> {
    async fn before_batch(&self) -> Result<()> {
        (**self).before_batch().await
    }

    async fn after_batch(&self) -> Result<()> {
        (**self).after_batch().await
    }
}
