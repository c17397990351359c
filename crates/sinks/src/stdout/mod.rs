//! Stdout Sink - One line per result
//!
//! Writes every result to standard output, either as plain text or as one
//! JSON object per line. Output is buffered and flushed after each
//! delivery and after each batch window.
//!
//! # Example Output
//!
//! ```text
//! 1718000000000 host.cpu.usage 12.5 gauge
//! 1718000000000 host.memory.used 8123456 gauge
//! {"name":"host.cpu.usage","kind":"gauge","value":12.5,"epoch_millis":1718000000000}
//! ```

use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use async_trait::async_trait;
use harvest_config::{StdoutFormat, StdoutSinkConfig};
use harvest_metrics::SinkMetrics;
use harvest_protocol::MetricResult;
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;

use crate::error::Result;
use crate::metrics::SinkMetricsHandle;
use crate::traits::{BatchSink, MetricSink};

/// Sink type name
pub const SINK_TYPE: &str = "stdout";

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for plain output
struct Styles {
    timestamp: Style,
    name: Style,
    value: Style,
    kind: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                name: Style::new().bold(),
                value: Style::new().green(),
                kind: Style::new().dimmed(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                name: Style::new(),
                value: Style::new(),
                kind: Style::new(),
            }
        }
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Sink printing results to stdout (or any writer)
pub struct StdoutSink {
    name: String,
    format: StdoutFormat,
    styles: Styles,
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    metrics: Arc<SinkMetrics>,
}

impl StdoutSink {
    /// Create a sink writing to the process's stdout
    pub fn new(name: impl Into<String>, format: StdoutFormat, color: bool) -> Self {
        Self::with_writer(name, format, color, Box::new(io::stdout()))
    }

    /// Create a sink from its configuration section
    pub fn from_config(name: impl Into<String>, config: &StdoutSinkConfig) -> Self {
        Self::new(name, config.format, config.color)
    }

    /// Create a sink writing to `writer`
    pub fn with_writer(
        name: impl Into<String>,
        format: StdoutFormat,
        color: bool,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            // colors only make sense for plain lines
            styles: Styles::new(color && format == StdoutFormat::Plain),
            writer: Mutex::new(BufWriter::new(writer)),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Counters of this sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle for the metrics reporter
    pub fn metrics_handle(&self) -> SinkMetricsHandle {
        SinkMetricsHandle::new(&self.name, SINK_TYPE, self.metrics())
    }

    /// Render one result as a line (without the trailing newline)
    pub fn format_line(&self, result: &MetricResult) -> Result<String> {
        match self.format {
            StdoutFormat::Plain => Ok(format!(
                "{} {} {} {}",
                result.epoch_millis().style(self.styles.timestamp),
                result.name().style(self.styles.name),
                result.value().style(self.styles.value),
                result.kind().style(self.styles.kind),
            )),
            StdoutFormat::Json => Ok(serde_json::to_string(result)?),
        }
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

#[async_trait]
impl MetricSink for StdoutSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &'static str {
        SINK_TYPE
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        let written = self
            .format_line(result)
            .and_then(|line| Ok(writeln!(self.writer.lock(), "{line}")?));

        match written {
            Ok(()) => {
                self.metrics.record_written(1);
                Ok(1)
            }
            Err(e) => {
                self.metrics.record_error();
                Err(e)
            }
        }
    }

    async fn post_collect(&self) -> Result<()> {
        self.flush()
    }

    async fn close(&self) -> Result<()> {
        self.flush()
    }
}

#[async_trait]
impl BatchSink for StdoutSink {
    async fn after_batch(&self) -> Result<()> {
        self.flush()
    }
}

impl std::fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink")
            .field("name", &self.name)
            .field("format", &self.format)
            .finish()
    }
}
