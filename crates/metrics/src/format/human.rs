//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [metrics] pipeline: cycles 12 | collected 1.2K (2.00/s) | delivered 2.4K | dropped 3
//! [metrics] sinks: console (1.2K, 0.95/s, ok) | rate (1.2K, 0.95/s, 4 err, 2 skipped)
//! ```

use super::{MetricsFormatter, format_count, format_rate};
use crate::{CollectedMetrics, MetricsRates};
use std::fmt::Write;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self
    }

    fn format_pipeline(
        &self,
        metrics: &CollectedMetrics,
        rates: Option<&MetricsRates>,
    ) -> Option<String> {
        let pipeline = metrics.pipeline.as_ref()?;

        let mut output = format!(
            "[metrics] pipeline: cycles {} | collected {}",
            pipeline.cycles,
            format_count(pipeline.results_collected),
        );
        if let Some(p) = rates.and_then(|r| r.pipeline.as_ref()) {
            let _ = write!(output, " ({})", format_rate(p.results_per_sec));
        }
        let _ = write!(
            output,
            " | delivered {} | dropped {}",
            format_count(pipeline.deliveries_succeeded),
            pipeline.dropped(),
        );
        if pipeline.deliveries_failed > 0 || pipeline.queries_failed > 0 {
            let _ = write!(
                output,
                " | failed {}q/{}d",
                pipeline.queries_failed, pipeline.deliveries_failed
            );
        }

        Some(output)
    }

    fn format_sinks(
        &self,
        metrics: &CollectedMetrics,
        rates: Option<&MetricsRates>,
    ) -> Option<String> {
        if metrics.sinks.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] sinks:");

        for (i, sink) in metrics.sinks.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(
                output,
                " {} ({}",
                sink.name,
                format_count(sink.snapshot.results_written)
            );

            if let Some(r) = rates.and_then(|r| r.sinks.iter().find(|s| s.name == sink.name)) {
                let _ = write!(output, ", {}", format_rate(r.results_per_sec));
            }

            if sink.snapshot.write_errors > 0 {
                let _ = write!(output, ", {} err", sink.snapshot.write_errors);
            } else {
                output.push_str(", ok");
            }

            if sink.snapshot.skipped > 0 {
                let _ = write!(output, ", {} skipped", sink.snapshot.skipped);
            }

            output.push(')');
        }

        Some(output)
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format_unified(&self, metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let lines: Vec<String> = [
            self.format_pipeline(metrics, rates),
            self.format_sinks(metrics, rates),
        ]
        .into_iter()
        .flatten()
        .collect();

        if lines.is_empty() {
            "[metrics] no activity".to_string()
        } else {
            lines.join("\n")
        }
    }
}
