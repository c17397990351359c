//! JSON metrics formatter
//!
//! Formats metrics as a single JSON object per report.
//!
//! # Example Output
//!
//! ```json
//! {"type":"unified","pipeline":{"cycles":12,...},"sinks":[{"name":"console",...}]}
//! ```

use super::MetricsFormatter;
use crate::{CollectedMetrics, MetricsRates, PipelineSnapshot, SinkMetricsSnapshot};
use serde::Serialize;

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct UnifiedJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<PipelineJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkJson<'a>>,
}

#[derive(Serialize)]
struct PipelineJson {
    #[serde(flatten)]
    totals: PipelineSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    results_per_sec: Option<f64>,
}

#[derive(Serialize)]
struct SinkJson<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    sink_type: &'a str,
    #[serde(flatten)]
    totals: SinkMetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    results_per_sec: Option<f64>,
}

impl MetricsFormatter for JsonFormatter {
    fn format_unified(&self, metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let json = UnifiedJson {
            report_type: "unified",
            elapsed_secs: rates.map(|r| r.elapsed.as_secs_f64()),
            pipeline: metrics.pipeline.map(|totals| PipelineJson {
                totals,
                results_per_sec: rates
                    .and_then(|r| r.pipeline.as_ref())
                    .map(|p| p.results_per_sec),
            }),
            sinks: metrics
                .sinks
                .iter()
                .map(|s| SinkJson {
                    name: &s.name,
                    sink_type: &s.sink_type,
                    totals: s.snapshot,
                    results_per_sec: rates
                        .and_then(|r| r.sinks.iter().find(|sr| sr.name == s.name))
                        .map(|sr| sr.results_per_sec),
                })
                .collect(),
        };

        serde_json::to_string(&json).unwrap_or_else(|e| {
            format!(r#"{{"type":"unified","error":"{}"}}"#, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectedSink;

    #[test]
    fn test_format_unified() {
        let metrics = CollectedMetrics {
            timestamp: None,
            pipeline: Some(PipelineSnapshot {
                cycles: 3,
                results_collected: 9,
                ..Default::default()
            }),
            sinks: vec![CollectedSink {
                name: "console".into(),
                sink_type: "stdout".into(),
                snapshot: SinkMetricsSnapshot {
                    results_written: 9,
                    ..Default::default()
                },
            }],
        };

        let output = JsonFormatter::new().format_unified(&metrics, None);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["type"], "unified");
        assert_eq!(value["pipeline"]["cycles"], 3);
        assert_eq!(value["pipeline"]["results_collected"], 9);
        assert!(value["pipeline"].get("results_per_sec").is_none());
        assert_eq!(value["sinks"][0]["name"], "console");
        assert_eq!(value["sinks"][0]["type"], "stdout");
        assert_eq!(value["sinks"][0]["results_written"], 9);
    }

    #[test]
    fn test_format_empty() {
        let output = JsonFormatter::new().format_unified(&CollectedMetrics::default(), None);
        assert_eq!(output, r#"{"type":"unified"}"#);
    }
}
