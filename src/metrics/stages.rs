//! Stage Metrics
//!
//! Per-stage timing, item flow and failures for every pipeline run.

use crate::error::ErrorKind;
use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::pipeline::stage::Stage;

/// Metrics collection for the orchestrated stages
pub struct StageMetrics;

impl StageMetrics {
    /// Record a stage that ran to completion
    pub fn record_stage(stage: Stage, items_in: usize, items_out: usize, duration_secs: f64) {
        let label = stage.as_str();
        ::metrics::counter!(phase_metric!(counter, "stages", "completed"), "stage" => label)
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "stages", "items_in"), "stage" => label)
            .increment(items_in as u64);
        ::metrics::counter!(phase_metric!(counter, "stages", "items_out"), "stage" => label)
            .increment(items_out as u64);
        ::metrics::histogram!(phase_metric!(histogram, "stages", "duration_seconds"), "stage" => label)
            .record(duration_secs);
    }

    pub fn record_failure(stage: Stage, kind: ErrorKind) {
        ::metrics::counter!(
            phase_metric!(counter, "stages", "failures"),
            "stage" => stage.as_str(),
            "kind" => kind.as_str()
        )
        .increment(1);
    }

    /// How a fallback-capable stage produced one output (exact, fallback, computed)
    pub fn record_resolution(stage: Stage, resolution: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "stages", "resolutions"),
            "stage" => stage.as_str(),
            "resolution" => resolution
        )
        .increment(1);
    }

    pub fn record_run(success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "failure" };
        ::metrics::counter!(phase_metric!(counter, "stages", "runs"), "outcome" => outcome)
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "stages", "run_duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for StageMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "stages", "completed"));
        let _ = counter!(phase_metric!(counter, "stages", "items_in"));
        let _ = counter!(phase_metric!(counter, "stages", "items_out"));
        let _ = counter!(phase_metric!(counter, "stages", "failures"));
        let _ = counter!(phase_metric!(counter, "stages", "resolutions"));
        let _ = counter!(phase_metric!(counter, "stages", "runs"));

        let _ = histogram!(phase_metric!(histogram, "stages", "duration_seconds"));
        let _ = histogram!(phase_metric!(histogram, "stages", "run_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "stages"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "stages", "completed"),
                metric_type: MetricType::Counter,
                help: "Stages that ran to completion",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: phase_metric!(counter, "stages", "items_in"),
                metric_type: MetricType::Counter,
                help: "Items handed to each stage",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: phase_metric!(counter, "stages", "items_out"),
                metric_type: MetricType::Counter,
                help: "Items produced by each stage",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: phase_metric!(counter, "stages", "failures"),
                metric_type: MetricType::Counter,
                help: "Stage failures by error kind",
                labels: vec!["stage", "kind"],
            },
            MetricDoc {
                name: phase_metric!(counter, "stages", "resolutions"),
                metric_type: MetricType::Counter,
                help: "Outputs produced from exact answers, fallbacks or live computation",
                labels: vec!["stage", "resolution"],
            },
            MetricDoc {
                name: phase_metric!(counter, "stages", "runs"),
                metric_type: MetricType::Counter,
                help: "Pipeline runs by outcome",
                labels: vec!["outcome"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "stages", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time spent in each stage",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "stages", "run_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of a whole run",
                labels: vec![],
            },
        ]
    }
}
