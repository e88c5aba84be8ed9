//! Metrics registry for coordinating phase-specific metrics
//!
//! Registers every phase's metrics, validates naming consistency and detects
//! conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{NormalizeMetrics, StageMetrics};

/// Register all metrics from all phases
pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<NormalizeMetrics>(&mut all_metrics);
    register_phase_metrics::<StageMetrics>(&mut all_metrics);

    debug!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );
}

/// Every documented metric, phase by phase
pub fn catalog() -> Vec<MetricDoc> {
    let mut docs = NormalizeMetrics::metrics_documentation();
    docs.extend(StageMetrics::metrics_documentation());
    docs
}

/// Register metrics for a specific phase and detect conflicts
fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if !doc.name.starts_with(&format!("price_{}_", phase_name)) {
            warn!("Metric '{}' does not carry its phase prefix '{}'", doc.name, phase_name);
        }
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' is registered twice (phase '{}')",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}

/// Extract phase name from metric name (e.g., "price_stages_runs_total" -> "stages")
pub fn phase_of(metric_name: &str) -> &str {
    metric_name
        .strip_prefix("price_")
        .and_then(|rest| rest.find('_').map(|i| &rest[..i]))
        .unwrap_or("unknown")
}
