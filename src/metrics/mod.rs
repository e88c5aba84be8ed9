//! Phase-organized metrics for the price pipeline
//!
//! Each phase owns its metric names in a dedicated submodule. A Prometheus
//! recorder is installed on demand so a short-lived CLI run can render a
//! snapshot in-process; without it every recording call is a no-op.

pub mod normalize;
pub mod registry;
pub mod stages;

pub use normalize::NormalizeMetrics;
pub use stages::StageMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Once, OnceLock};
use tracing::{debug, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and register every phase's metrics.
///
/// Idempotent. Returns whether a recorder is available for [`render`]; another
/// global recorder installed first makes this return false.
pub fn init_metrics() -> bool {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Prometheus handle was already stored");
            }
            registry::register_all_metrics();
            debug!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
    HANDLE.get().is_some()
}

/// Prometheus text exposition of everything recorded so far
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

/// Trait for phase-specific metrics collections
///
/// Each phase implements this trait to provide:
/// - Metric registration at startup
/// - Consistent naming conventions
/// - Documentation of what each metric measures
pub trait PhaseMetrics {
    /// Pre-register all metrics for this phase so they show up before first use
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Build a metric name following `price_{phase}_{name}`, with `_total` on counters
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("price_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("price_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("price_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
