//! Normalize Phase Metrics
//!
//! Query understanding: how many queries were normalized, which categories they
//! landed in, and how many attributes the engine filled.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};
use crate::types::{Category, NormalizedQuery};

/// Metrics collection for the normalize phase
pub struct NormalizeMetrics;

impl NormalizeMetrics {
    pub fn record_query(query: &NormalizedQuery, resolution: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "queries"), "resolution" => resolution)
            .increment(1);
        Self::record_category(query.category());
        ::metrics::histogram!(phase_metric!(histogram, "normalize", "attributes_filled"))
            .record(filled_attributes(query) as f64);
    }

    fn record_category(category: Category) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "category"), "category" => category.as_str())
            .increment(1);
    }
}

/// Non-null attributes, brand and model included
fn filled_attributes(query: &NormalizedQuery) -> usize {
    serde_json::to_value(&query.attributes)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.values().filter(|v| !v.is_null()).count()))
        // the category tag is always present
        .map_or(0, |n| n.saturating_sub(1))
}

impl PhaseMetrics for NormalizeMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "normalize", "queries"));
        let _ = counter!(phase_metric!(counter, "normalize", "category"));
        let _ = histogram!(phase_metric!(histogram, "normalize", "attributes_filled"));
    }

    fn phase_name() -> &'static str {
        "normalize"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "normalize", "queries"),
                metric_type: MetricType::Counter,
                help: "Queries normalized, by exact answer or pattern engine",
                labels: vec!["resolution"],
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "category"),
                metric_type: MetricType::Counter,
                help: "Normalized queries per category",
                labels: vec!["category"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "normalize", "attributes_filled"),
                metric_type: MetricType::Histogram,
                help: "Non-null attributes per normalized query",
                labels: vec![],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeSet, CategoryAttributes};

    #[test]
    fn test_filled_attributes_ignores_category_tag() {
        let query = NormalizedQuery::new(
            "Nike Air Max 270",
            AttributeSet {
                brand: Some("Nike".to_string()),
                model: Some("Air Max 270".to_string()),
                details: CategoryAttributes::Sports {
                    size: None,
                    color: None,
                    kind: Some("Running Shoes".to_string()),
                },
            },
        );
        assert_eq!(filled_attributes(&query), 3);
        assert_eq!(
            filled_attributes(&NormalizedQuery::new("", AttributeSet::default())),
            0
        );
    }
}
