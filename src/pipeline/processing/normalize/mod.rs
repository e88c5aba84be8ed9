//! Query understanding: free text in, [`NormalizedQuery`] out.

pub mod attributes;
pub mod classifier;
pub mod patterns;

pub use attributes::AttributeExtractionEngine;
pub use classifier::CategoryClassifier;

use crate::config::NormalizerConfig;
use crate::error::Result;
use crate::pipeline::stage::Stage;
use crate::types::NormalizedQuery;

use super::fallback::{AnswerTable, PrecomputedAnswerProvider, Resolution, Resolver};

/// Trim, turn commas into spaces, and collapse whitespace runs to one space.
pub fn normalize_text(query: &str) -> String {
    query
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifier plus attribute engine over the normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryNormalizer {
    classifier: CategoryClassifier,
    engine: AttributeExtractionEngine,
}

impl QueryNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&self, query: &str) -> NormalizedQuery {
        let text = normalize_text(query);
        let category = self.classifier.classify(&text);
        let attributes = self.engine.extract(&text, category);
        NormalizedQuery::new(text, attributes)
    }
}

/// The pattern engine is the normalizer's live implementation.
impl Resolver<String, NormalizedQuery> for QueryNormalizer {
    fn stage(&self) -> Stage {
        Stage::Normalize
    }

    fn resolve(&self, input: &String) -> Result<Resolution<NormalizedQuery>> {
        Ok(Resolution::Computed(self.normalize(input)))
    }
}

/// Mock mode answers registered raw queries verbatim and runs the pattern engine
/// for everything else; live mode always runs the engine.
pub fn build_normalizer(config: &NormalizerConfig) -> Box<dyn Resolver<String, NormalizedQuery>> {
    if !config.use_mock {
        return Box::new(QueryNormalizer::new());
    }

    let table: AnswerTable<String, NormalizedQuery> = config
        .answers
        .iter()
        .map(|answer| {
            let mut output = answer.output.clone();
            if output.normalized_text.is_empty() {
                output.normalized_text = normalize_text(&answer.query);
            }
            (answer.query.clone(), output)
        })
        .collect();
    Box::new(PrecomputedAnswerProvider::new(Stage::Normalize, table, |query: &String| {
        QueryNormalizer::new().normalize(query)
    }))
}
