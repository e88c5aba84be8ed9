use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{SearchAgentConfig, SearchResultEntry};
use crate::error::{PipelineError, Result};
use crate::pipeline::stage::Stage;
use crate::types::{NormalizedQuery, SearchHit};

use super::Unavailable;

/// Finds product pages for a query on each selected site.
pub trait SearchAgent: Send + Sync {
    fn search(&self, query: &NormalizedQuery, sites: &[String]) -> Result<Vec<SearchHit>>;
}

/// Per-site result table from config. The query does not narrow the results;
/// the validate stage does that.
#[derive(Debug, Clone, Default)]
pub struct StaticSearchAgent {
    results: BTreeMap<String, Vec<SearchResultEntry>>,
}

impl StaticSearchAgent {
    pub fn new(results: BTreeMap<String, Vec<SearchResultEntry>>) -> Self {
        Self { results }
    }
}

impl SearchAgent for StaticSearchAgent {
    fn search(&self, query: &NormalizedQuery, sites: &[String]) -> Result<Vec<SearchHit>> {
        let hits: Vec<SearchHit> = sites
            .iter()
            .flat_map(|site| {
                self.results
                    .get(site)
                    .into_iter()
                    .flatten()
                    .map(move |entry| SearchHit {
                        site: site.clone(),
                        url: entry.url.clone(),
                        html_file: entry.html_file.clone(),
                    })
            })
            .collect();
        debug!(
            "Search for '{}' across {} sites found {} pages",
            query.normalized_text,
            sites.len(),
            hits.len()
        );
        Ok(hits)
    }
}

impl SearchAgent for Unavailable {
    fn search(&self, _query: &NormalizedQuery, _sites: &[String]) -> Result<Vec<SearchHit>> {
        Err(PipelineError::not_implemented(self.0))
    }
}

pub fn build_search_agent(config: &SearchAgentConfig) -> Box<dyn SearchAgent> {
    if config.use_mock {
        Box::new(StaticSearchAgent::new(config.mock_results.clone()))
    } else {
        Box::new(Unavailable(Stage::Search))
    }
}
