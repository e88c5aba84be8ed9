use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::cache::{Cache, CacheManager};
use crate::config::{ConfigSource, PipelineConfig};
use crate::error::Result;
use crate::metrics::{NormalizeMetrics, StageMetrics};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::ingestion::{
    build_extractor, build_fetcher, build_search_agent, build_site_selector, PageFetcher,
    ProductExtractor, SearchAgent, SiteSelector,
};
use crate::pipeline::processing::dedup::{build_deduplicator, ListResolver};
use crate::pipeline::processing::fallback::Resolver;
use crate::pipeline::processing::normalize::build_normalizer;
use crate::pipeline::processing::rank::build_ranker;
use crate::pipeline::processing::validate::{build_validator, validate_products, ValidationCase};
use crate::pipeline::report::{PipelineRun, RunReport};
use crate::pipeline::stage::Stage;
use crate::types::{FetchedPage, NormalizedQuery, ProductRecord, UserInput};

/// Sequences the eight stages of a run.
///
/// Holds only what was built from configuration, so one orchestrator can serve
/// concurrent runs from several threads.
pub struct Orchestrator {
    normalizer: Box<dyn Resolver<String, NormalizedQuery>>,
    site_selector: Box<dyn SiteSelector>,
    search_agent: Box<dyn SearchAgent>,
    fetcher: Box<dyn PageFetcher>,
    extractor: Box<dyn ProductExtractor>,
    validator: Box<dyn Resolver<ValidationCase, bool>>,
    deduplicator: ListResolver,
    ranker: ListResolver,
}

/// (stage, consumes, produces, purpose)
const FLOW: [(Stage, &str, &str, &str); 8] = [
    (
        Stage::Normalize,
        "query text",
        "NormalizedQuery",
        "classify the query and extract its category attributes",
    ),
    (
        Stage::SelectSites,
        "country + category",
        "site list",
        "choose the shops to search",
    ),
    (
        Stage::Search,
        "NormalizedQuery + sites",
        "search hits (site, url, html_file)",
        "find candidate product pages",
    ),
    (Stage::Fetch, "search hits", "raw pages", "load each page's content"),
    (
        Stage::Extract,
        "raw pages",
        "product records",
        "read name, price, currency and link from each page",
    ),
    (
        Stage::Validate,
        "NormalizedQuery + product records",
        "valid product records",
        "drop malformed offers and offers that do not match the query",
    ),
    (
        Stage::Deduplicate,
        "valid product records",
        "unique product records",
        "keep the first offer per (name, price, currency)",
    ),
    (
        Stage::Rank,
        "unique product records",
        "ranked product records",
        "order offers by ascending price",
    ),
];

impl Orchestrator {
    /// Build every stage from a loaded configuration. Invalid stage settings
    /// (such as an unparsable extractor selector) fail here, before any run.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let modules = &config.modules;
        let orchestrator = Self {
            normalizer: build_normalizer(&modules.query_normalizer),
            site_selector: build_site_selector(&modules.site_selector),
            search_agent: build_search_agent(&modules.search_agent),
            fetcher: build_fetcher(config),
            extractor: build_extractor(&modules.extractor)?,
            validator: build_validator(&modules.validator),
            deduplicator: build_deduplicator(&modules.deduplicator),
            ranker: build_ranker(&modules.ranker),
        };
        debug!("Orchestrator ready");
        Ok(orchestrator)
    }

    pub fn from_source(source: impl Into<ConfigSource>) -> Result<Self> {
        let config = source.into().into_config()?;
        Self::new(&config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(path.as_ref())
    }

    /// Run all stages and return the ranked products.
    pub fn run(&self, input: &UserInput) -> Result<Vec<ProductRecord>> {
        self.run_with(input, &CancellationToken::new())
            .map(|run| run.products)
    }

    /// Run all stages, checking `cancel` before each one, and return the
    /// products together with the run report.
    pub fn run_with(&self, input: &UserInput, cancel: &CancellationToken) -> Result<PipelineRun> {
        let mut report = RunReport::new(input);
        let span = info_span!(
            "pipeline_run",
            run_id = %report.run_id,
            query = %input.query,
            country = %input.country
        );
        let _entered = span.enter();

        let started = Instant::now();
        info!("Starting pipeline run");
        let result = self.execute(input, cancel, &mut report);
        StageMetrics::record_run(result.is_ok(), started.elapsed().as_secs_f64());

        let products = result?;
        report.product_count = products.len();
        info!(
            "Pipeline run complete: {} products in {:.1} ms",
            products.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(PipelineRun { products, report })
    }

    /// Serve results from `cache` when present; otherwise run and store them.
    pub fn run_cached<C: Cache>(
        &self,
        input: &UserInput,
        cache: &mut CacheManager<C>,
    ) -> Result<Vec<ProductRecord>> {
        if let Some(products) = cache.get_cached_query_results(&input.query, &input.country) {
            info!("Serving {} cached products for '{}'", products.len(), input.query);
            return Ok(products);
        }
        let products = self.run(input)?;
        cache.cache_query_results(&input.query, &input.country, &products, None);
        Ok(products)
    }

    /// Human-readable outline of the stages, in run order
    pub fn describe_flow() -> String {
        FLOW.iter()
            .map(|(stage, input, output, purpose)| {
                format!(
                    "{}. {}: {} -> {} ({})",
                    stage.ordinal(),
                    stage,
                    input,
                    output,
                    purpose
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn execute(
        &self,
        input: &UserInput,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) -> Result<Vec<ProductRecord>> {
        let query = run_stage(report, cancel, Stage::Normalize, 1, || {
            let resolution = self.normalizer.resolve(&input.query)?;
            let kind = resolution.kind();
            let query = resolution.into_inner();
            NormalizeMetrics::record_query(&query, kind);
            Ok(query)
        }, |_| 1)?;
        info!(
            "Normalized '{}' as {} (brand {:?}, model {:?})",
            query.normalized_text,
            query.category(),
            query.brand(),
            query.model()
        );
        report.normalized = Some(query.clone());

        let sites = run_stage(report, cancel, Stage::SelectSites, 1, || {
            self.site_selector.select_sites(&input.country, query.category())
        }, Vec::len)?;

        let hits = run_stage(report, cancel, Stage::Search, sites.len(), || {
            self.search_agent.search(&query, &sites)
        }, Vec::len)?;

        let pages = run_stage(report, cancel, Stage::Fetch, hits.len(), || {
            hits.iter()
                .map(|hit| -> Result<FetchedPage> {
                    Ok(FetchedPage {
                        site: hit.site.clone(),
                        url: hit.url.clone(),
                        html: self.fetcher.fetch(hit)?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        }, Vec::len)?;

        let products = run_stage(report, cancel, Stage::Extract, pages.len(), || {
            pages
                .iter()
                .map(|page| {
                    debug!("Extracting {} page {}", page.site, page.url);
                    self.extractor.extract(&page.html, &page.url)
                })
                .collect::<Result<Vec<_>>>()
        }, Vec::len)?;

        let extracted = products.len();
        let valid = run_stage(report, cancel, Stage::Validate, extracted, || {
            validate_products(self.validator.as_ref(), &query, products)
        }, Vec::len)?;

        let unique = run_stage(report, cancel, Stage::Deduplicate, valid.len(), || {
            self.deduplicator.ready()?;
            Ok(self.deduplicator.resolve(&valid)?.into_inner())
        }, Vec::len)?;

        run_stage(report, cancel, Stage::Rank, unique.len(), || {
            self.ranker.ready()?;
            Ok(self.ranker.resolve(&unique)?.into_inner())
        }, Vec::len)
    }
}

/// Run one stage body: cancellation check, timing, metrics and report entry.
fn run_stage<T>(
    report: &mut RunReport,
    cancel: &CancellationToken,
    stage: Stage,
    items_in: usize,
    body: impl FnOnce() -> Result<T>,
    count: impl Fn(&T) -> usize,
) -> Result<T> {
    if let Err(e) = cancel.check(stage) {
        StageMetrics::record_failure(stage, e.kind());
        info!("Run cancelled before {}", stage);
        return Err(e);
    }

    let started = Instant::now();
    debug!("Stage {} starting with {} items", stage, items_in);
    match body() {
        Ok(output) => {
            let elapsed = started.elapsed();
            let items_out = count(&output);
            StageMetrics::record_stage(stage, items_in, items_out, elapsed.as_secs_f64());
            report.record_stage(stage, items_in, items_out, elapsed);
            info!(
                "Stage {}/{} {}: {} in, {} out",
                stage.ordinal(),
                Stage::ALL.len(),
                stage,
                items_in,
                items_out
            );
            Ok(output)
        }
        Err(e) => {
            StageMetrics::record_failure(stage, e.kind());
            // the caller reports the error itself
            debug!("Stage {} failed ({}): {}", stage, e.kind().as_str(), e);
            Err(e)
        }
    }
}
