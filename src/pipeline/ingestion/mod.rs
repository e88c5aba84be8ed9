// Pipeline ingestion: site selection, search, page fetching and product extraction

pub mod extract;
pub mod fetch;
pub mod search;
pub mod site_selector;

pub use extract::{build_extractor, HtmlExtractor, ProductExtractor, StaticExtractor};
pub use fetch::{build_fetcher, FixtureFetcher, PageFetcher};
pub use search::{build_search_agent, SearchAgent, StaticSearchAgent};
pub use site_selector::{build_site_selector, SiteSelector, StaticSiteSelector};

/// Live-mode collaborator with no implementation behind it.
#[derive(Debug, Clone, Copy)]
pub struct Unavailable(pub crate::pipeline::stage::Stage);
