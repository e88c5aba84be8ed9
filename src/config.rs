use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::types::{Category, NormalizedQuery, ProductRecord};

/// Root configuration document. Every section has defaults, so an empty document
/// yields a pipeline with all stages in mock mode and empty answer tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Directory relative fixture paths resolve against; set when loaded from a file
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub query_normalizer: NormalizerConfig,
    pub site_selector: SiteSelectorConfig,
    pub search_agent: SearchAgentConfig,
    pub scraper: ScraperConfig,
    pub extractor: ExtractorConfig,
    pub validator: ValidatorConfig,
    pub deduplicator: ListStageConfig,
    pub ranker: ListStageConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub use_mock: bool,
    /// Exact raw-query answers; anything else goes through the pattern engine
    pub answers: Vec<QueryAnswer>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            answers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub query: String,
    pub output: NormalizedQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectorConfig {
    pub use_mock: bool,
    pub sites_by_country: BTreeMap<String, SiteList>,
}

impl Default for SiteSelectorConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            sites_by_country: BTreeMap::new(),
        }
    }
}

/// Sites for one country: either one list for every category, or lists keyed by
/// category name with an optional `default` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteList {
    Flat(Vec<String>),
    ByCategory(BTreeMap<String, Vec<String>>),
}

impl SiteList {
    pub fn for_category(&self, category: Category) -> Vec<String> {
        match self {
            SiteList::Flat(sites) => sites.clone(),
            SiteList::ByCategory(by_category) => by_category
                .iter()
                .find(|(key, _)| Category::from_name(key) == Some(category))
                .or_else(|| by_category.get_key_value(constants::DEFAULT_SITE_KEY))
                .map(|(_, sites)| sites.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchAgentConfig {
    pub use_mock: bool,
    /// Site → product pages found on it
    pub mock_results: BTreeMap<String, Vec<SearchResultEntry>>,
}

impl Default for SearchAgentConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            mock_results: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultEntry {
    pub url: String,
    #[serde(default)]
    pub html_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub use_mock: bool,
    /// Overrides the config file's directory as the root for relative fixture paths
    pub fixture_root: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            fixture_root: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub use_mock: bool,
    /// URL → record returned verbatim in mock mode
    pub mock_extracts: BTreeMap<String, ProductRecord>,
    /// Site key → selectors used by the HTML extractor in live mode
    pub site_templates: BTreeMap<String, SiteTemplate>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            mock_extracts: BTreeMap::new(),
            site_templates: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteTemplate {
    pub product_name_selectors: Vec<String>,
    pub price_selectors: Vec<String>,
    pub currency_selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub use_mock: bool,
    pub mock_validations: Vec<ValidationAnswer>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            mock_validations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationAnswer {
    pub query: NormalizedQuery,
    pub product: ProductRecord,
    pub is_valid: bool,
}

/// Shared shape of the deduplicator and ranker sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListStageConfig {
    pub use_mock: bool,
    pub mock_results: Vec<ListAnswer>,
}

impl Default for ListStageConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            mock_results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAnswer {
    pub input_products: Vec<ProductRecord>,
    pub output_products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub use_mock: bool,
    pub ttl_default: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            ttl_default: constants::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration document from disk. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Path named by `PRICE_PIPELINE_CONFIG`, or the bundled default
    pub fn default_path() -> PathBuf {
        std::env::var(constants::CONFIG_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_CONFIG_PATH))
    }

    /// Directory relative fixture paths resolve against: `fixture_root` (itself
    /// relative to the config directory), else the config directory.
    pub fn fixture_root(&self) -> Option<PathBuf> {
        self.modules
            .scraper
            .fixture_root
            .as_ref()
            .map(|r| match &self.base_dir {
                Some(base) if r.is_relative() => base.join(r),
                _ => r.clone(),
            })
            .or_else(|| self.base_dir.clone())
    }

    pub fn resolve_fixture_path(&self, file: &str) -> PathBuf {
        resolve_under(self.fixture_root().as_deref(), file)
    }

    fn validate(&self) -> Result<()> {
        for (site, entries) in &self.modules.search_agent.mock_results {
            for (i, entry) in entries.iter().enumerate() {
                if entry.url.trim().is_empty() {
                    return Err(PipelineError::Config(format!(
                        "modules.search_agent.mock_results.{}[{}]: url is empty",
                        site, i
                    )));
                }
            }
        }
        for country in self.modules.site_selector.sites_by_country.keys() {
            if country.trim().is_empty() {
                return Err(PipelineError::Config(
                    "modules.site_selector.sites_by_country: empty country code".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Join a relative path onto `root`; absolute paths pass through.
pub fn resolve_under(root: Option<&Path>, file: &str) -> PathBuf {
    let file = Path::new(file);
    match root {
        Some(root) if file.is_relative() => root.join(file),
        _ => file.to_path_buf(),
    }
}

/// Either an already-loaded configuration or a path to load one from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Loaded(PipelineConfig),
    Path(PathBuf),
}

impl ConfigSource {
    pub fn into_config(self) -> Result<PipelineConfig> {
        match self {
            ConfigSource::Loaded(config) => Ok(config),
            ConfigSource::Path(path) => PipelineConfig::load(path),
        }
    }
}

impl From<PipelineConfig> for ConfigSource {
    fn from(config: PipelineConfig) -> Self {
        ConfigSource::Loaded(config)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ConfigSource {
    fn from(path: &str) -> Self {
        ConfigSource::Path(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[modules.site_selector]
use_mock = true

[modules.site_selector.sites_by_country]
US = ["amazon.com", "bestbuy.com"]

[modules.site_selector.sites_by_country.IN]
default = ["amazon.in"]
laptop = ["croma.com"]

[[modules.search_agent.mock_results."amazon.com"]]
url = "https://amazon.com/iphone16pro"
html_file = "html/amazon_iphone.html"

[modules.ranker]
use_mock = false
"#;

    #[test]
    fn test_empty_document_defaults_to_mock_mode() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert!(config.modules.query_normalizer.use_mock);
        assert!(config.modules.validator.use_mock);
        assert!(config.modules.ranker.use_mock);
        assert_eq!(config.modules.cache.ttl_default, constants::DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn test_site_lists_flat_and_by_category() {
        let config = PipelineConfig::from_toml_str(SAMPLE).unwrap();
        let sites = &config.modules.site_selector.sites_by_country;

        assert_eq!(
            sites["US"].for_category(Category::Laptop),
            vec!["amazon.com".to_string(), "bestbuy.com".to_string()]
        );
        assert_eq!(sites["IN"].for_category(Category::Laptop), vec!["croma.com".to_string()]);
        assert_eq!(sites["IN"].for_category(Category::Sports), vec!["amazon.in".to_string()]);
        assert!(!config.modules.ranker.use_mock);
    }

    #[test]
    fn test_empty_search_url_is_rejected() {
        let doc = r#"
[[modules.search_agent.mock_results."amazon.com"]]
url = ""
"#;
        let err = PipelineConfig::from_toml_str(doc).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_malformed_document_is_a_toml_error() {
        let err = PipelineConfig::from_toml_str("[modules\nuse_mock = ").unwrap_err();
        assert!(matches!(err, PipelineError::Toml(_)));
    }

    #[test]
    fn test_fixture_paths_resolve_against_base_dir() {
        let mut config = PipelineConfig::default();
        config.base_dir = Some(PathBuf::from("/etc/pipeline"));
        assert_eq!(
            config.resolve_fixture_path("html/a.html"),
            PathBuf::from("/etc/pipeline/html/a.html")
        );

        config.modules.scraper.fixture_root = Some(PathBuf::from("fixtures"));
        assert_eq!(
            config.resolve_fixture_path("a.html"),
            PathBuf::from("/etc/pipeline/fixtures/a.html")
        );
        assert_eq!(
            config.resolve_fixture_path("/abs/a.html"),
            PathBuf::from("/abs/a.html")
        );
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = PipelineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
