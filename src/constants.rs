/// Shared names and defaults used across the pipeline, config layer and CLI.

// Configuration discovery
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const CONFIG_PATH_ENV: &str = "PRICE_PIPELINE_CONFIG";
pub const LOG_DIR_ENV: &str = "PRICE_PIPELINE_LOG_DIR";

// Request defaults
pub const DEFAULT_COUNTRY: &str = "US";

// Storage/RAM disambiguation: how far past a capacity mention to look for a RAM marker
pub const RAM_CONTEXT_WINDOW: usize = 15;
pub const RAM_MARKERS: [&str; 3] = ["ram", "memory", "mem"];

// Extraction fallbacks when a page or table does not provide a field
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";
pub const UNKNOWN_PRICE: &str = "0";
pub const DEFAULT_CURRENCY: &str = "USD";

// Cache
pub const CACHE_KEY_PREFIX: &str = "priceiq";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const QUERY_RESULTS_TTL_SECS: u64 = 1800;

// Site table key used when a country has no category-specific list
pub const DEFAULT_SITE_KEY: &str = "default";
