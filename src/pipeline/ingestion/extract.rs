use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ExtractorConfig, SiteTemplate};
use crate::constants::{DEFAULT_CURRENCY, UNKNOWN_PRICE, UNKNOWN_PRODUCT_NAME};
use crate::error::{PipelineError, Result};
use crate::types::ProductRecord;

/// Turns fetched page content into a product record.
pub trait ProductExtractor: Send + Sync {
    fn extract(&self, html: &str, url: &str) -> Result<ProductRecord>;
}

/// URL table from config; the page content is ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    extracts: BTreeMap<String, ProductRecord>,
}

impl StaticExtractor {
    pub fn new(extracts: BTreeMap<String, ProductRecord>) -> Self {
        Self { extracts }
    }
}

impl ProductExtractor for StaticExtractor {
    fn extract(&self, _html: &str, url: &str) -> Result<ProductRecord> {
        match self.extracts.get(url) {
            Some(record) => Ok(record.clone()),
            None => {
                debug!("No extraction registered for {}", url);
                Ok(ProductRecord::new(
                    UNKNOWN_PRODUCT_NAME,
                    UNKNOWN_PRICE,
                    DEFAULT_CURRENCY,
                    url,
                ))
            }
        }
    }
}

struct CompiledTemplate {
    product_name: Vec<Selector>,
    price: Vec<Selector>,
    currency: Vec<Selector>,
}

impl CompiledTemplate {
    fn compile(site: &str, template: &SiteTemplate) -> Result<Self> {
        let parse_all = |selectors: &[String]| -> Result<Vec<Selector>> {
            selectors
                .iter()
                .map(|s| {
                    Selector::parse(s).map_err(|e| {
                        PipelineError::Config(format!(
                            "site template '{}': invalid selector '{}': {}",
                            site, s, e
                        ))
                    })
                })
                .collect()
        };
        Ok(Self {
            product_name: parse_all(&template.product_name_selectors)?,
            price: parse_all(&template.price_selectors)?,
            currency: parse_all(&template.currency_selectors)?,
        })
    }
}

fn template(name: &[&str], price: &[&str], currency: &[&str]) -> SiteTemplate {
    let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
    SiteTemplate {
        product_name_selectors: owned(name),
        price_selectors: owned(price),
        currency_selectors: owned(currency),
    }
}

/// Templates shipped with the crate; config entries with the same key replace them.
pub fn builtin_templates() -> BTreeMap<String, SiteTemplate> {
    let mut templates = BTreeMap::new();
    templates.insert(
        "amazon".to_string(),
        template(
            &["#productTitle", "h1"],
            &[
                ".a-price .a-offscreen",
                "#corePrice_feature_div .a-offscreen",
                "#priceblock_ourprice",
                ".a-price-whole",
            ],
            &[],
        ),
    );
    templates.insert(
        "bestbuy".to_string(),
        template(
            &[".sku-title h1", "h1"],
            &[
                ".priceView-customer-price span",
                ".priceView-hero-price span",
            ],
            &[],
        ),
    );
    templates
}

fn generic_template() -> SiteTemplate {
    template(
        &["[itemprop=name]", "h1", "title"],
        &["[itemprop=price]", "[data-price]", ".price"],
        &["[itemprop=priceCurrency]", "[data-currency]"],
    )
}

/// Selector-driven extraction from real page markup.
pub struct HtmlExtractor {
    templates: BTreeMap<String, CompiledTemplate>,
    generic: CompiledTemplate,
}

impl HtmlExtractor {
    /// Compile the built-in templates overlaid with `overrides`. Any selector
    /// that does not parse is a configuration error.
    pub fn new(overrides: &BTreeMap<String, SiteTemplate>) -> Result<Self> {
        let mut merged = builtin_templates();
        merged.extend(overrides.iter().map(|(k, v)| (k.to_lowercase(), v.clone())));

        let templates = merged
            .iter()
            .map(|(site, t)| -> Result<(String, CompiledTemplate)> {
                Ok((site.clone(), CompiledTemplate::compile(site, t)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let generic = CompiledTemplate::compile("generic", &generic_template())?;

        Ok(Self { templates, generic })
    }

    fn template_for(&self, url: &str) -> &CompiledTemplate {
        self.templates
            .get(&site_key(url))
            .unwrap_or(&self.generic)
    }
}

impl ProductExtractor for HtmlExtractor {
    fn extract(&self, html: &str, url: &str) -> Result<ProductRecord> {
        let document = Html::parse_document(html);
        let template = self.template_for(url);

        let name = first_text(&document, &template.product_name).or_else(|| {
            first_text(&document, &self.generic.product_name)
        });
        let raw_price = first_text(&document, &template.price)
            .or_else(|| first_text(&document, &self.generic.price));

        let currency = raw_price
            .as_deref()
            .and_then(currency_from_text)
            .or_else(|| first_text(&document, &template.currency).and_then(|c| currency_from_text(&c)))
            .or_else(|| first_text(&document, &self.generic.currency).and_then(|c| currency_from_text(&c)))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        if name.is_none() {
            warn!("No product name found on {}", url);
        }
        let price = raw_price
            .as_deref()
            .map(normalize_price)
            .unwrap_or_else(|| UNKNOWN_PRICE.to_string());

        Ok(ProductRecord::new(
            name.unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            price,
            currency,
            url,
        ))
    }
}

/// Text (or `content` attribute) of the first element any selector finds
fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .find_map(element_value)
}

fn element_value(element: ElementRef) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        return Some(text);
    }
    ["content", "data-price", "data-currency"]
        .iter()
        .find_map(|attr| element.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First host label without `www.`: `https://www.bestbuy.com/x` -> `bestbuy`
pub fn site_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|host| {
            let host = host.strip_prefix("www.").unwrap_or(&host);
            host.split('.').next().unwrap_or_default().to_string()
        })
        .unwrap_or_default()
}

/// Keep digits and the decimal point. A comma followed by exactly two digits at
/// the end is a decimal comma; every other comma is a thousands separator.
pub fn normalize_price(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let decimal_comma = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) => comma > dot,
        (None, Some(comma)) => kept.len() - comma - 1 == 2,
        _ => false,
    };
    let cleaned: String = if decimal_comma {
        kept.chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect()
    } else {
        kept.chars().filter(|c| *c != ',').collect()
    };

    if cleaned.chars().any(|c| c.is_ascii_digit()) {
        cleaned
    } else {
        UNKNOWN_PRICE.to_string()
    }
}

const SYMBOLS: [(char, &str); 5] = [('$', "USD"), ('€', "EUR"), ('£', "GBP"), ('₹', "INR"), ('¥', "JPY")];
const CODES: [&str; 8] = ["USD", "EUR", "GBP", "INR", "JPY", "CAD", "AUD", "CHF"];

/// Currency implied by a symbol or an ISO code inside price text
pub fn currency_from_text(text: &str) -> Option<String> {
    SYMBOLS
        .iter()
        .find(|(symbol, _)| text.contains(*symbol))
        .map(|(_, code)| code.to_string())
        .or_else(|| currency_code(text))
}

fn currency_code(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    CODES
        .iter()
        .find(|code| upper.contains(*code))
        .map(|code| code.to_string())
}

pub fn build_extractor(config: &ExtractorConfig) -> Result<Box<dyn ProductExtractor>> {
    if config.use_mock {
        Ok(Box::new(StaticExtractor::new(config.mock_extracts.clone())))
    } else {
        Ok(Box::new(HtmlExtractor::new(&config.site_templates)?))
    }
}
