use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of product categories the pipeline understands.
///
/// Declaration order matters: the classifier breaks score ties in favour of the
/// category declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    Smartphone,
    Laptop,
    Sports,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Smartphone, Category::Laptop, Category::Sports];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Smartphone => "Smartphone",
            Category::Laptop => "Laptop",
            Category::Sports => "Sports",
        }
    }

    /// Case-insensitive lookup used for config keys such as `smartphone`.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific attributes. Serialized with the `category` tag inline so the
/// record reads as one flat object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum CategoryAttributes {
    Smartphone {
        storage: Option<String>,
        color: Option<String>,
        screen_size: Option<String>,
    },
    Laptop {
        storage: Option<String>,
        ram: Option<String>,
        screen_size: Option<String>,
        processor: Option<String>,
    },
    Sports {
        size: Option<String>,
        color: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
}

impl CategoryAttributes {
    /// All-null attributes for a category
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Smartphone => CategoryAttributes::Smartphone {
                storage: None,
                color: None,
                screen_size: None,
            },
            Category::Laptop => CategoryAttributes::Laptop {
                storage: None,
                ram: None,
                screen_size: None,
                processor: None,
            },
            Category::Sports => CategoryAttributes::Sports {
                size: None,
                color: None,
                kind: None,
            },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            CategoryAttributes::Smartphone { .. } => Category::Smartphone,
            CategoryAttributes::Laptop { .. } => Category::Laptop,
            CategoryAttributes::Sports { .. } => Category::Sports,
        }
    }

    pub fn storage(&self) -> Option<&str> {
        match self {
            CategoryAttributes::Smartphone { storage, .. }
            | CategoryAttributes::Laptop { storage, .. } => storage.as_deref(),
            CategoryAttributes::Sports { .. } => None,
        }
    }
}

impl Default for CategoryAttributes {
    fn default() -> Self {
        CategoryAttributes::empty(Category::default())
    }
}

/// Output of the attribute extraction engine for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeSet {
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(flatten)]
    pub details: CategoryAttributes,
}

impl AttributeSet {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    pub fn storage(&self) -> Option<&str> {
        self.details.storage()
    }
}

/// Structured form of a shopping query. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    #[serde(rename = "normalized", default)]
    pub normalized_text: String,
    #[serde(flatten)]
    pub attributes: AttributeSet,
}

impl NormalizedQuery {
    pub fn new(normalized_text: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            normalized_text: normalized_text.into(),
            attributes,
        }
    }

    pub fn category(&self) -> Category {
        self.attributes.category()
    }

    pub fn brand(&self) -> Option<&str> {
        self.attributes.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.attributes.model.as_deref()
    }

    pub fn storage(&self) -> Option<&str> {
        self.attributes.storage()
    }
}

/// A single product offer as extracted from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_name: String,
    pub price: String,
    pub currency: String,
    pub link: String,
    /// Validation or ranking metadata carried alongside the core fields
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProductRecord {
    pub fn new(
        product_name: impl Into<String>,
        price: impl Into<String>,
        currency: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            price: price.into(),
            currency: currency.into(),
            link: link.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Numeric price, if the price text parses to a finite number
    pub fn price_value(&self) -> Option<f64> {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    /// True when the record may enter validation: a non-negative numeric price and
    /// a non-empty currency code.
    pub fn is_well_formed(&self) -> bool {
        !self.currency.trim().is_empty() && self.price_value().is_some_and(|p| p >= 0.0)
    }
}

/// One search result: a product page on a site plus the fixture that backs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub site: String,
    pub url: String,
    #[serde(default)]
    pub html_file: String,
}

/// Raw page content paired with the hit it was fetched for.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub site: String,
    pub url: String,
    pub html: String,
}

/// The caller's request: free text plus a country code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    crate::constants::DEFAULT_COUNTRY.to_string()
}

impl UserInput {
    pub fn new(query: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            country: country.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalized_query_serializes_flat() {
        let query = NormalizedQuery::new(
            "iPhone 16 Pro 128GB",
            AttributeSet {
                brand: Some("Apple".to_string()),
                model: Some("iPhone 16 Pro".to_string()),
                details: CategoryAttributes::Smartphone {
                    storage: Some("128GB".to_string()),
                    color: None,
                    screen_size: None,
                },
            },
        );

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["category"], "Smartphone");
        assert_eq!(value["brand"], "Apple");
        assert_eq!(value["storage"], "128GB");
        assert_eq!(value["normalized"], "iPhone 16 Pro 128GB");
        assert!(value["color"].is_null());
    }

    #[test]
    fn test_sports_type_field_round_trips_through_json() {
        let value = json!({
            "normalized": "Nike Air Max 270",
            "brand": "Nike",
            "model": "Air Max 270",
            "category": "Sports",
            "type": "Running Shoes"
        });

        let query: NormalizedQuery = serde_json::from_value(value).unwrap();
        assert_eq!(query.category(), Category::Sports);
        match query.attributes.details {
            CategoryAttributes::Sports { kind, size, .. } => {
                assert_eq!(kind.as_deref(), Some("Running Shoes"));
                assert_eq!(size, None);
            }
            other => panic!("unexpected attributes: {:?}", other),
        }
    }

    #[test]
    fn test_product_record_uses_camel_case_and_keeps_extras() {
        let value = json!({
            "productName": "Apple iPhone 16 Pro 128GB",
            "price": "999",
            "currency": "USD",
            "link": "https://amazon.com/iphone16pro",
            "validation_score": 0.8
        });

        let record: ProductRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.product_name, "Apple iPhone 16 Pro 128GB");
        assert_eq!(record.extra.get("validation_score"), Some(&json!(0.8)));
        assert_eq!(record.price_value(), Some(999.0));
    }

    #[test]
    fn test_well_formed_requires_price_and_currency() {
        assert!(ProductRecord::new("A", "0", "USD", "l").is_well_formed());
        assert!(!ProductRecord::new("A", "-1", "USD", "l").is_well_formed());
        assert!(!ProductRecord::new("A", "abc", "USD", "l").is_well_formed());
        assert!(!ProductRecord::new("A", "", "USD", "l").is_well_formed());
        assert!(!ProductRecord::new("A", "10", " ", "l").is_well_formed());
    }

    #[test]
    fn test_category_from_name_is_case_insensitive() {
        assert_eq!(Category::from_name("laptop"), Some(Category::Laptop));
        assert_eq!(Category::from_name("SPORTS"), Some(Category::Sports));
        assert_eq!(Category::from_name("tablet"), None);
    }

    #[test]
    fn test_user_input_defaults_country() {
        let input: UserInput = serde_json::from_str(r#"{"query": "iPhone 16 Pro"}"#).unwrap();
        assert_eq!(input.country, "US");
    }
}
