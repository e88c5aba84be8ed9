use tracing::debug;

use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::pipeline::stage::Stage;
use crate::types::{NormalizedQuery, ProductRecord};

use super::fallback::{select_provider, AnswerTable, Canonical, Resolver};

/// One product judged against the query it was found for
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCase {
    pub query: NormalizedQuery,
    pub product: ProductRecord,
}

impl Canonical for ValidationCase {}

/// Fallback judgement: every identifying attribute the query carries must
/// appear in the product name, and the price must be strictly positive.
pub fn validate_fallback(case: &ValidationCase) -> bool {
    let name = case.product.product_name.to_lowercase();
    let mentioned = |value: Option<&str>| value.map_or(true, |v| name.contains(&v.to_lowercase()));

    mentioned(case.query.brand())
        && mentioned(case.query.model())
        && mentioned(case.query.storage())
        && case.product.price_value().is_some_and(|price| price > 0.0)
}

pub fn build_validator(config: &ValidatorConfig) -> Box<dyn Resolver<ValidationCase, bool>> {
    let table: AnswerTable<ValidationCase, bool> = config
        .mock_validations
        .iter()
        .map(|answer| {
            let case = ValidationCase {
                query: answer.query.clone(),
                product: answer.product.clone(),
            };
            (case, answer.is_valid)
        })
        .collect();
    select_provider(Stage::Validate, config.use_mock, table, validate_fallback)
}

/// Keep the products that are well formed and judged valid, in input order.
///
/// A malformed record is dropped before the resolver sees it, so a registered
/// answer can never let one through.
pub fn validate_products(
    resolver: &dyn Resolver<ValidationCase, bool>,
    query: &NormalizedQuery,
    products: Vec<ProductRecord>,
) -> Result<Vec<ProductRecord>> {
    resolver.ready()?;

    let mut valid = Vec::with_capacity(products.len());
    for product in products {
        if !product.is_well_formed() {
            debug!(
                "Dropping malformed record '{}' (price '{}', currency '{}')",
                product.product_name, product.price, product.currency
            );
            continue;
        }

        let case = ValidationCase {
            query: query.clone(),
            product,
        };
        if resolver.resolve(&case)?.into_inner() {
            valid.push(case.product);
        } else {
            debug!("Rejected '{}' for query '{}'", case.product.product_name, query.normalized_text);
        }
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationAnswer;
    use crate::error::ErrorKind;
    use crate::types::{AttributeSet, CategoryAttributes};

    fn iphone_query() -> NormalizedQuery {
        NormalizedQuery::new(
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
        )
    }

    fn case(name: &str, price: &str) -> ValidationCase {
        ValidationCase {
            query: iphone_query(),
            product: ProductRecord::new(name, price, "USD", "https://amazon.com/iphone16pro"),
        }
    }

    #[test]
    fn test_fallback_accepts_matching_product() {
        assert!(validate_fallback(&case("Apple iPhone 16 Pro 128GB", "999")));
        assert!(validate_fallback(&case("APPLE IPHONE 16 PRO (128gb)", "999.99")));
    }

    #[test]
    fn test_fallback_rejects_missing_attribute() {
        assert!(!validate_fallback(&case("Apple iPhone 16 Pro 256GB", "999")));
        assert!(!validate_fallback(&case("iPhone 16 Pro 128GB", "999")));
    }

    #[test]
    fn test_fallback_rejects_zero_or_non_numeric_price() {
        assert!(!validate_fallback(&case("Apple iPhone 16 Pro 128GB", "0")));
        assert!(!validate_fallback(&case("Apple iPhone 16 Pro 128GB", "N/A")));
        assert!(!validate_fallback(&case("Apple iPhone 16 Pro 128GB", "")));
    }

    #[test]
    fn test_fallback_without_attributes_only_checks_price() {
        let bare = ValidationCase {
            query: NormalizedQuery::new("something", AttributeSet::default()),
            product: ProductRecord::new("Anything", "5", "USD", "l"),
        };
        assert!(validate_fallback(&bare));
    }

    #[test]
    fn test_exact_answer_overrides_fallback() {
        let config = ValidatorConfig {
            use_mock: true,
            mock_validations: vec![ValidationAnswer {
                query: iphone_query(),
                product: ProductRecord::new("Refurb phone", "10", "USD", "l"),
                is_valid: true,
            }],
        };
        let validator = build_validator(&config);
        let products = vec![
            ProductRecord::new("Refurb phone", "10", "USD", "l"),
            ProductRecord::new("Another phone", "10", "USD", "l"),
        ];

        let valid = validate_products(validator.as_ref(), &iphone_query(), products).unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].product_name, "Refurb phone");
    }

    #[test]
    fn test_malformed_records_never_pass() {
        let config = ValidatorConfig {
            use_mock: true,
            mock_validations: vec![ValidationAnswer {
                query: iphone_query(),
                product: ProductRecord::new("Broken", "-5", "USD", "l"),
                is_valid: true,
            }],
        };
        let validator = build_validator(&config);
        let products = vec![
            ProductRecord::new("Broken", "-5", "USD", "l"),
            ProductRecord::new("Apple iPhone 16 Pro 128GB", "999", "", "l"),
        ];

        let valid = validate_products(validator.as_ref(), &iphone_query(), products).unwrap();
        assert!(valid.is_empty());
    }

    #[test]
    fn test_live_validator_fails_even_without_products() {
        let config = ValidatorConfig {
            use_mock: false,
            mock_validations: Vec::new(),
        };
        let validator = build_validator(&config);
        let err = validate_products(validator.as_ref(), &iphone_query(), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityNotImplemented);
    }
}
