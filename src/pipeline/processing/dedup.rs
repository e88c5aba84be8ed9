use std::collections::HashSet;

use crate::config::ListStageConfig;
use crate::pipeline::stage::Stage;
use crate::types::ProductRecord;

use super::fallback::{select_provider, AnswerTable, Resolver};

pub type ListResolver = Box<dyn Resolver<Vec<ProductRecord>, Vec<ProductRecord>>>;

/// Keep the first record per `(productName, price, currency)`, preserving order.
pub fn deduplicate(products: &[ProductRecord]) -> Vec<ProductRecord> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter(|p| seen.insert((p.product_name.as_str(), p.price.as_str(), p.currency.as_str())))
        .cloned()
        .collect()
}

pub fn build_deduplicator(config: &ListStageConfig) -> ListResolver {
    select_provider(
        Stage::Deduplicate,
        config.use_mock,
        AnswerTable::from_list_answers(&config.mock_results),
        |products: &Vec<ProductRecord>| deduplicate(products),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListAnswer;

    fn record(name: &str, price: &str, currency: &str) -> ProductRecord {
        ProductRecord::new(name, price, currency, "https://shop.test/p")
    }

    #[test]
    fn test_currency_difference_is_not_a_duplicate() {
        let products = vec![
            record("iPhone 16 Pro", "999", "USD"),
            record("iPhone 16 Pro", "999", "USD"),
            record("iPhone 16 Pro", "999", "EUR"),
        ];
        let unique = deduplicate(&products);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].currency, "USD");
        assert_eq!(unique[1].currency, "EUR");
    }

    #[test]
    fn test_keeps_first_occurrence_and_order() {
        let mut first = record("B", "1", "USD");
        first.link = "first".to_string();
        let mut second = record("B", "1", "USD");
        second.link = "second".to_string();
        let products = vec![first, record("A", "2", "USD"), second];

        let unique = deduplicate(&products);
        let names: Vec<&str> = unique.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(unique[0].link, "first");
    }

    #[test]
    fn test_field_separators_cannot_collide() {
        let products = vec![record("a_b", "c", "USD"), record("a", "b_c", "USD")];
        assert_eq!(deduplicate(&products).len(), 2);
    }

    #[test]
    fn test_registered_answer_is_returned_verbatim() {
        let input = vec![record("A", "1", "USD"), record("A", "1", "USD")];
        let config = ListStageConfig {
            use_mock: true,
            mock_results: vec![ListAnswer {
                input_products: input.clone(),
                output_products: input.clone(),
            }],
        };
        let deduplicator = build_deduplicator(&config);
        let resolution = deduplicator.resolve(&input).unwrap();
        assert!(resolution.is_exact());
        assert_eq!(resolution.into_inner().len(), 2);
    }
}
