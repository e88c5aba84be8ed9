use crate::config::ListStageConfig;
use crate::pipeline::stage::Stage;
use crate::types::ProductRecord;

use super::dedup::ListResolver;
use super::fallback::{select_provider, AnswerTable};

/// Sort key: the numeric price, or +inf when it does not parse
fn price_key(product: &ProductRecord) -> f64 {
    product.price_value().unwrap_or(f64::INFINITY)
}

/// Stable ascending sort by numeric price; unparsable prices go last.
pub fn rank_by_price(products: &[ProductRecord]) -> Vec<ProductRecord> {
    let mut ranked = products.to_vec();
    ranked.sort_by(|a, b| price_key(a).total_cmp(&price_key(b)));
    ranked
}

pub fn build_ranker(config: &ListStageConfig) -> ListResolver {
    select_provider(
        Stage::Rank,
        config.use_mock,
        AnswerTable::from_list_answers(&config.mock_results),
        |products: &Vec<ProductRecord>| rank_by_price(products),
    )
}
