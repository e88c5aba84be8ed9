use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{SiteList, SiteSelectorConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::stage::Stage;
use crate::types::Category;

use super::Unavailable;

/// Chooses the sites to search for a country and category.
pub trait SiteSelector: Send + Sync {
    fn select_sites(&self, country: &str, category: Category) -> Result<Vec<String>>;
}

/// Country table from config. Unknown countries get no sites.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteSelector {
    sites_by_country: BTreeMap<String, SiteList>,
}

impl StaticSiteSelector {
    pub fn new(sites_by_country: BTreeMap<String, SiteList>) -> Self {
        Self { sites_by_country }
    }

    fn lookup(&self, country: &str) -> Option<&SiteList> {
        let country = country.trim();
        self.sites_by_country.get(country).or_else(|| {
            self.sites_by_country
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(country))
                .map(|(_, sites)| sites)
        })
    }
}

impl SiteSelector for StaticSiteSelector {
    fn select_sites(&self, country: &str, category: Category) -> Result<Vec<String>> {
        let sites = self
            .lookup(country)
            .map(|list| list.for_category(category))
            .unwrap_or_default();
        debug!("Selected {} sites for {}/{}", sites.len(), country, category);
        Ok(sites)
    }
}

impl SiteSelector for Unavailable {
    fn select_sites(&self, _country: &str, _category: Category) -> Result<Vec<String>> {
        Err(PipelineError::not_implemented(self.0))
    }
}

pub fn build_site_selector(config: &SiteSelectorConfig) -> Box<dyn SiteSelector> {
    if config.use_mock {
        Box::new(StaticSiteSelector::new(config.sites_by_country.clone()))
    } else {
        Box::new(Unavailable(Stage::SelectSites))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn selector() -> StaticSiteSelector {
        let mut table = BTreeMap::new();
        table.insert(
            "US".to_string(),
            SiteList::Flat(vec!["amazon.com".to_string(), "bestbuy.com".to_string()]),
        );
        let mut india = BTreeMap::new();
        india.insert("default".to_string(), vec!["amazon.in".to_string()]);
        india.insert("sports".to_string(), vec!["decathlon.in".to_string()]);
        table.insert("IN".to_string(), SiteList::ByCategory(india));
        StaticSiteSelector::new(table)
    }

    #[test]
    fn test_flat_list_serves_every_category() {
        let sites = selector().select_sites("US", Category::Laptop).unwrap();
        assert_eq!(sites, vec!["amazon.com", "bestbuy.com"]);
    }

    #[test]
    fn test_category_list_then_default() {
        let s = selector();
        assert_eq!(s.select_sites("IN", Category::Sports).unwrap(), vec!["decathlon.in"]);
        assert_eq!(s.select_sites("in", Category::Smartphone).unwrap(), vec!["amazon.in"]);
    }

    #[test]
    fn test_unknown_country_yields_no_sites() {
        assert!(selector().select_sites("FR", Category::Smartphone).unwrap().is_empty());
    }

    #[test]
    fn test_live_selector_is_not_implemented() {
        let config = SiteSelectorConfig {
            use_mock: false,
            sites_by_country: BTreeMap::new(),
        };
        let err = build_site_selector(&config)
            .select_sites("US", Category::Smartphone)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityNotImplemented);
    }
}
