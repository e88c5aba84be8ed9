use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight stages of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    SelectSites,
    Search,
    Fetch,
    Extract,
    Validate,
    Deduplicate,
    Rank,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Normalize,
        Stage::SelectSites,
        Stage::Search,
        Stage::Fetch,
        Stage::Extract,
        Stage::Validate,
        Stage::Deduplicate,
        Stage::Rank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::SelectSites => "select_sites",
            Stage::Search => "search",
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Deduplicate => "deduplicate",
            Stage::Rank => "rank",
        }
    }

    /// 1-based position in the run
    pub fn ordinal(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
