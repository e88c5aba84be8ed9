use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{resolve_under, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::stage::Stage;
use crate::types::SearchHit;

use super::Unavailable;

/// Retrieves the raw content behind a search hit.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, hit: &SearchHit) -> Result<String>;
}

/// Reads the hit's `html_file` from disk instead of touching the network.
#[derive(Debug, Clone, Default)]
pub struct FixtureFetcher {
    root: Option<PathBuf>,
}

impl FixtureFetcher {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn resolve(&self, file: &str) -> PathBuf {
        resolve_under(self.root.as_deref(), file)
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, hit: &SearchHit) -> Result<String> {
        if hit.html_file.trim().is_empty() {
            return Err(PipelineError::MissingField(format!(
                "html_file for search result {}",
                hit.url
            )));
        }

        let path = self.resolve(&hit.html_file);
        match fs::read_to_string(&path) {
            Ok(html) => {
                debug!("Read {} bytes for {} from {}", html.len(), hit.url, path.display());
                Ok(html)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(PipelineError::FixtureNotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(PipelineError::Io(e)),
        }
    }
}

impl PageFetcher for Unavailable {
    fn fetch(&self, _hit: &SearchHit) -> Result<String> {
        Err(PipelineError::not_implemented(self.0))
    }
}

pub fn build_fetcher(config: &PipelineConfig) -> Box<dyn PageFetcher> {
    if config.modules.scraper.use_mock {
        Box::new(FixtureFetcher::new(config.fixture_root()))
    } else {
        Box::new(Unavailable(Stage::Fetch))
    }
}
