pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{CancellationToken, Orchestrator, PipelineRun};
pub use types::{Category, NormalizedQuery, ProductRecord, UserInput};
