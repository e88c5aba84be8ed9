// Price pipeline: query understanding, ingestion and offer processing

pub mod cancel;
pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod report;
pub mod stage;

pub use cancel::CancellationToken;
pub use orchestrator::Orchestrator;
pub use report::{PipelineRun, RunReport, StageReport};
pub use stage::Stage;
