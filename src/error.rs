use thiserror::Error;

use crate::pipeline::stage::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A component was configured for live mode but has no live algorithm behind it.
    #[error("{component}: real capability not implemented (set use_mock = true)")]
    CapabilityNotImplemented { component: &'static str },

    /// A referenced content source (HTML fixture) does not exist.
    #[error("Fixture not found: {path}")]
    FixtureNotFound { path: String },

    #[error("Pipeline run cancelled before the {stage} stage")]
    Cancelled { stage: Stage },
}

/// Closed classification of everything that can abort a pipeline run.
///
/// Soft data problems (unparsable prices, absent attributes) never surface as
/// errors; they are absorbed by the fallback rules of the stage that meets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    CapabilityNotImplemented,
    MissingFixture,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::CapabilityNotImplemented => "capability_not_implemented",
            ErrorKind::MissingFixture => "missing_fixture",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Json(_)
            | PipelineError::Toml(_)
            | PipelineError::Io(_)
            | PipelineError::Config(_)
            | PipelineError::MissingField(_) => ErrorKind::Configuration,
            PipelineError::CapabilityNotImplemented { .. } => ErrorKind::CapabilityNotImplemented,
            PipelineError::FixtureNotFound { .. } => ErrorKind::MissingFixture,
            PipelineError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn not_implemented(stage: Stage) -> Self {
        PipelineError::CapabilityNotImplemented {
            component: stage.as_str(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let not_impl = PipelineError::not_implemented(Stage::Rank);
        let missing = PipelineError::FixtureNotFound { path: "x.html".to_string() };
        let config = PipelineError::Config("bad".to_string());

        assert_eq!(not_impl.kind(), ErrorKind::CapabilityNotImplemented);
        assert_eq!(missing.kind(), ErrorKind::MissingFixture);
        assert_eq!(config.kind(), ErrorKind::Configuration);
        assert!(not_impl.to_string().contains("rank"));
    }
}
