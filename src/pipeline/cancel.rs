use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::pipeline::stage::Stage;

/// Cooperative cancellation flag, checked by the orchestrator between stages.
///
/// Clones share the flag, so a caller can keep one and hand another to a run on
/// a different thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Cancelled` if the flag is set before `stage` starts
    pub fn check(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}
