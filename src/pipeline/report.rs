use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::pipeline::stage::Stage;
use crate::types::{NormalizedQuery, ProductRecord, UserInput};

/// Item flow and timing for one completed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub items_in: usize,
    pub items_out: usize,
    pub duration_ms: f64,
}

/// What happened during one run. Stages that never started are absent.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub query: String,
    pub country: String,
    pub normalized: Option<NormalizedQuery>,
    pub stages: Vec<StageReport>,
    pub product_count: usize,
}

impl RunReport {
    pub fn new(input: &UserInput) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            query: input.query.clone(),
            country: input.country.clone(),
            normalized: None,
            stages: Vec::new(),
            product_count: 0,
        }
    }

    pub(crate) fn record_stage(&mut self, stage: Stage, items_in: usize, items_out: usize, elapsed: Duration) {
        self.stages.push(StageReport {
            stage,
            items_in,
            items_out,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        });
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

/// Output of a run: the ranked products plus the report
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub products: Vec<ProductRecord>,
    pub report: RunReport,
}
