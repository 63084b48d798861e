use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::pipeline::state::{Phase, PhaseOutcome, PipelineState};

/// One line of the pipeline trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub from: String,
    pub to: String,

    pub phase: Option<String>,
    pub outcome: Option<String>,
    pub message: Option<String>,
}

impl TraceEvent {
    pub fn transition(step: u64, from: PipelineState, to: PipelineState) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            from: format!("{:?}", from),
            to: format!("{:?}", to),
            phase: None,
            outcome: None,
            message: None,
        }
    }

    pub fn with_outcome(mut self, phase: Phase, outcome: PhaseOutcome) -> Self {
        self.phase = Some(format!("{:?}", phase));
        self.outcome = Some(format!("{:?}", outcome));
        self
    }

    pub fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }
}
