use serde::Serialize;

use crate::architect::artifacts::WrittenArtifacts;
use crate::error::{ForgeError, Result};
use crate::ops::execution::ExecutionOutcome;
use crate::ops::reporting::ReportHandle;

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Init,
    Scanning,
    Synthesizing,
    Executing,
    Reporting,
    Done,
    Aborted,
}

impl PipelineState {
    /// Forward-only transitions; `Aborted` is reachable from `Scanning`
    /// and `Synthesizing` only.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, Scanning)
                | (Scanning, Synthesizing)
                | (Scanning, Aborted)
                | (Synthesizing, Executing)
                | (Synthesizing, Aborted)
                | (Executing, Reporting)
                | (Reporting, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }

    /// The phase whose work happens in this state.
    pub fn phase(self) -> Option<Phase> {
        match self {
            PipelineState::Scanning => Some(Phase::Discovery),
            PipelineState::Synthesizing => Some(Phase::Synthesis),
            PipelineState::Executing => Some(Phase::Execution),
            PipelineState::Reporting => Some(Phase::Reporting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Discovery,
    Synthesis,
    Execution,
    Reporting,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Discovery,
        Phase::Synthesis,
        Phase::Execution,
        Phase::Reporting,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseOutcome {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub level: DiagnosticLevel,
    pub message: String,
}

// ============================================================================
// PipelineRun: in-memory record of one invocation
// ============================================================================

#[derive(Debug)]
pub struct PipelineRun {
    state: PipelineState,
    outcomes: Vec<(Phase, PhaseOutcome)>,
    pub diagnostics: Vec<Diagnostic>,
    pub fatal: Option<ForgeError>,

    pub element_count: Option<usize>,
    pub written: Option<WrittenArtifacts>,
    pub execution: Option<ExecutionOutcome>,
    pub report: Option<ReportHandle>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Init,
            outcomes: Vec::new(),
            diagnostics: Vec::new(),
            fatal: None,
            element_count: None,
            written: None,
            execution: None,
            report: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn transition(&mut self, next: PipelineState) -> Result<PipelineState> {
        if !self.state.can_transition_to(next) {
            return Err(ForgeError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{:?}", next),
            });
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }

    /// Record a phase result, replacing any earlier one for that phase.
    pub fn record(&mut self, phase: Phase, outcome: PhaseOutcome) {
        match self.outcomes.iter_mut().find(|(p, _)| *p == phase) {
            Some(entry) => entry.1 = outcome,
            None => self.outcomes.push((phase, outcome)),
        }
    }

    pub fn outcome(&self, phase: Phase) -> Option<PhaseOutcome> {
        self.outcomes
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, o)| *o)
    }

    pub fn outcomes(&self) -> &[(Phase, PhaseOutcome)] {
        &self.outcomes
    }

    pub fn diagnose(&mut self, phase: Phase, level: DiagnosticLevel, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            phase,
            level,
            message: message.into(),
        });
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
    }

    /// Whether the run finished and the generated tests passed.
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
            && self.execution.as_ref().is_some_and(|e| e.passed())
    }
}
