use tracing::{error, info, warn};

use crate::architect::inference::VisionInference;
use crate::architect::prompt::SynthesisRequest;
use crate::architect::synthesis::synthesize;
use crate::browser::driver::BrowserLauncher;
use crate::error::ForgeError;
use crate::intel::report::load;
use crate::ops::command::CommandSpec;
use crate::ops::execution::execute;
use crate::ops::reporting::{ReportCommands, report};
use crate::pipeline::context::RunContext;
use crate::pipeline::state::{DiagnosticLevel, Phase, PhaseOutcome, PipelineRun, PipelineState};
use crate::scout::scan::scan_page;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Sequences scan → synthesis → execution → reporting for one target.
///
/// Scan and synthesis failures abort the run. Execution and reporting
/// failures are recorded and the run still reaches `Done`.
pub struct Pipeline<'a> {
    pub launcher: &'a dyn BrowserLauncher,
    pub model: &'a dyn VisionInference,
    pub runner: CommandSpec,
    pub reporting: ReportCommands,
}

struct Driver<'t> {
    run: PipelineRun,
    tracer: &'t TraceLogger,
    step: u64,
    traced_diagnostics: usize,
}

impl Driver<'_> {
    fn enter(&mut self, next: PipelineState) {
        self.move_to(next, None);
    }

    fn move_to(&mut self, next: PipelineState, finished: Option<(Phase, PhaseOutcome)>) {
        let from = self.run.state();
        if let Err(e) = self.run.transition(next) {
            // Only reachable through a sequencing bug in `Pipeline::run`
            error!(error = %e, "rejected pipeline transition");
            return;
        }
        self.step += 1;

        let mut event = TraceEvent::transition(self.step, from, next);
        if let Some((phase, outcome)) = finished {
            self.run.record(phase, outcome);
            event = event.with_outcome(phase, outcome);
        }
        if self.run.diagnostics.len() > self.traced_diagnostics {
            if let Some(last) = self.run.diagnostics.last() {
                event = event.with_message(&last.message);
            }
            self.traced_diagnostics = self.run.diagnostics.len();
        }
        self.tracer.log(&event);
        info!(from = ?from, to = ?next, "pipeline state");
    }

    /// Record `phase` as finished and move on.
    fn finish(&mut self, phase: Phase, outcome: PhaseOutcome, next: PipelineState) {
        self.move_to(next, Some((phase, outcome)));
    }

    /// Record a failure the run can continue past, or escalate one that
    /// should have aborted it.
    fn contain(&mut self, phase: Phase, err: &ForgeError) -> PhaseOutcome {
        let level = if err.is_fatal() {
            error!(phase = ?phase, error = %err, "fatal error in a recoverable phase");
            DiagnosticLevel::Fatal
        } else {
            warn!(phase = ?phase, error = %err, "continuing past failure");
            DiagnosticLevel::Warning
        };
        self.run.diagnose(phase, level, err.to_string());
        PhaseOutcome::Failed
    }

    fn abort(mut self, phase: Phase, err: ForgeError) -> PipelineRun {
        error!(phase = ?phase, error = %err, "pipeline aborted");
        self.run.diagnose(phase, DiagnosticLevel::Fatal, err.to_string());
        self.finish(phase, PhaseOutcome::Failed, PipelineState::Aborted);
        let skipped: Vec<Phase> = Phase::ALL
            .into_iter()
            .filter(|p| self.run.outcome(*p).is_none())
            .collect();
        for phase in skipped {
            self.run.record(phase, PhaseOutcome::Skipped);
        }
        self.run.fatal = Some(err);
        self.run
    }
}

impl Pipeline<'_> {
    pub fn run(&self, ctx: &RunContext, url: &str, goal: &str) -> PipelineRun {
        let tracer = match std::fs::create_dir_all(ctx.root()) {
            Ok(()) => TraceLogger::create(&ctx.trace_path()),
            Err(e) => {
                warn!(error = %e, "output directory unavailable; trace disabled");
                TraceLogger::disabled()
            }
        };
        let mut driver = Driver {
            run: PipelineRun::new(),
            tracer: &tracer,
            step: 0,
            traced_diagnostics: 0,
        };

        // ---- Discovery ----
        driver.enter(PipelineState::Scanning);
        if let Err(e) = scan_page(self.launcher, ctx, url) {
            let message = format!("scan failed: {}", e);
            driver
                .run
                .diagnose(Phase::Discovery, DiagnosticLevel::Warning, message);
            return driver.abort(Phase::Discovery, ForgeError::MissingIntelligence);
        }
        match load(ctx) {
            Ok(Some(report)) => {
                if report.elements.is_empty() {
                    driver.run.diagnose(
                        Phase::Discovery,
                        DiagnosticLevel::Info,
                        "no interactive elements found; synthesizing from the screenshot alone",
                    );
                }
                driver.run.element_count = Some(report.elements.len());
            }
            Ok(None) => return driver.abort(Phase::Discovery, ForgeError::MissingIntelligence),
            Err(e) => {
                driver
                    .run
                    .diagnose(Phase::Discovery, DiagnosticLevel::Warning, e.to_string());
                return driver.abort(Phase::Discovery, ForgeError::MissingIntelligence);
            }
        }
        driver.finish(Phase::Discovery, PhaseOutcome::Succeeded, PipelineState::Synthesizing);

        // ---- Synthesis ----
        let request = SynthesisRequest::for_context(ctx, goal);
        match synthesize(ctx, self.model, &request) {
            Ok(synthesis) => driver.run.written = Some(synthesis.written),
            Err(e) => return driver.abort(Phase::Synthesis, e),
        }
        driver.finish(Phase::Synthesis, PhaseOutcome::Succeeded, PipelineState::Executing);

        // ---- Execution ----
        let outcome = execute(&self.runner, &ctx.test_spec_path());
        let execution_result = match outcome.failure() {
            None => PhaseOutcome::Succeeded,
            Some(failure) => driver.contain(Phase::Execution, &failure),
        };
        driver.run.execution = Some(outcome);
        driver.finish(Phase::Execution, execution_result, PipelineState::Reporting);

        // ---- Reporting ----
        let reporting_result = match report(&self.reporting) {
            Ok(handle) => {
                driver.run.report = Some(handle);
                PhaseOutcome::Succeeded
            }
            Err(e) => driver.contain(Phase::Reporting, &e),
        };
        driver.finish(Phase::Reporting, reporting_result, PipelineState::Done);

        driver.run
    }
}
