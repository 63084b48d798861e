use crate::ops::execution::ExecutionStatus;
use crate::pipeline::state::{DiagnosticLevel, Phase, PhaseOutcome, PipelineRun, PipelineState};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a pipeline run for terminal output.
///
/// Produces output like:
/// ```text
/// === TestForge run: https://example.com ===
///
/// ✓ Discovery   12 interactive elements
/// ✓ Synthesis   pages/GeneratedPage.ts (3f2a9c1), tests/login_flow.spec.ts (9be01d4)
/// ✗ Execution   failed (exit code 1)
/// ✓ Reporting   allure-report
///     [WARN] Test execution failed (exit code 1)
///
/// === Finished: Done, with failures (check the report) ===
/// ```
pub fn format_run_summary(run: &PipelineRun, url: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== TestForge run: {} ===\n\n", url));

    for (phase, outcome) in run.outcomes() {
        let marker = match outcome {
            PhaseOutcome::Succeeded => "\u{2713}",
            PhaseOutcome::Failed => "\u{2717}",
            PhaseOutcome::Skipped => "-",
        };
        let detail = match (phase, outcome) {
            (_, PhaseOutcome::Skipped) => "skipped".to_string(),
            (Phase::Discovery, PhaseOutcome::Succeeded) => format!(
                "{} interactive elements",
                run.element_count.unwrap_or_default()
            ),
            (Phase::Synthesis, PhaseOutcome::Succeeded) => run
                .written
                .as_ref()
                .map(|w| {
                    format!(
                        "{} ({}), {} ({})",
                        w.page_object.path.display(),
                        short_digest(&w.page_object.sha1),
                        w.test_spec.path.display(),
                        short_digest(&w.test_spec.sha1)
                    )
                })
                .unwrap_or_default(),
            (Phase::Execution, _) => match &run.execution {
                Some(e) if e.status == ExecutionStatus::Passed => "passed".to_string(),
                Some(e) => match e.exit_code {
                    Some(code) => format!("failed (exit code {})", code),
                    None => "failed (runner did not start)".to_string(),
                },
                None => String::new(),
            },
            (Phase::Reporting, PhaseOutcome::Succeeded) => run
                .report
                .as_ref()
                .map(|r| r.report_dir.display().to_string())
                .unwrap_or_default(),
            _ => "failed".to_string(),
        };

        out.push_str(&format!("{} {:<11} {}\n", marker, format!("{:?}", phase), detail));
    }

    for diag in &run.diagnostics {
        let level = match diag.level {
            DiagnosticLevel::Info => "INFO",
            DiagnosticLevel::Warning => "WARN",
            DiagnosticLevel::Fatal => "FATAL",
        };
        out.push_str(&format!("    [{}] {}\n", level, diag.message));
    }

    let verdict = match run.state() {
        PipelineState::Done if run.succeeded() => "Done, all generated tests passed".to_string(),
        PipelineState::Done => "Done, with failures (check the report)".to_string(),
        other => format!("{:?}", other),
    };
    out.push_str(&format!("\n=== Finished: {} ===\n", verdict));

    out
}

fn short_digest(sha1: &str) -> &str {
    &sha1[..sha1.len().min(7)]
}
