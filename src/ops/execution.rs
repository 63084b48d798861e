use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ForgeError;
use crate::ops::command::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionStatus {
    Passed,
    Failed,
}

/// What the test runner reported for one generated spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub raw_output: String,
}

impl ExecutionOutcome {
    pub fn passed(&self) -> bool {
        self.status == ExecutionStatus::Passed
    }

    /// The failure in error form, for recording as a diagnostic.
    pub fn failure(&self) -> Option<ForgeError> {
        (!self.passed()).then(|| ForgeError::ExecutionFailure {
            exit_code: self.exit_code,
            output: self.raw_output.clone(),
        })
    }
}

/// Run `runner <spec_path>` and capture the result.
///
/// A non-zero exit, or a runner that cannot be started, is a `Failed`
/// outcome rather than an error; the caller decides what to do with it.
pub fn execute(runner: &CommandSpec, spec_path: &Path) -> ExecutionOutcome {
    info!(runner = %runner, target = %spec_path.display(), "executing generated test");

    let output = match runner.output(Some(spec_path)) {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "test runner could not be started");
            return ExecutionOutcome {
                status: ExecutionStatus::Failed,
                exit_code: None,
                raw_output: e.to_string(),
            };
        }
    };

    let mut raw_output = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !raw_output.is_empty() && !raw_output.ends_with('\n') {
            raw_output.push('\n');
        }
        raw_output.push_str(&stderr);
    }

    let exit_code = output.status.code();
    let status = if output.status.success() {
        info!("generated tests passed");
        ExecutionStatus::Passed
    } else {
        warn!(exit_code = ?exit_code, "generated tests failed");
        ExecutionStatus::Failed
    };

    ExecutionOutcome {
        status,
        exit_code,
        raw_output,
    }
}
