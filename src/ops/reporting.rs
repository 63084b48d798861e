use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{ForgeError, Result};
use crate::ops::command::CommandSpec;

/// Report generation and viewing commands.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCommands {
    pub generate: CommandSpec,
    pub open: Option<CommandSpec>,
    pub report_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportHandle {
    pub report_dir: PathBuf,
    pub viewer_launched: bool,
}

/// Build the report (blocking), then launch the viewer without waiting.
///
/// Only generation failures are returned. Viewer problems are logged and
/// otherwise ignored.
pub fn report(commands: &ReportCommands) -> Result<ReportHandle> {
    info!(command = %commands.generate, "generating report");
    let output = commands
        .generate
        .output(None)
        .map_err(|e| ForgeError::ReportingFailure(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ForgeError::ReportingFailure(format!(
            "{} exited with {}: {}",
            commands.generate,
            output.status,
            stderr.trim()
        )));
    }
    info!(dir = %commands.report_dir.display(), "report generated");

    let viewer_launched = match &commands.open {
        Some(open) => match open.spawn_detached() {
            Ok(_child) => {
                info!(command = %open, "opening report viewer");
                true
            }
            Err(e) => {
                warn!(error = %e, "report viewer did not start");
                false
            }
        },
        None => false,
    };

    Ok(ReportHandle {
        report_dir: commands.report_dir.clone(),
        viewer_launched,
    })
}
