use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ForgeError, Result};
use crate::pipeline::context::RunContext;
use crate::scout::element::InteractiveElement;

// ============================================================================
// Intelligence report: one scan's elements plus its marked screenshot
// ============================================================================

/// Persisted result of one scan.
///
/// Valid only while both the JSON record and the context's screenshot
/// exist on disk; `load()` treats a report with either missing as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub screenshot_path: PathBuf,

    /// SHA-1 of the screenshot bytes at capture time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_sha1: Option<String>,

    #[serde(default)]
    pub element_count: usize,

    /// Discovery order; the same order the model sees
    #[serde(rename = "interactiveElements")]
    pub elements: Vec<InteractiveElement>,
}

impl IntelligenceReport {
    /// The leading `limit` elements, in discovery order.
    pub fn element_prefix(&self, limit: usize) -> &[InteractiveElement] {
        &self.elements[..self.elements.len().min(limit)]
    }
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ForgeError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| ForgeError::io(path, e))
}

/// Write the screenshot, then the record that references it.
pub fn capture(
    ctx: &RunContext,
    url: &str,
    elements: Vec<InteractiveElement>,
    screenshot: &[u8],
) -> Result<IntelligenceReport> {
    let shot_path = ctx.screenshot_path();
    write_file(&shot_path, screenshot)?;
    write_record(ctx, url, elements, shot_path, sha1_hex(screenshot))
}

/// Write the record for a screenshot the browser already saved at
/// `ctx.screenshot_path()`.
pub fn capture_with_existing_screenshot(
    ctx: &RunContext,
    url: &str,
    elements: Vec<InteractiveElement>,
) -> Result<IntelligenceReport> {
    let shot_path = ctx.screenshot_path();
    let bytes = std::fs::read(&shot_path).map_err(|_| ForgeError::MissingScreenshot {
        path: shot_path.clone(),
    })?;
    write_record(ctx, url, elements, shot_path, sha1_hex(&bytes))
}

fn write_record(
    ctx: &RunContext,
    url: &str,
    elements: Vec<InteractiveElement>,
    screenshot_path: PathBuf,
    digest: String,
) -> Result<IntelligenceReport> {
    let report = IntelligenceReport {
        url: url.to_string(),
        timestamp: Utc::now(),
        screenshot_path: absolute(screenshot_path),
        screenshot_sha1: Some(digest),
        element_count: elements.len(),
        elements,
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| ForgeError::JsonSerialize {
        context: "IntelligenceReport".into(),
        source: e,
    })?;

    let record_path = ctx.report_path();
    write_file(&record_path, json.as_bytes())?;

    info!(
        path = %record_path.display(),
        elements = report.element_count,
        "intelligence report saved"
    );
    Ok(report)
}

/// Read the current report. `None` when the record or its screenshot is
/// missing; an unparseable record is an error.
pub fn load(ctx: &RunContext) -> Result<Option<IntelligenceReport>> {
    let record_path = ctx.report_path();
    let content = match std::fs::read_to_string(&record_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %record_path.display(), "no intelligence record");
            return Ok(None);
        }
        Err(e) => return Err(ForgeError::io(record_path, e)),
    };

    let mut report: IntelligenceReport =
        serde_json::from_str(&content).map_err(|e| ForgeError::JsonParse {
            context: format!("intelligence report {}", record_path.display()),
            source: e,
        })?;

    // The context owns the screenshot slot; the recorded path is informational
    let shot_path = ctx.screenshot_path();
    if !shot_path.is_file() {
        debug!(
            screenshot = %shot_path.display(),
            "intelligence record has no screenshot"
        );
        return Ok(None);
    }
    report.screenshot_path = absolute(shot_path);

    Ok(Some(report))
}
