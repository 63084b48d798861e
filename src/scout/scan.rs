use tracing::{info, warn};

use crate::browser::driver::{BrowserLauncher, PageGuard};
use crate::error::Result;
use crate::intel::report::{IntelligenceReport, capture_with_existing_screenshot};
use crate::pipeline::context::RunContext;
use crate::scout::discovery::{discover, duplicate_selectors};

/// Load `url` in a fresh page, discover and mark its interactive elements,
/// capture the marked page and persist the intelligence report.
///
/// Marking and capture happen together here so an unmarked page is never
/// captured. The page is closed on every exit path.
pub fn scan_page(
    launcher: &dyn BrowserLauncher,
    ctx: &RunContext,
    url: &str,
) -> Result<IntelligenceReport> {
    info!(url, "scanning page");
    ctx.prepare()?;

    let mut guard = PageGuard::new(launcher.launch()?);
    let page = guard.page();

    page.navigate(url)?;
    let elements = discover(page)?;

    for (selector, ordinals) in duplicate_selectors(&elements) {
        warn!(
            selector = %selector,
            ordinals = ?ordinals,
            "selector is shared by several elements"
        );
    }

    let shot_path = ctx.screenshot_path();
    page.screenshot(&shot_path, true)?;
    info!(path = %shot_path.display(), "captured marked screenshot");

    let report = capture_with_existing_screenshot(ctx, url, elements)?;
    info!(elements = report.element_count, "mapped interactive zones");
    Ok(report)
}
