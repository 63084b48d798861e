use std::path::Path;

use serde_json::Value;

use crate::error::Result;

/// The browser capabilities the scanner needs from a loaded page.
pub trait PageDriver {
    /// Navigate and wait until the network is idle.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Run a script in the page and return its JSON-serializable result.
    fn evaluate(&mut self, script: &str) -> Result<Value>;

    /// Write a PNG screenshot of the current page to `path`.
    fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()>;

    /// Release the page and its browser. Must be safe to call twice.
    fn close(&mut self) -> Result<()>;
}

/// Produces a fresh page for one stage.
pub trait BrowserLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>>;
}

/// Closes the wrapped page on every exit path, including early returns
/// through `?`.
pub struct PageGuard {
    page: Box<dyn PageDriver>,
}

impl PageGuard {
    pub fn new(page: Box<dyn PageDriver>) -> Self {
        Self { page }
    }

    pub fn page(&mut self) -> &mut dyn PageDriver {
        self.page.as_mut()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Err(e) = self.page.close() {
            tracing::warn!(error = %e, "failed to close browser page");
        }
    }
}
