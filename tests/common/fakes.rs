use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use serde_json::{Value, json};
use testforge::browser::driver::{BrowserLauncher, PageDriver};
use testforge::error::{ForgeError, Result};

/// Bytes written by `FakePage::screenshot`; starts with the PNG magic.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

/// Raw candidate as the collection script would return it.
pub fn candidate(
    index: usize,
    tag: &str,
    id: Option<&str>,
    class_name: Option<&str>,
    name: Option<&str>,
    size: (f64, f64),
) -> Value {
    json!({
        "index": index,
        "tag": tag,
        "id": id,
        "className": class_name,
        "name": name,
        "innerText": null,
        "placeholder": null,
        "rect": { "x": 10.0 * index as f64, "y": 20.0, "width": size.0, "height": size.1 },
        "visibility": "visible"
    })
}

/// The three login inputs of a typical sign-in page.
pub fn login_candidates() -> Value {
    let field = |index, id| {
        candidate(index, "input", Some(id), Some("input_error form_input"), Some(id), (200.0, 40.0))
    };
    json!([
        field(0, "user-name"),
        field(1, "password"),
        candidate(
            2,
            "input",
            Some("login-button"),
            Some("submit-button btn_action"),
            Some("login-button"),
            (200.0, 40.0),
        ),
    ])
}

/// Records what the page was asked to do.
#[derive(Default)]
pub struct PageLog {
    pub navigations: RefCell<Vec<String>>,
    pub scripts: RefCell<Vec<String>>,
    pub screenshots: Cell<usize>,
    pub closes: Cell<usize>,
    pub launches: Cell<usize>,
}

pub struct FakePage {
    candidates: Value,
    fail_navigation: bool,
    log: Rc<PageLog>,
}

impl PageDriver for FakePage {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.navigations.borrow_mut().push(url.to_string());
        if self.fail_navigation {
            return Err(ForgeError::SessionProtocol {
                command: "navigate".into(),
                error: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<Value> {
        self.log.scripts.borrow_mut().push(script.to_string());
        if script.contains("querySelectorAll") {
            Ok(self.candidates.clone())
        } else {
            Ok(json!(0))
        }
    }

    fn screenshot(&mut self, path: &Path, _full_page: bool) -> Result<()> {
        self.log.screenshots.set(self.log.screenshots.get() + 1);
        std::fs::write(path, FAKE_PNG).map_err(|e| ForgeError::io(path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.log.closes.set(self.log.closes.get() + 1);
        Ok(())
    }
}

/// Hands out `FakePage`s that serve a fixed candidate list.
pub struct FakeLauncher {
    pub candidates: Value,
    pub fail_navigation: bool,
    pub log: Rc<PageLog>,
}

impl FakeLauncher {
    pub fn new(candidates: Value) -> Self {
        Self {
            candidates,
            fail_navigation: false,
            log: Rc::new(PageLog::default()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_navigation: true,
            ..Self::new(json!([]))
        }
    }

    /// Scripts that were not the collection script.
    pub fn mark_scripts(&self) -> Vec<String> {
        self.log
            .scripts
            .borrow()
            .iter()
            .filter(|s| !s.contains("querySelectorAll"))
            .cloned()
            .collect()
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>> {
        self.log.launches.set(self.log.launches.get() + 1);
        Ok(Box::new(FakePage {
            candidates: self.candidates.clone(),
            fail_navigation: self.fail_navigation,
            log: Rc::clone(&self.log),
        }))
    }
}
