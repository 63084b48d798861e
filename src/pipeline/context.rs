use std::path::{Path, PathBuf};

use crate::error::{ForgeError, Result};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_PAGE_CLASS: &str = "GeneratedPage";
pub const DEFAULT_SPEC_FILE: &str = "login_gemini.spec.ts";

const INTEL_DIR: &str = "vision_intel";
const REPORT_FILE: &str = "scout_report.json";
const SCREENSHOT_FILE: &str = "vision.png";
const GENERATED_DIR: &str = "generated_tests";
const TRACE_FILE: &str = "pipeline_trace.jsonl";

/// Every path one pipeline invocation reads or writes.
///
/// Nothing in the core resolves paths against the process working
/// directory; stages receive a `RunContext` and only touch what it names.
/// Each slot holds a single current artifact that the next run overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    root: PathBuf,
    page_class: String,
    spec_file: String,
}

impl RunContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_class: DEFAULT_PAGE_CLASS.to_string(),
            spec_file: DEFAULT_SPEC_FILE.to_string(),
        }
    }

    /// Derive the generated test file name from a testing goal,
    /// e.g. "Add backpack to cart" -> `add_backpack_to_cart.spec.ts`.
    pub fn with_goal(mut self, goal: &str) -> Self {
        let slug = sanitize_filename(goal.trim());
        if !slug.is_empty() {
            self.spec_file = format!("{}.spec.ts", slug);
        }
        self
    }

    pub fn with_page_class(mut self, class_name: &str) -> Self {
        if !class_name.trim().is_empty() {
            self.page_class = class_name.trim().to_string();
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_class(&self) -> &str {
        &self.page_class
    }

    pub fn intel_dir(&self) -> PathBuf {
        self.root.join(INTEL_DIR)
    }

    pub fn report_path(&self) -> PathBuf {
        self.intel_dir().join(REPORT_FILE)
    }

    pub fn screenshot_path(&self) -> PathBuf {
        self.intel_dir().join(SCREENSHOT_FILE)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.root.join(GENERATED_DIR)
    }

    /// Page object, relative to `generated_dir()`: `pages/<Class>.ts`.
    pub fn page_object_relative(&self) -> PathBuf {
        Path::new("pages").join(format!("{}.ts", self.page_class))
    }

    /// Test spec, relative to `generated_dir()`: `tests/<file>`.
    pub fn test_spec_relative(&self) -> PathBuf {
        Path::new("tests").join(&self.spec_file)
    }

    pub fn page_object_path(&self) -> PathBuf {
        self.generated_dir().join(self.page_object_relative())
    }

    pub fn test_spec_path(&self) -> PathBuf {
        self.generated_dir().join(self.test_spec_relative())
    }

    pub fn trace_path(&self) -> PathBuf {
        self.root.join(TRACE_FILE)
    }

    /// Create the intelligence directory so a scan can write into it.
    pub fn prepare(&self) -> Result<()> {
        let dir = self.intel_dir();
        std::fs::create_dir_all(&dir).map_err(|e| ForgeError::io(dir, e))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

/// Sanitize a free-form name into a safe filename stem.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase()
}
