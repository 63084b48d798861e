//! TestForge: scan a live page, let a vision model write a Playwright page
//! object and test spec for it, run the spec and build a report.

pub mod error;

pub mod browser {
    pub mod driver;
    pub mod session;
}

pub mod scout {
    pub mod discovery;
    pub mod element;
    pub mod scan;
}

pub mod intel {
    pub mod report;
}

pub mod architect {
    pub mod artifacts;
    pub mod healer;
    pub mod inference;
    pub mod prompt;
    pub mod response;
    pub mod synthesis;
}

pub mod ops {
    pub mod command;
    pub mod execution;
    pub mod reporting;
}

pub mod pipeline {
    pub mod context;
    pub mod orchestrator;
    pub mod state;
}

pub mod report {
    pub mod console;
}

pub mod trace {
    #[allow(clippy::module_inception)]
    pub mod trace;
    pub mod logger;
}

pub mod cli {
    pub mod commands;
    pub mod config;
}

pub use error::{ForgeError, Result};
pub use pipeline::context::RunContext;
pub use pipeline::orchestrator::Pipeline;
