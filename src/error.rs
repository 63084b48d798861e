use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Error)]
pub enum ForgeError {
    /// No valid intelligence report (record or screenshot missing)
    #[error("No intelligence report found; run a scan first")]
    MissingIntelligence,

    /// The screenshot referenced by the report cannot be read
    #[error("Screenshot missing or unreadable: {}", path.display())]
    MissingScreenshot { path: PathBuf },

    /// Model response failed shape validation
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Test runner exited non-zero or could not be started
    #[error("Test execution failed ({})", exit_label(.exit_code))]
    ExecutionFailure {
        exit_code: Option<i32>,
        output: String,
    },

    /// Report generation failed
    #[error("Reporting failed: {0}")]
    ReportingFailure(String),

    /// Child process failed to spawn
    #[error("Failed to spawn {program} (is it installed?): {source}")]
    SubprocessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe to the browser driver broke or returned nothing
    #[error("Browser session I/O: {0}")]
    SessionIO(String),

    /// Browser driver answered with ok=false or an unexpected shape
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to model backend failed: {0}")]
    Http(#[source] reqwest::Error),

    /// Model backend answered with an error payload or status
    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("API key not set (looked in {0})")]
    MissingApiKey(String),

    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Request URLs can carry credentials, so they never reach the message.
impl From<reqwest::Error> for ForgeError {
    fn from(e: reqwest::Error) -> Self {
        ForgeError::Http(e.without_url())
    }
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "runner did not start".to_string(),
    }
}

impl ForgeError {
    /// Fatal kinds abort the remaining pipeline; execution and reporting
    /// failures are recorded as outcomes instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ForgeError::ExecutionFailure { .. } | ForgeError::ReportingFailure(_)
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForgeError::Io {
            path: path.into(),
            source,
        }
    }
}
