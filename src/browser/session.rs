use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::browser::driver::{BrowserLauncher, PageDriver};
use crate::error::{ForgeError, Result};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
        wait_until: &'static str,
    },
    Evaluate {
        script: String,
    },
    Screenshot {
        path: String,
        full_page: bool,
    },
    Quit,
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            url: url.to_string(),
            wait_until: "networkidle",
        }
    }

    pub fn evaluate(script: &str) -> Self {
        BrowserRequest::Evaluate {
            script: script.to_string(),
        }
    }

    pub fn screenshot(path: &Path, full_page: bool) -> Self {
        BrowserRequest::Screenshot {
            path: path.display().to_string(),
            full_page,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Evaluate { .. } => "evaluate",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium page open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    /// Launch a new browser session by spawning the driver script.
    pub fn launch(script: &Path, headless: bool) -> Result<Self> {
        let mut child = Command::new("node")
            .arg(script)
            .arg(if headless { "--headless" } else { "--headed" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ForgeError::SubprocessSpawn {
                program: format!("node {}", script.display()),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ForgeError::SessionIO("Failed to capture stdin of browser_server.js".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ForgeError::SessionIO("Failed to capture stdout of browser_server.js".into())
        })?;

        let mut session = BrowserSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let response = session.read_response("browser_server.js ready signal")?;
        if !response.ok || response.ready != Some(true) {
            return Err(ForgeError::SessionProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from browser_server.js".into(),
            });
        }

        debug!(script = %script.display(), headless, "browser session ready");
        Ok(session)
    }

    fn read_response(&mut self, context: &str) -> Result<BrowserResponse> {
        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            ForgeError::SessionIO(format!("Failed to read from browser_server.js stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(ForgeError::SessionIO(
                "Empty response from browser_server.js (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| ForgeError::JsonParse {
            context: context.into(),
            source: e,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse> {
        let json = serde_json::to_string(request).map_err(|e| ForgeError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json).map_err(|e| {
            ForgeError::SessionIO(format!("Failed to write to browser_server.js stdin: {}", e))
        })?;

        self.stdin.flush().map_err(|e| {
            ForgeError::SessionIO(format!("Failed to flush browser_server.js stdin: {}", e))
        })?;

        self.read_response("browser_server.js response")
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest) -> Result<BrowserResponse> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(ForgeError::SessionProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.send_ok(&BrowserRequest::navigate(url))?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<Value> {
        let response = self.send_ok(&BrowserRequest::evaluate(script))?;
        Ok(response.data.unwrap_or(Value::Null))
    }

    fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        self.send_ok(&BrowserRequest::screenshot(path, full_page))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Best-effort quit; the process may already be gone
        let _ = self.send(&BrowserRequest::Quit);
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Launches `BrowserSession`s against a driver script.
#[derive(Debug, Clone)]
pub struct NodeLauncher {
    pub script: PathBuf,
    pub headless: bool,
}

impl BrowserLauncher for NodeLauncher {
    fn launch(&self) -> Result<Box<dyn PageDriver>> {
        Ok(Box::new(BrowserSession::launch(&self.script, self.headless)?))
    }
}
