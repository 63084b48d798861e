use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// An external program and its fixed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn command(&self, extra: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(path) = extra {
            cmd.arg(path);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ForgeError {
        ForgeError::SubprocessSpawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn output(&self, extra: Option<&Path>) -> Result<Output> {
        self.command(extra)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))
    }

    /// Start without waiting; output is discarded.
    pub fn spawn_detached(&self) -> Result<Child> {
        self.command(None)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
