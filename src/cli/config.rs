use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::ops::command::CommandSpec;
use crate::ops::reporting::ReportCommands;
use crate::pipeline::context::{DEFAULT_OUTPUT_DIR, DEFAULT_PAGE_CLASS, RunContext};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "testforge",
    version,
    about = "AI-powered end-to-end test generation: scan, architect, run, report"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: testforge.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory holding scan results and generated tests
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Model provider: gemini or ollama
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name for the selected provider
    #[arg(long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Full cycle: scan -> architect -> run -> report
    Start {
        /// The testing goal, e.g. "Login to app"
        goal: String,

        /// Target URL to test
        #[arg(short, long)]
        url: String,
    },

    /// Scan a page and save the intelligence report
    Scan {
        #[arg(short, long)]
        url: String,
    },

    /// Generate the page object and test spec from the saved report
    Synthesize {
        /// The testing goal (also names the generated spec file)
        #[arg(long, default_value = "")]
        goal: String,
    },

    /// Run the generated test spec
    Execute {
        /// Goal used when the test file was generated
        #[arg(long, default_value = "")]
        goal: String,
    },

    /// Generate and open the test report
    Report,

    /// Ask the model for a replacement for a broken selector
    Heal {
        /// The selector that no longer matches
        #[arg(long)]
        selector: String,

        /// Saved HTML of the page as it is now
        #[arg(long)]
        html: String,

        /// File to patch with the healed selector
        #[arg(long)]
        file: Option<String>,
    },

    /// List Gemini models that support content generation
    Models,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `testforge.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_driver_script")]
    pub driver_script: String,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            driver_script: default_driver_script(),
            headless: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    pub model: Option<String>,

    /// Ollama endpoint or Gemini base URL override
    pub endpoint: Option<String>,

    /// Environment variables searched, in order, for the Gemini API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            endpoint: None,
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_runner")]
    pub command: CommandSpec,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_report_generate")]
    pub generate: CommandSpec,

    #[serde(default = "default_report_open")]
    pub open: Option<CommandSpec>,

    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            generate: default_report_generate(),
            open: default_report_open(),
            report_dir: default_report_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,

    #[serde(default = "default_page_class")]
    pub page_class: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            page_class: default_page_class(),
        }
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_driver_script() -> String { "driver/browser_server.js".to_string() }
fn default_provider() -> String { "gemini".to_string() }
fn default_api_key_env() -> Vec<String> {
    vec!["GEMINI_API_KEY".to_string(), "GOOGLE_API_KEY".to_string()]
}
fn default_runner() -> CommandSpec { CommandSpec::new("npx", &["playwright", "test"]) }
fn default_report_generate() -> CommandSpec {
    CommandSpec::new(
        "npx",
        &["allure", "generate", "allure-results", "--clean", "-o", "allure-report"],
    )
}
fn default_report_open() -> Option<CommandSpec> {
    Some(CommandSpec::new("npx", &["allure", "open", "allure-report"]))
}
fn default_report_dir() -> String { "allure-report".to_string() }
fn default_output_dir() -> String { DEFAULT_OUTPUT_DIR.to_string() }
fn default_page_class() -> String { DEFAULT_PAGE_CLASS.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("testforge.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build the run context: CLI output dir > config > default.
pub fn build_run_context(config: &AppConfig, output_dir: Option<&str>, goal: &str) -> RunContext {
    let root = output_dir.unwrap_or(config.output.dir.as_str());
    RunContext::new(root)
        .with_page_class(&config.output.page_class)
        .with_goal(goal)
}

pub fn build_report_commands(config: &AppConfig) -> ReportCommands {
    ReportCommands {
        generate: config.reporting.generate.clone(),
        open: config.reporting.open.clone(),
        report_dir: PathBuf::from(&config.reporting.report_dir),
    }
}
