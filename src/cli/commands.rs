use std::path::Path;

use tracing::info;

use crate::architect::healer::{HealOutcome, apply_fix, heal_selector};
use crate::architect::inference::{
    DEFAULT_GEMINI_MODEL, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, GeminiBackend,
    OllamaBackend, TextInference, VisionInference,
};
use crate::architect::prompt::SynthesisRequest;
use crate::architect::synthesis::synthesize;
use crate::browser::session::NodeLauncher;
use crate::cli::config::{AppConfig, build_report_commands, build_run_context};
use crate::error::{ForgeError, Result};
use crate::ops::execution::execute;
use crate::ops::reporting::report;
use crate::pipeline::orchestrator::Pipeline;
use crate::report::console::format_run_summary;
use crate::scout::scan::scan_page;

/// Global options shared by every subcommand.
pub struct CliContext<'a> {
    pub config: &'a AppConfig,
    pub output_dir: Option<&'a str>,
    pub provider: Option<&'a str>,
    pub model: Option<&'a str>,
}

// ============================================================================
// Helpers
// ============================================================================

/// A configured model backend.
pub enum ModelBackend {
    Gemini(GeminiBackend),
    Ollama(OllamaBackend),
}

impl ModelBackend {
    pub fn vision(&self) -> &dyn VisionInference {
        match self {
            ModelBackend::Gemini(b) => b,
            ModelBackend::Ollama(b) => b,
        }
    }

    pub fn text(&self) -> &dyn TextInference {
        match self {
            ModelBackend::Gemini(b) => b,
            ModelBackend::Ollama(b) => b,
        }
    }
}

/// Build the model backend: CLI > config > defaults.
pub fn build_backend(cli: &CliContext<'_>) -> Result<ModelBackend> {
    let model_cfg = &cli.config.model;
    let provider = cli.provider.unwrap_or(model_cfg.provider.as_str());
    let model = cli.model.or(model_cfg.model.as_deref());

    match provider {
        "gemini" => {
            let keys: Vec<&str> = model_cfg.api_key_env.iter().map(String::as_str).collect();
            let model = model.unwrap_or(DEFAULT_GEMINI_MODEL);
            let mut backend = GeminiBackend::from_env(model, &keys)?;
            if let Some(base) = model_cfg.endpoint.as_deref() {
                backend = backend.with_base_url(base);
            }
            Ok(ModelBackend::Gemini(backend))
        }
        "ollama" => Ok(ModelBackend::Ollama(OllamaBackend::new(
            model_cfg.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT),
            model.unwrap_or(DEFAULT_OLLAMA_MODEL),
        ))),
        other => Err(ForgeError::Config(format!(
            "unknown model provider '{}' (expected gemini or ollama)",
            other
        ))),
    }
}

fn build_launcher(config: &AppConfig) -> NodeLauncher {
    NodeLauncher {
        script: config.browser.driver_script.clone().into(),
        headless: config.browser.headless,
    }
}

// ============================================================================
// start subcommand
// ============================================================================

/// Run the full pipeline and return whether the generated tests passed.
pub fn cmd_start(cli: &CliContext<'_>, goal: &str, url: &str) -> Result<bool> {
    let ctx = build_run_context(cli.config, cli.output_dir, goal);
    let backend = build_backend(cli)?;
    let launcher = build_launcher(cli.config);

    let pipeline = Pipeline {
        launcher: &launcher,
        model: backend.vision(),
        runner: cli.config.runner.command.clone(),
        reporting: build_report_commands(cli.config),
    };

    let run = pipeline.run(&ctx, url, goal);
    print!("{}", format_run_summary(&run, url));

    let passed = run.succeeded();
    match run.fatal {
        Some(e) => Err(e),
        None => Ok(passed),
    }
}

// ============================================================================
// Single-stage subcommands
// ============================================================================

pub fn cmd_scan(cli: &CliContext<'_>, url: &str) -> Result<()> {
    let ctx = build_run_context(cli.config, cli.output_dir, "");
    let report = scan_page(&build_launcher(cli.config), &ctx, url)?;
    println!(
        "Mapped {} interactive zones; report saved to {}",
        report.elements.len(),
        ctx.report_path().display()
    );
    Ok(())
}

pub fn cmd_synthesize(cli: &CliContext<'_>, goal: &str) -> Result<()> {
    let ctx = build_run_context(cli.config, cli.output_dir, goal);
    let backend = build_backend(cli)?;
    let synthesis = synthesize(&ctx, backend.vision(), &SynthesisRequest::for_context(&ctx, goal))?;
    println!("Written: {}", synthesis.written.page_object.path.display());
    println!("Written: {}", synthesis.written.test_spec.path.display());
    Ok(())
}

/// Run the generated spec and return whether it passed.
pub fn cmd_execute(cli: &CliContext<'_>, goal: &str) -> Result<bool> {
    let ctx = build_run_context(cli.config, cli.output_dir, goal);
    let outcome = execute(&cli.config.runner.command, &ctx.test_spec_path());
    print!("{}", outcome.raw_output);
    Ok(outcome.passed())
}

pub fn cmd_report(cli: &CliContext<'_>) -> Result<()> {
    let handle = report(&build_report_commands(cli.config))?;
    println!("Report generated in {}", handle.report_dir.display());
    Ok(())
}

pub fn cmd_heal(
    cli: &CliContext<'_>,
    selector: &str,
    html_path: &str,
    target_file: Option<&str>,
) -> Result<()> {
    let html = std::fs::read_to_string(html_path).map_err(|e| ForgeError::io(html_path, e))?;
    let backend = build_backend(cli)?;
    let healed = heal_selector(backend.text(), selector, &html)?;

    match target_file {
        Some(file) => match apply_fix(Path::new(file), selector, &healed)? {
            HealOutcome::Applied { replacements } => {
                println!(
                    "Updated {} ({} occurrences): {} -> {}",
                    file, replacements, selector, healed
                )
            }
            HealOutcome::NotFound => {
                println!("'{}' not found in {}; suggested fix: {}", selector, file, healed)
            }
        },
        None => println!("Suggested fix: {} (pass --file to apply automatically)", healed),
    }
    Ok(())
}

pub fn cmd_models(cli: &CliContext<'_>) -> Result<()> {
    let keys: Vec<&str> = cli.config.model.api_key_env.iter().map(String::as_str).collect();
    let mut gemini = GeminiBackend::from_env(DEFAULT_GEMINI_MODEL, &keys)?;
    if let Some(base) = cli.config.model.endpoint.as_deref() {
        gemini = gemini.with_base_url(base);
    }

    let models = gemini.list_models()?;
    info!(count = models.len(), "available models");
    for name in models {
        println!("  - {}", name);
    }
    Ok(())
}
