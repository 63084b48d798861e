use clap::Parser;
use testforge::cli::commands::{
    CliContext, cmd_execute, cmd_heal, cmd_models, cmd_report, cmd_scan, cmd_start, cmd_synthesize,
};
use testforge::cli::config::{Cli, Commands, load_config};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    let ctx = CliContext {
        config: &config,
        output_dir: cli.output_dir.as_deref(),
        provider: cli.provider.as_deref(),
        model: cli.model.as_deref(),
    };

    match cli.command {
        Commands::Start { goal, url } => {
            if !cmd_start(&ctx, &goal, &url)? {
                std::process::exit(1);
            }
        }
        Commands::Scan { url } => cmd_scan(&ctx, &url)?,
        Commands::Synthesize { goal } => cmd_synthesize(&ctx, &goal)?,
        Commands::Execute { goal } => {
            if !cmd_execute(&ctx, &goal)? {
                std::process::exit(1);
            }
        }
        Commands::Report => cmd_report(&ctx)?,
        Commands::Heal {
            selector,
            html,
            file,
        } => cmd_heal(&ctx, &selector, &html, file.as_deref())?,
        Commands::Models => cmd_models(&ctx)?,
    }

    Ok(())
}
