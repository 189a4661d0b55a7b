mod cli;
mod config;
mod config_exec;
mod progress;
mod rig_ops;
mod serial;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use cli::{Cli, CommandSource, Commands, get_command_source, merge_config};
use config::ScalinkConfig;

fn main() {
    // Log level can be controlled by setting the RUST_LOG environment variable, e.g.:
    // RUST_LOG=debug, RUST_LOG=scalink_lib=trace, RUST_LOG=info
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => {
            let config = ScalinkConfig::from_file(path)
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("Failed to load config file '{}'", path))?;
            config
                .validate()
                .map_err(|e| anyhow!("Invalid config file '{}': {}", path, e))?;
            Some(config)
        }
        None => None,
    };

    if let Some(Commands::Challenges) = args.command {
        return rig_ops::execute_challenges();
    }

    let merged = merge_config(&args, config.clone())?;
    tracing::debug!("merged config: {:?}", merged);
    let progress = progress::create_progress_callback(merged.quiet);

    match get_command_source(&args, config)? {
        CommandSource::Cli(command) => match command {
            Commands::Challenges => rig_ops::execute_challenges(),
            Commands::Target(params) => {
                rig_ops::execute_target_exchange(&merged, params.text.as_deref())
            }
            Commands::Scope(params) => {
                rig_ops::execute_scope_capture(&merged, params.setup, params.scales, progress)
            }
            Commands::Capture(params) => rig_ops::execute_capture(
                &merged,
                params.traces,
                params.text.as_deref(),
                params.chain,
                params.output.as_deref(),
                params.setup,
                progress,
            ),
        },
        CommandSource::Config(config) => {
            config_exec::execute_config_command(&config, &merged, progress)
        }
    }
}
