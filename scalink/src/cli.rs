use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use scalink_lib::scope::command::AcquireMode;
use scalink_lib::{CipherMode, TargetOptions};
use std::time::Duration;

use crate::config::{Defaults, ScalinkConfig, ScopeSetupConfig};

/// Settings after merging CLI arguments over the config file.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub port: String,
    pub baud: u32,
    pub scope: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub mode: CipherMode,
    pub target: TargetOptions,
    pub scope_setup: ScopeSetupConfig,
    pub acquisition: AcquireMode,
    pub quiet: bool,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "scalink side-channel capture CLI", long_about = None)]
pub struct Cli {
    /// JSON configuration file path
    #[arg(long = "config", short = 'f')]
    pub config: Option<String>,

    /// Target serial port device
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Target serial baud rate (default: 19200)
    #[arg(short = 'b', long = "baud")]
    pub baud: Option<u32>,

    /// Scope address, `host` or `host:port` (default port: 5555)
    #[arg(short = 's', long = "scope")]
    pub scope: Option<String>,

    /// Give up waiting on the scope after this many milliseconds (default: 10000)
    #[arg(long = "poll-timeout-ms")]
    pub poll_timeout_ms: Option<u64>,

    /// Delay between scope status queries (default: 100)
    #[arg(long = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,

    /// Challenge preset (default: "Piece of SCAke")
    #[arg(short = 'c', long = "challenge")]
    pub challenge: Option<String>,

    /// Cipher direction of the go command (default: encrypt)
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<CipherMode>,

    /// Suppress progress output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the challenge presets
    #[command(name = "challenges")]
    Challenges,

    /// Run one go/response exchange with the target
    #[command(name = "target")]
    Target(TargetExchange),

    /// Capture a single waveform from the scope
    #[command(name = "scope")]
    Scope(ScopeCapture),

    /// Capture full traces, written as JSON lines
    #[command(name = "capture")]
    Capture(Capture),
}

#[derive(Parser, Debug, Clone)]
pub struct TargetExchange {
    /// Input block in hex (default: all zero)
    #[arg(long = "text")]
    pub text: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ScopeCapture {
    /// Send the channel and trigger setup before capturing
    #[arg(long = "setup")]
    pub setup: bool,

    /// Print the timebase and channel scales after capturing
    #[arg(long = "scales")]
    pub scales: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct Capture {
    /// Number of traces
    #[arg(short = 'n', long = "traces", default_value_t = Defaults::TRACES)]
    pub traces: u32,

    /// Input block of the first trace in hex (default: all zero)
    #[arg(long = "text")]
    pub text: Option<String>,

    /// Use each trace's output as the next trace's input
    #[arg(long = "chain")]
    pub chain: bool,

    /// Output file, stdout when omitted
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Send the scope setup before the first trace
    #[arg(long = "setup")]
    pub setup: bool,
}

/// Merge CLI arguments with configuration file, CLI args take precedence
pub fn merge_config(args: &Cli, config: Option<ScalinkConfig>) -> Result<MergedConfig> {
    let base_config = config.unwrap_or_else(ScalinkConfig::with_defaults);

    let port = args
        .port
        .clone()
        .unwrap_or_else(|| base_config.port.clone());
    let baud = args.baud.unwrap_or(base_config.baud);
    let scope = args.scope.clone().or_else(|| base_config.scope.clone());

    let poll_interval_ms = args
        .poll_interval_ms
        .unwrap_or(base_config.poll_interval_ms);
    let poll_timeout_ms = args.poll_timeout_ms.unwrap_or(base_config.poll_timeout_ms);
    if poll_timeout_ms == 0 {
        bail!("Poll timeout must be greater than zero");
    }

    let mode = match args.mode {
        Some(m) => m,
        None => base_config
            .parse_mode()
            .map_err(|e| anyhow!("Invalid mode in config: {}", e))?,
    };

    let acquisition = base_config
        .scope_setup
        .parse_acquisition()
        .map_err(|e| anyhow!("Invalid scope setup in config: {}", e))?;

    let target_config = &base_config.target;
    let target = TargetOptions {
        key_len: target_config.key_len,
        input_len: target_config.input_len,
        output_len: target_config.output_len,
        key_cmd: target_config.key_cmd.clone(),
        input_cmd: target_config.input_cmd.clone(),
        go_cmd: target_config
            .go_cmd
            .clone()
            .unwrap_or_else(|| mode.go_command().to_string()),
        output_format: target_config.output_format.clone(),
        challenge: args
            .challenge
            .clone()
            .unwrap_or_else(|| base_config.challenge.clone()),
    };
    target.validate()?;

    Ok(MergedConfig {
        port,
        baud,
        scope,
        poll_interval: Duration::from_millis(poll_interval_ms),
        poll_timeout: Duration::from_millis(poll_timeout_ms),
        mode,
        target,
        scope_setup: base_config.scope_setup.clone(),
        acquisition,
        quiet: args.quiet || base_config.quiet,
    })
}

/// Determine which command to execute from CLI args or config file
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum CommandSource {
    Cli(Commands),
    Config(ScalinkConfig),
}

pub fn get_command_source(args: &Cli, config: Option<ScalinkConfig>) -> Result<CommandSource> {
    match (&args.command, config) {
        (Some(cmd), _) => Ok(CommandSource::Cli(cmd.clone())),
        (None, Some(cfg)) if cfg.capture.is_some() || cfg.exchange.is_some() => {
            Ok(CommandSource::Config(cfg))
        }
        _ => {
            bail!("No command specified. Use a subcommand or provide a config file with a command.")
        }
    }
}
