use scalink_lib::TargetOptions;
use scalink_lib::scope::command::AcquireMode;
use scalink_lib::target::challenge::DEFAULT_CHALLENGE;
use scalink_lib::transport::tcp::DEFAULT_SCPI_PORT;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default values shared by the CLI and the config file.
pub struct Defaults;

impl Defaults {
    pub const BAUD: u32 = 19200;
    pub const POLL_INTERVAL_MS: u64 = 100;
    pub const POLL_TIMEOUT_MS: u64 = 10_000;
    pub const SCOPE_PORT: u16 = DEFAULT_SCPI_PORT;
    pub const CONNECT_TIMEOUT_MS: u64 = 3_000;
    pub const MODE: &'static str = "encrypt";
    pub const TRACES: u32 = 1;
    pub const TRIGGER_LEVEL: f64 = 2.0;
    pub const TRACE_CHANNEL: u8 = 1;
    pub const TRIGGER_CHANNEL: u8 = 2;
}

/// Target protocol section, mirrors `TargetOptions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub key_len: usize,
    pub input_len: usize,
    pub output_len: usize,
    pub key_cmd: String,
    pub input_cmd: String,
    pub go_cmd: Option<String>,
    pub output_format: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        let options = TargetOptions::default();
        Self {
            key_len: options.key_len,
            input_len: options.input_len,
            output_len: options.output_len,
            key_cmd: options.key_cmd,
            input_cmd: options.input_cmd,
            go_cmd: None,
            output_format: options.output_format,
        }
    }
}

/// Scope channel and trigger setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSetupConfig {
    pub trace_channel: u8,
    pub trigger_channel: u8,
    pub trigger_level: f64,
    pub probe: f64,
    /// `NORMal` or `HRESolution`.
    pub acquisition: String,
}

impl Default for ScopeSetupConfig {
    fn default() -> Self {
        Self {
            trace_channel: Defaults::TRACE_CHANNEL,
            trigger_channel: Defaults::TRIGGER_CHANNEL,
            trigger_level: Defaults::TRIGGER_LEVEL,
            probe: 1.0,
            acquisition: AcquireMode::Normal.to_string(),
        }
    }
}

impl ScopeSetupConfig {
    pub fn parse_acquisition(&self) -> Result<AcquireMode, String> {
        AcquireMode::from_str(&self.acquisition)
            .map_err(|_| format!("Invalid acquisition mode: {}", self.acquisition))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureCommandConfig {
    #[serde(default = "default_traces")]
    pub traces: u32,
    /// Hex plaintext for the first trace.
    pub text: Option<String>,
    #[serde(default)]
    pub chain: bool,
    pub output: Option<String>,
    #[serde(default)]
    pub setup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCommandConfig {
    pub text: Option<String>,
}

/// Root of the JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalinkConfig {
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// `host` or `host:port` of the scope.
    pub scope: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_challenge")]
    pub challenge: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub scope_setup: ScopeSetupConfig,

    // At most one command
    pub capture: Option<CaptureCommandConfig>,
    pub exchange: Option<TargetCommandConfig>,
}

fn default_baud() -> u32 {
    Defaults::BAUD
}
fn default_poll_interval_ms() -> u64 {
    Defaults::POLL_INTERVAL_MS
}
fn default_poll_timeout_ms() -> u64 {
    Defaults::POLL_TIMEOUT_MS
}
fn default_challenge() -> String {
    DEFAULT_CHALLENGE.to_string()
}
fn default_mode() -> String {
    Defaults::MODE.to_string()
}
fn default_traces() -> u32 {
    Defaults::TRACES
}

impl ScalinkConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ScalinkConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn with_defaults() -> Self {
        Self {
            port: String::new(),
            baud: Defaults::BAUD,
            scope: None,
            poll_interval_ms: Defaults::POLL_INTERVAL_MS,
            poll_timeout_ms: Defaults::POLL_TIMEOUT_MS,
            challenge: default_challenge(),
            mode: default_mode(),
            quiet: false,
            target: TargetConfig::default(),
            scope_setup: ScopeSetupConfig::default(),
            capture: None,
            exchange: None,
        }
    }

    pub fn parse_mode(&self) -> Result<scalink_lib::CipherMode, String> {
        scalink_lib::CipherMode::from_str(&self.mode)
            .map_err(|_| format!("Invalid mode: {}", self.mode))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capture.is_some() && self.exchange.is_some() {
            return Err(
                "Configuration may contain at most one command (capture or exchange)".to_string(),
            );
        }
        if self.poll_timeout_ms == 0 {
            return Err("poll_timeout_ms must be greater than zero".to_string());
        }
        self.parse_mode()?;
        self.scope_setup.parse_acquisition()?;

        if let Some(ref capture) = self.capture {
            if let Some(ref text) = capture.text {
                scalink_lib::utils::Utils::parse_hex_bytes(text)
                    .map_err(|e| format!("Invalid capture text '{}': {}", text, e))?;
            }
        }
        Ok(())
    }
}
