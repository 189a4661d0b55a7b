//! Serial target driver for the RHme2016 AES challenges.
//!
//! One [`TargetLink`] owns the serial transport for the whole capture session.
//! A trace is: load key and input, send the go command, read the response.
//! When the firmware has no trigger output the driver makes its own edge on
//! IO4, raised between the last two bytes of the command and lowered once the
//! response has been read.

pub mod challenge;
pub mod template;

use crate::crypto::CipherReference;
use crate::sink::{ConfigSink, GpioMode, Setting};
use crate::transport::SerialTransport;
use crate::utils::Utils;
use crate::{Error, Result};
use challenge::{ChallengeProfile, DEFAULT_CHALLENGE};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use template::{CommandTemplate, OutputFormat, ResponseError, Segment, TemplateVars};

pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

pub const KEY_LENGTHS: [usize; 3] = [8, 16, 32];
pub const INPUT_LENGTHS: [usize; 6] = [1, 2, 4, 8, 16, 32];
pub const OUTPUT_LENGTHS: [usize; 3] = [8, 16, 32];

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CipherMode {
    #[cfg_attr(feature = "cli", clap(name = "encrypt"))]
    Encrypt,
    #[cfg_attr(feature = "cli", clap(name = "decrypt"))]
    Decrypt,
}

impl CipherMode {
    pub fn go_command(self) -> &'static str {
        match self {
            CipherMode::Encrypt => "e$TEXT$",
            CipherMode::Decrypt => "d$TEXT$",
        }
    }

    /// Mode implied by the first character of a go command.
    pub fn from_go_command(cmd: &str) -> Option<Self> {
        match cmd.as_bytes().first() {
            Some(b'e') => Some(CipherMode::Encrypt),
            Some(b'd') => Some(CipherMode::Decrypt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOptions {
    pub key_len: usize,
    pub input_len: usize,
    pub output_len: usize,
    pub key_cmd: String,
    pub input_cmd: String,
    pub go_cmd: String,
    pub output_format: String,
    pub challenge: String,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            key_len: 16,
            input_len: 16,
            output_len: 16,
            key_cmd: "k$KEY$\\n".to_string(),
            input_cmd: String::new(),
            go_cmd: CipherMode::Encrypt.go_command().to_string(),
            output_format: "$RESPONSE$".to_string(),
            challenge: DEFAULT_CHALLENGE.to_string(),
        }
    }
}

impl TargetOptions {
    pub fn validate(&self) -> Result<()> {
        check_len("key length", self.key_len, &KEY_LENGTHS)?;
        check_len("input length", self.input_len, &INPUT_LENGTHS)?;
        check_len("output length", self.output_len, &OUTPUT_LENGTHS)?;
        OutputFormat::parse(&self.output_format)?;
        challenge::lookup(&self.challenge)?;
        Ok(())
    }
}

fn check_len(what: &str, len: usize, allowed: &[usize]) -> Result<()> {
    if allowed.contains(&len) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} {} not one of {:?}",
            what, len, allowed
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSession {
    pub key: Option<Vec<u8>>,
    pub input: Option<Vec<u8>>,
    /// Firmware drives the trigger line itself.
    pub trigger: bool,
    pub connected: bool,
    pub challenge: Option<&'static str>,
}

/// Outcome of applying a challenge preset.
#[derive(Debug)]
pub struct ApplyReport {
    pub profile: &'static ChallengeProfile,
    pub rejected: Vec<(Setting, Error)>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Receives the raw target output in glitch mode.
pub trait GlitchObserver: Send + Sync {
    fn glitch_output(&self, data: &[u8]);
}

pub struct TargetLink {
    transport: Box<dyn SerialTransport>,
    sink: Box<dyn ConfigSink>,
    cipher: Arc<dyn CipherReference>,
    options: TargetOptions,
    key_cmd: CommandTemplate,
    input_cmd: CommandTemplate,
    go_cmd: CommandTemplate,
    output: OutputFormat,
    session: TargetSession,
    glitch: Option<Arc<dyn GlitchObserver>>,
}

impl TargetLink {
    pub fn new(
        transport: Box<dyn SerialTransport>,
        sink: Box<dyn ConfigSink>,
        cipher: Arc<dyn CipherReference>,
        options: TargetOptions,
    ) -> Result<Self> {
        options.validate()?;
        let output = OutputFormat::parse(&options.output_format)?;
        Ok(Self {
            transport,
            sink,
            cipher,
            key_cmd: CommandTemplate::parse(&options.key_cmd),
            input_cmd: CommandTemplate::parse(&options.input_cmd),
            go_cmd: CommandTemplate::parse(&options.go_cmd),
            output,
            options,
            session: TargetSession::default(),
            glitch: None,
        })
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn session(&self) -> &TargetSession {
        &self.session
    }

    pub fn set_glitch_observer(&mut self, observer: Arc<dyn GlitchObserver>) {
        self.glitch = Some(observer);
    }

    pub fn set_go_command(&mut self, cmd: &str) {
        self.options.go_cmd = cmd.to_string();
        self.go_cmd = CommandTemplate::parse(cmd);
    }

    pub fn set_mode(&mut self, mode: CipherMode) {
        self.set_go_command(mode.go_command());
    }

    pub fn set_mode_encrypt(&mut self) {
        self.set_mode(CipherMode::Encrypt);
    }

    pub fn set_mode_decrypt(&mut self) {
        self.set_mode(CipherMode::Decrypt);
    }

    pub fn mode(&self) -> Option<CipherMode> {
        CipherMode::from_go_command(&self.options.go_cmd)
    }

    pub fn set_output_format(&mut self, format: &str) -> Result<()> {
        self.output = OutputFormat::parse(format)?;
        self.options.output_format = format.to_string();
        Ok(())
    }

    /// Firmware answers synchronously, so the operation is done once the go
    /// command is out.
    pub fn is_done(&self) -> bool {
        true
    }

    pub fn connect(&mut self) -> Result<()> {
        if !self.transport.is_open() {
            return Err(Error::NotConnected);
        }
        self.transport.flush()?;
        self.session.connected = true;
        tracing::debug!("target connected");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Err(e) = self.transport.close() {
            tracing::warn!("error closing target transport: {}", e);
        }
        self.session.connected = false;
        tracing::debug!("target disconnected");
    }

    /// Flush the port and reapply the selected challenge.
    pub fn init(&mut self) -> Result<ApplyReport> {
        self.transport.flush()?;
        let challenge = self.options.challenge.clone();
        self.apply_challenge(&challenge)
    }

    /// Select a challenge preset and push its settings to the sink.
    ///
    /// Settings the sink rejects are logged and returned in the report, they
    /// don't stop the key and trigger mode from taking effect.
    pub fn apply_challenge(&mut self, name: &str) -> Result<ApplyReport> {
        let profile = challenge::lookup(name)?;
        let key = profile.key_bytes()?;

        self.session.trigger = profile.trigger;
        self.session.key = Some(self.normalize_key(&key));
        self.session.challenge = Some(profile.name);
        self.options.challenge = profile.name.to_string();
        tracing::info!(
            "challenge '{}' selected (trigger line: {})",
            profile.name,
            profile.trigger
        );

        let mut rejected = Vec::new();
        for setting in profile.settings() {
            if let Err(e) = self.sink.apply(setting.clone()) {
                tracing::warn!("setting '{}' rejected: {}", setting, e);
                rejected.push((setting, e));
            }
        }

        Ok(ApplyReport { profile, rejected })
    }

    pub fn normalize_key(&self, key: &[u8]) -> Vec<u8> {
        Utils::fit_length(key, self.options.key_len, "key")
    }

    pub fn normalize_input(&self, input: &[u8]) -> Vec<u8> {
        Utils::fit_length(input, self.options.input_len, "plaintext")
    }

    /// Store the key for the following commands.
    ///
    /// The RHme2016 firmware keeps its key on chip, so nothing is sent here.
    /// Use [`TargetLink::send_key`] for firmware that takes a load-key command.
    pub fn load_key(&mut self, key: &[u8]) {
        self.session.key = Some(self.normalize_key(key));
    }

    pub fn load_input(&mut self, input: &[u8]) {
        self.session.input = Some(self.normalize_input(input));
    }

    pub fn send_key(&mut self) -> Result<()> {
        let cmd = self.key_cmd.clone();
        self.run_command(&cmd)
    }

    pub fn send_input(&mut self) -> Result<()> {
        let cmd = self.input_cmd.clone();
        self.run_command(&cmd)
    }

    pub fn go(&mut self) -> Result<()> {
        let cmd = self.go_cmd.clone();
        self.run_command(&cmd)
    }

    /// Reference result for the loaded key and input, following the go command's mode.
    pub fn expected(&self) -> Option<Vec<u8>> {
        let mode = self.mode()?;
        let key = self.session.key.as_deref()?;
        let input = self.session.input.as_deref()?;
        let result = match mode {
            CipherMode::Encrypt => self.cipher.encrypt(key, input),
            CipherMode::Decrypt => self.cipher.decrypt(key, input),
        };
        match result {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!("no reference result: {}", e);
                None
            }
        }
    }

    pub fn build_command(&self, template: &CommandTemplate) -> Result<Vec<u8>> {
        let expected = if template.uses(&Segment::Expected) {
            self.expected()
        } else {
            None
        };
        let vars = TemplateVars {
            key: self.session.key.as_deref(),
            text: self.session.input.as_deref(),
            expected: expected.as_deref(),
        };
        template.render(&vars)
    }

    pub fn run_command(&mut self, template: &CommandTemplate) -> Result<()> {
        if !self.session.connected {
            return Err(Error::NotConnected);
        }
        if template.is_empty() {
            return Ok(());
        }
        let cmd = self.build_command(template)?;
        self.send_command(&cmd)
    }

    pub fn send_command(&mut self, cmd: &[u8]) -> Result<()> {
        self.send_command_with(cmd, true)
    }

    /// Write a rendered command to the target.
    ///
    /// Without a firmware trigger the IO4 edge goes high strictly between the
    /// penultimate and the final byte, the target starts its operation on the
    /// final byte.
    pub fn send_command_with(&mut self, cmd: &[u8], flush_input_before: bool) -> Result<()> {
        if !self.session.connected {
            return Err(Error::NotConnected);
        }
        let Some((last, head)) = cmd.split_last() else {
            return Ok(());
        };
        tracing::debug!("target command: {:?}", String::from_utf8_lossy(cmd));

        let result = (|| -> Result<()> {
            if flush_input_before {
                self.transport.flush_input()?;
            }
            if self.session.trigger {
                self.transport.write(cmd)?;
            } else {
                self.transport.write(head)?;
                self.sink.apply(Setting::Io4Gpio(GpioMode::High))?;
                self.transport.write(std::slice::from_ref(last))?;
            }
            Ok(())
        })();

        result.map_err(|e| self.fail(e))
    }

    /// Read and validate the target's reply.
    ///
    /// `Ok(None)` means no usable data: no output expected, glitch mode, a
    /// short read, or a framing mismatch. Only transport failures are errors.
    pub fn read_response(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.session.connected {
            return Err(Error::NotConnected);
        }

        let template = match self.output.clone() {
            OutputFormat::None => return Ok(None),
            OutputFormat::Glitch { bytes } => {
                let data = self.read_frame(bytes).map_err(|e| self.fail(e))?;
                match &self.glitch {
                    Some(observer) => observer.glitch_output(&data),
                    None => tracing::debug!("glitch output without observer: {:02X?}", data),
                }
                return Ok(None);
            }
            OutputFormat::Response(template) => template,
        };

        let output_len = self.options.output_len;
        let frame_len = template.frame_len(output_len);
        let response = self.read_frame(frame_len).map_err(|e| self.fail(e))?;

        match template.extract(&response, output_len) {
            Ok(payload) => Ok(Some(payload)),
            Err(ResponseError::Short { expected, received }) => {
                tracing::warn!(
                    "Response length from target shorter than expected ({}<{}): {:?}",
                    received,
                    expected,
                    String::from_utf8_lossy(&response)
                );
                Ok(None)
            }
            Err(mismatch) => {
                tracing::warn!(
                    "Sync error ({:?}): {:?}",
                    mismatch,
                    String::from_utf8_lossy(&response)
                );
                tracing::warn!("Hex version: {}", Utils::hex_dump(&response));
                Ok(None)
            }
        }
    }

    fn read_frame(&mut self, len: usize) -> Result<Vec<u8>> {
        let response = self.transport.read(len, RESPONSE_TIMEOUT)?;
        self.release_trigger()?;
        Ok(response)
    }

    /// Drive the software trigger edge back low.
    ///
    /// Reading the response does this already. Call it when a trace is
    /// abandoned after [`TargetLink::go`] so the next go command starts from a
    /// low line. No-op when the firmware owns the trigger.
    pub fn release_trigger(&mut self) -> Result<()> {
        if !self.session.trigger {
            self.sink.apply(Setting::Io4Gpio(GpioMode::Low))?;
        }
        Ok(())
    }

    /// Drop the link after a transport failure so a half-broken port is not reused.
    fn fail(&mut self, err: Error) -> Error {
        tracing::error!("target communication error: {}", err);
        self.disconnect();
        Error::TargetCommunication(err.to_string())
    }
}
