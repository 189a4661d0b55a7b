//! Configuration side effects requested by the target driver.
//!
//! The driver never reaches into the capture hardware directly. It emits
//! structured [`Setting`]s and a [`ConfigSink`] decides what they mean.

use crate::{Error, Result};
use serialport::SerialPort;
use std::fmt;
use strum::Display;

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioMode {
    Disabled,
    Low,
    High,
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    #[strum(to_string = "High-Z")]
    HighZ,
    #[strum(to_string = "GPIO")]
    Gpio,
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Fixed,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    /// Route target IO4 to the trigger input of the capture hardware.
    TriggerLine(bool),
    Io4Pin(PinFunction),
    /// Level driven on IO4. Also used for the software trigger edge.
    Io4Gpio(GpioMode),
    KeyMode(KeyMode),
    FixedKey(String),
    TotalSamples(u32),
    TriggerOffset(u32),
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::TriggerLine(on) => write!(f, "trigger pins: IO4 as trigger line = {}", on),
            Setting::Io4Pin(function) => write!(f, "target IO4 pin = {}", function),
            Setting::Io4Gpio(mode) => write!(f, "target IO4 GPIO mode = {}", mode),
            Setting::KeyMode(mode) => write!(f, "key mode = {}", mode),
            Setting::FixedKey(key) => write!(f, "fixed encryption key = {}", key),
            Setting::TotalSamples(n) => write!(f, "total samples = {}", n),
            Setting::TriggerOffset(n) => write!(f, "trigger offset = {}", n),
        }
    }
}

pub trait ConfigSink: Send {
    fn apply(&mut self, setting: Setting) -> Result<()>;
}

/// Drives the IO4 trigger level on a serial port's RTS line.
///
/// Everything else is logged only, the RTS line is the one output a bare
/// USB-serial adapter has.
pub struct RtsTriggerSink {
    port: Box<dyn SerialPort>,
}

impl RtsTriggerSink {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl ConfigSink for RtsTriggerSink {
    fn apply(&mut self, setting: Setting) -> Result<()> {
        match setting {
            Setting::Io4Gpio(GpioMode::High) => self.port.write_request_to_send(true)?,
            Setting::Io4Gpio(GpioMode::Low | GpioMode::Disabled) => {
                self.port.write_request_to_send(false)?
            }
            Setting::TriggerLine(true) => {
                return Err(Error::rejected(
                    "no hardware trigger input on a serial adapter",
                ));
            }
            other => tracing::debug!("setting ignored by RTS sink: {}", other),
        }
        Ok(())
    }
}
