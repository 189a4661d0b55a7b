//! Byte-stream transports consumed by the protocol engines.

pub mod serial;
pub mod tcp;

pub use serial::SerialPortTransport;
pub use tcp::TcpInstrument;

use crate::Result;
use std::time::Duration;

/// Text-command link to a SCPI instrument.
pub trait InstrumentTransport: Send {
    fn write(&mut self, command: &str) -> Result<()>;
    /// Write `command` and return the reply with line terminators stripped.
    fn query(&mut self, command: &str) -> Result<String>;
    /// Read one reply verbatim, including any binary block.
    fn read_raw(&mut self) -> Result<Vec<u8>>;
}

/// Raw byte link to a target device.
pub trait SerialTransport: Send {
    fn write(&mut self, data: &[u8]) -> Result<()>;
    /// Read up to `len` bytes, waiting at most `timeout`.
    ///
    /// Returns fewer than `len` bytes when the wait runs out; that is not an error.
    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>>;
    fn flush(&mut self) -> Result<()>;
    fn flush_input(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;
}
