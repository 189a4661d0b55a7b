use super::SerialTransport;
use crate::{Error, Result};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

const IDLE_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SerialPortTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortTransport {
    pub fn open(port_name: &str, baud: u32) -> Result<Self> {
        let mut port = serialport::new(port_name, baud)
            .timeout(IDLE_TIMEOUT)
            .open()?;
        // RTS doubles as the trigger line, start it low
        port.write_request_to_send(false)?;
        tracing::debug!("opened {} at {} baud", port_name, baud);
        Ok(Self::from_port(port))
    }

    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port: Some(port) }
    }

    /// Second handle on the same port, used to drive control lines.
    pub fn try_clone_port(&self) -> Result<Box<dyn SerialPort>> {
        match &self.port {
            Some(port) => Ok(port.try_clone()?),
            None => Err(Error::NotConnected),
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

impl SerialTransport for SerialPortTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        tracing::trace!("serial tx: {:02X?}", data);
        self.port()?.write_all(data)?;
        Ok(())
    }

    fn read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let port = self.port()?;
        let mut buffer = vec![0u8; len];
        let mut filled = 0;
        let start = Instant::now();

        while filled < len {
            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            port.set_timeout(remaining)?;
            match port.read(&mut buffer[filled..]) {
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        buffer.truncate(filled);
        tracing::trace!("serial rx: {:02X?}", buffer);
        Ok(buffer)
    }

    fn flush(&mut self) -> Result<()> {
        let port = self.port()?;
        port.flush()?;
        port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }

    fn flush_input(&mut self) -> Result<()> {
        self.port()?.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::debug!("serial port closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}
