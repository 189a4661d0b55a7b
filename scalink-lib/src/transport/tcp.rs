use super::InstrumentTransport;
use crate::scope::block::{self, BlockError};
use crate::{Error, Result};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Raw SCPI socket port on Rigol scopes.
pub const DEFAULT_SCPI_PORT: u16 = 5555;

const READ_CHUNK: usize = 4096;

/// SCPI over a plain TCP socket, one newline-terminated command per write.
pub struct TcpInstrument {
    stream: TcpStream,
}

impl TcpInstrument {
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let socket_addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::invalid_input("instrument address did not resolve"))?;
        let stream = TcpStream::connect_timeout(&socket_addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        tracing::debug!("connected to instrument at {}", socket_addr);
        Ok(Self { stream })
    }

    /// Read until a whole block has arrived, or a plain reply ends in a newline.
    fn read_reply(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                if buffer.is_empty() {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "instrument closed the connection",
                    )));
                }
                return Ok(buffer);
            }
            buffer.extend_from_slice(&chunk[..n]);

            match block::framed_len(&buffer) {
                Ok(_) => return Ok(buffer),
                Err(BlockError::Incomplete { .. }) => continue,
                Err(BlockError::MissingStart) => {
                    if buffer.ends_with(b"\n") {
                        return Ok(buffer);
                    }
                }
                // Malformed header, hand it to the decoder to report
                Err(_) => return Ok(buffer),
            }
        }
    }
}

impl InstrumentTransport for TcpInstrument {
    fn write(&mut self, command: &str) -> Result<()> {
        let mut line = command.trim_end_matches(['\r', '\n']).to_string();
        line.push('\n');
        tracing::debug!("scpi tx: {}", line.trim_end());
        self.stream.write_all(line.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;
        let reply = self.read_reply()?;
        let text = String::from_utf8_lossy(&reply).trim().to_string();
        tracing::debug!("scpi rx: {}", text);
        Ok(text)
    }

    fn read_raw(&mut self) -> Result<Vec<u8>> {
        let reply = self.read_reply()?;
        tracing::debug!("scpi rx: {} raw bytes", reply.len());
        Ok(reply)
    }
}
