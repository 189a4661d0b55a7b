use anyhow::{Context, Result, bail};
use scalink_lib::sink::RtsTriggerSink;
use scalink_lib::transport::SerialPortTransport;

/// Open the target port plus a second handle whose RTS line is the IO4 trigger.
pub fn open_target(port_name: &str, baud: u32) -> Result<(SerialPortTransport, RtsTriggerSink)> {
    if port_name.is_empty() {
        bail!("Port must be specified either via --port or in config file");
    }

    let transport = SerialPortTransport::open(port_name, baud)
        .with_context(|| format!("Failed to open serial port '{}' at {} baud", port_name, baud))?;
    let trigger = transport
        .try_clone_port()
        .context("Failed to clone serial port for the trigger line")?;
    Ok((transport, RtsTriggerSink::new(trigger)))
}
