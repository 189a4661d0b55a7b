use anyhow::{Result, bail};
use scalink_lib::progress::ProgressCallbackArc;

use crate::cli::MergedConfig;
use crate::config::ScalinkConfig;
use crate::rig_ops;

/// Execute command from config file
pub fn execute_config_command(
    config: &ScalinkConfig,
    merged: &MergedConfig,
    progress: ProgressCallbackArc,
) -> Result<()> {
    if let Some(ref capture) = config.capture {
        rig_ops::execute_capture(
            merged,
            capture.traces,
            capture.text.as_deref(),
            capture.chain,
            capture.output.as_deref(),
            capture.setup,
            progress,
        )
    } else if let Some(ref exchange) = config.exchange {
        rig_ops::execute_target_exchange(merged, exchange.text.as_deref())
    } else {
        bail!("No valid command found in config file.")
    }
}
