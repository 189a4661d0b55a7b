use anyhow::{Context, Result, anyhow, bail};
use scalink_lib::crypto::AesReference;
use scalink_lib::progress::ProgressCallbackArc;
use scalink_lib::scope::ChannelSetup;
use scalink_lib::target::challenge;
use scalink_lib::transport::TcpInstrument;
use scalink_lib::utils::Utils;
use scalink_lib::{CaptureRig, PollConfig, ScopeSettings, TargetLink, Trace, WaveformLink};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::MergedConfig;
use crate::config::Defaults;

/// One line of `capture` output.
#[derive(Debug, Serialize)]
pub struct TraceRecord {
    pub index: u32,
    pub key: String,
    pub text_in: String,
    pub text_out: Option<String>,
    pub expected: Option<String>,
    pub verified: bool,
    pub samples: Vec<i16>,
}

impl TraceRecord {
    pub fn new(index: u32, trace: &Trace) -> Self {
        Self {
            index,
            key: hex::encode(&trace.key),
            text_in: hex::encode(&trace.text_in),
            text_out: trace.text_out.as_ref().map(hex::encode),
            expected: trace.expected.as_ref().map(hex::encode),
            verified: trace.verified(),
            samples: trace.samples.clone(),
        }
    }
}

/// Append the default SCPI port when `addr` has none.
pub fn scope_address(addr: &str) -> String {
    if addr.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        addr.to_string()
    } else {
        format!("{}:{}", addr, Defaults::SCOPE_PORT)
    }
}

pub fn scope_settings(config: &MergedConfig) -> ScopeSettings {
    let setup = &config.scope_setup;
    let mut trace = ChannelSetup::new(setup.trace_channel);
    trace.probe = setup.probe;
    ScopeSettings {
        trace,
        trigger: ChannelSetup::new(setup.trigger_channel),
        trigger_level: setup.trigger_level,
        acquisition: config.acquisition,
    }
}

pub fn open_scope(config: &MergedConfig, progress: ProgressCallbackArc) -> Result<WaveformLink> {
    let Some(addr) = config.scope.as_deref() else {
        bail!("Scope address must be specified either via --scope or in config file");
    };
    let addr = scope_address(addr);
    let instrument = TcpInstrument::connect(
        addr.as_str(),
        Duration::from_millis(Defaults::CONNECT_TIMEOUT_MS),
    )
    .with_context(|| format!("Failed to connect to scope at {}", addr))?;

    let poll = PollConfig::new(config.poll_timeout).with_interval(config.poll_interval);
    Ok(WaveformLink::new(Box::new(instrument), poll).with_progress(progress))
}

pub fn open_target(config: &MergedConfig) -> Result<TargetLink> {
    let (transport, sink) = crate::serial::open_target(&config.port, config.baud)?;
    let mut target = TargetLink::new(
        Box::new(transport),
        Box::new(sink),
        Arc::new(AesReference),
        config.target.clone(),
    )
    .context("Invalid target options")?;

    target.connect().context("Failed to connect to target")?;
    let report = target.init().context("Failed to apply challenge")?;
    for (setting, err) in &report.rejected {
        eprintln!("Warning: setting '{}' not applied: {}", setting, err);
    }
    Ok(target)
}

fn first_input(config: &MergedConfig, text: Option<&str>) -> Result<Vec<u8>> {
    match text {
        Some(text) => Utils::parse_hex_bytes(text)
            .with_context(|| format!("Failed to parse input text '{}'", text)),
        None => Ok(vec![0u8; config.target.input_len]),
    }
}

pub fn execute_challenges() -> Result<()> {
    for profile in challenge::CHALLENGES.values() {
        println!(
            "{:<16} trigger: {:<5} samples: {:<6} offset: {:<5} key: {}",
            profile.name, profile.trigger, profile.total_samples, profile.offset, profile.key
        );
    }
    Ok(())
}

pub fn execute_target_exchange(config: &MergedConfig, text: Option<&str>) -> Result<()> {
    let input = first_input(config, text)?;
    let mut target = open_target(config)?;

    target.load_input(&input);
    target.send_input().context("Failed to send input")?;
    target.go().context("Failed to send go command")?;
    let response = target.read_response().context("Failed to read response")?;

    match response {
        Some(out) => {
            println!("{}", hex::encode(&out));
            match target.expected() {
                Some(expected) if expected == out => eprintln!("Response matches reference"),
                Some(expected) => eprintln!(
                    "Warning: response differs from reference {}",
                    hex::encode(expected)
                ),
                None => {}
            }
        }
        None => eprintln!("No usable response from target"),
    }
    target.disconnect();
    Ok(())
}

pub fn execute_scope_capture(
    config: &MergedConfig,
    setup: bool,
    scales: bool,
    progress: ProgressCallbackArc,
) -> Result<()> {
    let mut scope = open_scope(config, progress)?;
    if setup {
        scope
            .configure(&scope_settings(config))
            .context("Failed to configure scope")?;
    }
    scope.arm().context("Failed to arm scope")?;
    let waveform = scope.capture_waveform().context("Failed to capture waveform")?;
    println!("{}", serde_json::to_string(&waveform.samples)?);

    if scales {
        let scales = scope
            .current_settings()
            .context("Failed to read scope scales")?;
        eprintln!(
            "x scale: {} x offset: {} y scale: {} y offset: {}",
            scales.x_scale, scales.x_offset, scales.y_scale, scales.y_offset
        );
    }
    Ok(())
}

pub fn execute_capture(
    config: &MergedConfig,
    traces: u32,
    text: Option<&str>,
    chain: bool,
    output: Option<&str>,
    setup: bool,
    progress: ProgressCallbackArc,
) -> Result<()> {
    if traces == 0 {
        bail!("Trace count must be greater than zero");
    }
    let mut input = first_input(config, text)?;

    let mut scope = open_scope(config, Arc::clone(&progress))?;
    if setup {
        scope
            .configure(&scope_settings(config))
            .context("Failed to configure scope")?;
    }
    let target = open_target(config)?;
    let rig = CaptureRig::new(scope, target);

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let helper = scalink_lib::progress::ProgressHelper::new(progress, 0);
    let bar = helper.create_bar(u64::from(traces), "Capturing traces");
    let mut failed = 0u32;
    for index in 0..traces {
        let key = rig
            .lock()?
            .target
            .session()
            .key
            .clone()
            .ok_or_else(|| anyhow!("No key loaded for the selected challenge"))?;

        let trace = match rig.capture_trace(&key, &input) {
            Ok(trace) => trace,
            Err(e) => {
                bar.finish_with_message("Aborted");
                return Err(e).with_context(|| format!("Trace {} failed", index));
            }
        };
        if !trace.verified() {
            failed += 1;
        }

        let record = TraceRecord::new(index, &trace);
        serde_json::to_writer(&mut writer, &record)?;
        writeln!(writer)?;

        if chain && let Some(out) = trace.text_out {
            input = out;
        }
        bar.inc(1);
    }
    writer.flush()?;
    bar.finish_with_message("Done");

    if failed > 0 {
        eprintln!("Warning: {} of {} traces not verified", failed, traces);
    }
    rig.into_links()?.target.disconnect();
    Ok(())
}
