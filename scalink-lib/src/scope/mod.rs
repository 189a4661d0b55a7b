//! SCPI oscilloscope link (Rigol DS4000 command set).

pub mod block;
pub mod command;

use crate::poll::{PollConfig, poll_until};
use crate::progress::{ProgressCallbackArc, ProgressHelper, no_op_progress_callback};
use crate::transport::InstrumentTransport;
use crate::{Error, Result};
use command::{AcquireMode, BandwidthLimit, Coupling, Impedance, ScopeCommand};
use std::sync::Arc;

pub const CHANNELS: std::ops::RangeInclusive<u8> = 1..=4;

/// One decoded capture handed to the registered observer.
#[derive(Debug, Clone, Copy)]
pub struct WaveformUpdate<'a> {
    pub samples: &'a [i16],
    /// Both offsets stay zero until multi-segment capture exists.
    pub trigger_offset: usize,
    pub segment_offset: usize,
}

pub trait WaveformObserver: Send + Sync {
    fn data_updated(&self, update: &WaveformUpdate<'_>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub samples: Vec<i16>,
    /// Another segment is waiting. Always false, capture is single segment.
    pub more_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSetup {
    pub channel: u8,
    pub probe: f64,
    pub coupling: Coupling,
    pub bandwidth: BandwidthLimit,
    pub impedance: Impedance,
}

impl ChannelSetup {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            probe: 1.0,
            coupling: Coupling::Dc,
            bandwidth: BandwidthLimit::Off,
            impedance: Impedance::OneMeg,
        }
    }

    fn commands(&self) -> Vec<ScopeCommand> {
        let channel = self.channel;
        vec![
            ScopeCommand::ChannelProbe {
                channel,
                attenuation: self.probe,
            },
            ScopeCommand::ChannelCoupling {
                channel,
                coupling: self.coupling,
            },
            ScopeCommand::ChannelBandwidth {
                channel,
                limit: self.bandwidth,
            },
            ScopeCommand::ChannelImpedance {
                channel,
                impedance: self.impedance,
            },
            ScopeCommand::ChannelDisplayOn { channel },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeSettings {
    pub trace: ChannelSetup,
    pub trigger: ChannelSetup,
    pub trigger_level: f64,
    pub acquisition: AcquireMode,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            trace: ChannelSetup::new(1),
            trigger: ChannelSetup::new(2),
            trigger_level: 2.0,
            acquisition: AcquireMode::Normal,
        }
    }
}

impl ScopeSettings {
    pub fn validate(&self) -> Result<()> {
        for (what, channel) in [("trace", self.trace.channel), ("trigger", self.trigger.channel)] {
            if !CHANNELS.contains(&channel) {
                return Err(Error::invalid_input(format!(
                    "{} channel {} out of range 1-4",
                    what, channel
                )));
            }
        }
        if self.trace.channel == self.trigger.channel {
            return Err(Error::invalid_input(
                "trace and trigger must be on different channels",
            ));
        }
        Ok(())
    }

    /// Full setup sequence, trace channel first.
    pub fn commands(&self) -> Vec<ScopeCommand> {
        let mut cmds = self.trace.commands();
        cmds.extend(self.trigger.commands());
        cmds.extend([
            ScopeCommand::ChannelScale {
                channel: self.trigger.channel,
                volts: 1.0,
            },
            ScopeCommand::ChannelOffset {
                channel: self.trigger.channel,
                volts: 0.0,
            },
            ScopeCommand::TriggerCoupling {
                coupling: Coupling::Dc,
            },
            ScopeCommand::TriggerModeEdge,
            ScopeCommand::TriggerEdgeSource {
                channel: self.trigger.channel,
            },
            ScopeCommand::TriggerEdgeSlopeNegative,
            ScopeCommand::TriggerEdgeLevel {
                volts: self.trigger_level,
            },
            ScopeCommand::TriggerNoiseReject,
            ScopeCommand::TriggerSweepNormal,
            ScopeCommand::WaveformSource {
                channel: self.trace.channel,
            },
            ScopeCommand::WaveformFormatWord,
            ScopeCommand::WaveformModeNormal,
            ScopeCommand::AcquireType {
                mode: self.acquisition,
            },
        ]);
        cmds
    }
}

/// Horizontal and vertical scale read back from the scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeScales {
    pub x_scale: f64,
    pub x_offset: f64,
    pub y_scale: f64,
    pub y_offset: f64,
}

pub struct WaveformLink {
    instrument: Box<dyn InstrumentTransport>,
    poll: PollConfig,
    trace_channel: u8,
    observer: Option<Arc<dyn WaveformObserver>>,
    progress: ProgressHelper,
}

impl WaveformLink {
    pub fn new(instrument: Box<dyn InstrumentTransport>, poll: PollConfig) -> Self {
        Self {
            instrument,
            poll,
            trace_channel: 1,
            observer: None,
            progress: ProgressHelper::new(no_op_progress_callback(), 0),
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallbackArc) -> Self {
        self.progress = ProgressHelper::new(callback, 0);
        self
    }

    pub fn set_observer(&mut self, observer: Arc<dyn WaveformObserver>) {
        self.observer = Some(observer);
    }

    pub fn configure(&mut self, settings: &ScopeSettings) -> Result<()> {
        settings.validate()?;
        for cmd in settings.commands() {
            self.instrument.write(&cmd.to_string())?;
        }
        self.trace_channel = settings.trace.channel;
        Ok(())
    }

    pub fn current_settings(&mut self) -> Result<ScopeScales> {
        let channel = self.trace_channel;
        Ok(ScopeScales {
            x_scale: self.query_value(ScopeCommand::TimebaseScale)?,
            x_offset: self.query_value(ScopeCommand::TimebasePosition)?,
            y_offset: self.query_value(ScopeCommand::ChannelOffsetQuery { channel })?,
            y_scale: self.query_value(ScopeCommand::ChannelScaleQuery { channel })?,
        })
    }

    fn query_value(&mut self, cmd: ScopeCommand) -> Result<f64> {
        let reply = self.instrument.query(&cmd.to_string())?;
        let first = reply.split(',').next().unwrap_or_default().trim();
        Ok(first.parse::<f64>()?)
    }

    /// Start acquisition and wait until the scope reports it is armed.
    pub fn arm(&mut self) -> Result<()> {
        self.instrument.write(&ScopeCommand::Run.to_string())?;

        let spinner = self.progress.create_spinner("Waiting for trigger arm...");
        let instrument = &mut self.instrument;
        let result = poll_until(&self.poll, "waiting for scope to arm", || {
            let status = instrument.query(&ScopeCommand::TriggerStatus.to_string())?;
            Ok(status.starts_with("WAIT") || status.starts_with("RUN"))
        });
        spinner.finish_with_message(match &result {
            Ok(()) => "Armed",
            Err(_) => "Aborted",
        });
        result
    }

    pub fn wait_for_operation_complete(&mut self) -> Result<()> {
        let spinner = self.progress.create_spinner("Waiting for acquisition...");
        let instrument = &mut self.instrument;
        let result = poll_until(&self.poll, "waiting for operation complete", || {
            let reply = instrument.query(&ScopeCommand::OperationComplete.to_string())?;
            Ok(reply.trim() == "1")
        });
        spinner.finish_with_message(match &result {
            Ok(()) => "Acquired",
            Err(_) => "Aborted",
        });
        result
    }

    /// Wait for the acquisition, fetch the waveform block and decode it.
    pub fn capture_waveform(&mut self) -> Result<Waveform> {
        self.wait_for_operation_complete()?;

        self.instrument
            .write(&ScopeCommand::WaveformData.to_string())?;
        let raw = self.instrument.read_raw()?;
        let samples = block::decode_samples(&raw)?;
        tracing::debug!("decoded {} samples", samples.len());

        if let Some(observer) = &self.observer {
            observer.data_updated(&WaveformUpdate {
                samples: &samples,
                trigger_offset: 0,
                segment_offset: 0,
            });
        }

        Ok(Waveform {
            samples,
            more_data: false,
        })
    }
}
