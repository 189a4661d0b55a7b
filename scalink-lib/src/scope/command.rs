use strum::{Display, EnumString};

/// SCPI commands sent to the scope.
#[derive(Display, Debug, Clone, PartialEq)]
pub enum ScopeCommand {
    #[strum(to_string = ":RUN\n")]
    Run,

    #[strum(to_string = ":TRIGger:STATus?")]
    TriggerStatus,

    #[strum(to_string = "*OPC?\n")]
    OperationComplete,

    #[strum(to_string = ":WAVeform:DATA?")]
    WaveformData,

    #[strum(to_string = ":TIMebase:SCALe?")]
    TimebaseScale,

    #[strum(to_string = ":TIMebase:POSition?")]
    TimebasePosition,

    #[strum(to_string = ":CHANnel{channel}:OFFSet?")]
    ChannelOffsetQuery { channel: u8 },

    #[strum(to_string = ":CHANnel{channel}:SCALe?")]
    ChannelScaleQuery { channel: u8 },

    #[strum(to_string = ":CHANnel{channel}:PROBe {attenuation}")]
    ChannelProbe { channel: u8, attenuation: f64 },

    #[strum(to_string = ":CHANnel{channel}:COUPling {coupling}")]
    ChannelCoupling { channel: u8, coupling: Coupling },

    #[strum(to_string = ":CHANnel{channel}:BWLimit {limit}")]
    ChannelBandwidth { channel: u8, limit: BandwidthLimit },

    #[strum(to_string = ":CHANnel{channel}:IMPedance {impedance}")]
    ChannelImpedance { channel: u8, impedance: Impedance },

    #[strum(to_string = ":CHANnel{channel}:SCALe {volts}")]
    ChannelScale { channel: u8, volts: f64 },

    #[strum(to_string = ":CHANnel{channel}:OFFSet {volts}")]
    ChannelOffset { channel: u8, volts: f64 },

    #[strum(to_string = ":CHANnel{channel}:DISPlay ON")]
    ChannelDisplayOn { channel: u8 },

    #[strum(to_string = ":TRIGger:COUPling {coupling}")]
    TriggerCoupling { coupling: Coupling },

    #[strum(to_string = ":TRIGger:MODE EDGE")]
    TriggerModeEdge,

    #[strum(to_string = ":TRIGger:EDGE:SOURce CHANnel{channel}")]
    TriggerEdgeSource { channel: u8 },

    #[strum(to_string = ":TRIGger:EDGE:SLOPe NEGative")]
    TriggerEdgeSlopeNegative,

    #[strum(to_string = ":TRIGger:EDGE:LEVel {volts}")]
    TriggerEdgeLevel { volts: f64 },

    #[strum(to_string = ":TRIGger:NREJect ON")]
    TriggerNoiseReject,

    #[strum(to_string = ":TRIGger:SWEep NORMal")]
    TriggerSweepNormal,

    #[strum(to_string = ":WAVeform:SOURce CHANnel{channel}")]
    WaveformSource { channel: u8 },

    #[strum(to_string = ":WAVeform:FORMat WORD")]
    WaveformFormatWord,

    #[strum(to_string = ":WAVeform:MODE NORMal")]
    WaveformModeNormal,

    #[strum(to_string = ":ACQuire:TYPE {mode}")]
    AcquireType { mode: AcquireMode },
}

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Coupling {
    #[strum(serialize = "AC")]
    Ac,
    #[strum(serialize = "DC")]
    Dc,
    #[strum(serialize = "GND")]
    Gnd,
}

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BandwidthLimit {
    #[strum(serialize = "20M")]
    #[cfg_attr(feature = "cli", clap(name = "20M"))]
    Limit20M,
    #[strum(serialize = "100M")]
    #[cfg_attr(feature = "cli", clap(name = "100M"))]
    Limit100M,
    #[strum(serialize = "OFF")]
    Off,
}

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Impedance {
    #[strum(serialize = "OMEG")]
    #[cfg_attr(feature = "cli", clap(name = "1M"))]
    OneMeg,
    #[strum(serialize = "FIFTy")]
    #[cfg_attr(feature = "cli", clap(name = "50R"))]
    Fifty,
}

#[derive(EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AcquireMode {
    #[strum(serialize = "NORMal")]
    Normal,
    #[strum(serialize = "HRESolution")]
    #[cfg_attr(feature = "cli", clap(name = "high-res"))]
    HighRes,
}
