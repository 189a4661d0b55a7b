mod common;

use common::{CountingScheduler, MockInstrument};
use scalink_lib::poll::PollConfig;
use scalink_lib::scope::block::encode_samples;
use scalink_lib::scope::command::{AcquireMode, ScopeCommand};
use scalink_lib::scope::{ChannelSetup, ScopeSettings, WaveformLink, WaveformObserver, WaveformUpdate};
use scalink_lib::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(5)).with_scheduler(Arc::new(CountingScheduler::default()))
}

fn link(instrument: MockInstrument) -> (WaveformLink, Arc<Mutex<Vec<String>>>) {
    let sent = Arc::clone(&instrument.sent);
    (WaveformLink::new(Box::new(instrument), poll()), sent)
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(Vec<i16>, usize, usize)>>);

impl WaveformObserver for Recorder {
    fn data_updated(&self, update: &WaveformUpdate<'_>) {
        self.0.lock().unwrap().push((
            update.samples.to_vec(),
            update.trigger_offset,
            update.segment_offset,
        ));
    }
}

#[test]
fn test_arm_polls_until_waiting() {
    let instrument =
        MockInstrument::new().reply(":TRIGger:STATus?", &["STOP", "STOP", "WAIT"]);
    let (mut scope, sent) = link(instrument);

    scope.arm().unwrap();
    assert_eq!(
        *sent.lock().unwrap(),
        vec![
            ":RUN",
            ":TRIGger:STATus?",
            ":TRIGger:STATus?",
            ":TRIGger:STATus?"
        ]
    );
}

#[test]
fn test_arm_accepts_run_status() {
    let instrument = MockInstrument::new().reply(":TRIGger:STATus?", &["RUN"]);
    let (mut scope, _) = link(instrument);
    scope.arm().unwrap();
}

#[test]
fn test_arm_times_out_when_never_armed() {
    let instrument = MockInstrument::new().reply(":TRIGger:STATus?", &["STOP"]);
    let config = PollConfig::new(Duration::ZERO)
        .with_scheduler(Arc::new(CountingScheduler::default()));
    let mut scope = WaveformLink::new(Box::new(instrument), config);
    assert!(matches!(scope.arm(), Err(Error::Timeout(_))));
}

#[test]
fn test_capture_decodes_and_notifies() {
    let samples = vec![0i16, 100, -100, i16::MIN];
    let mut raw = encode_samples(&samples);
    raw.push(b'\n');
    let instrument = MockInstrument::new()
        .reply("*OPC?", &["0", "1"])
        .raw(raw);
    let (mut scope, sent) = link(instrument);
    let recorder = Arc::new(Recorder::default());
    scope.set_observer(recorder.clone());

    let waveform = scope.capture_waveform().unwrap();
    assert_eq!(waveform.samples, samples);
    assert!(!waveform.more_data);
    assert_eq!(*recorder.0.lock().unwrap(), vec![(samples, 0, 0)]);
    assert_eq!(
        *sent.lock().unwrap(),
        vec!["*OPC?", "*OPC?", ":WAVeform:DATA?"]
    );
}

#[test]
fn test_capture_reports_malformed_block() {
    let instrument = MockInstrument::new()
        .reply("*OPC?", &["1"])
        .raw(b"#13\x00\x00\x00".to_vec());
    let (mut scope, _) = link(instrument);
    let recorder = Arc::new(Recorder::default());
    scope.set_observer(recorder.clone());

    assert!(matches!(scope.capture_waveform(), Err(Error::Frame(_))));
    assert!(recorder.0.lock().unwrap().is_empty());
}

#[test]
fn test_configure_sends_setup_sequence() {
    let (mut scope, sent) = link(MockInstrument::new());
    let settings = ScopeSettings {
        trace: ChannelSetup {
            probe: 10.0,
            ..ChannelSetup::new(3)
        },
        trigger: ChannelSetup::new(4),
        trigger_level: 1.5,
        acquisition: AcquireMode::HighRes,
    };

    scope.configure(&settings).unwrap();
    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), settings.commands().len());
    assert_eq!(sent[0], ":CHANnel3:PROBe 10");
    assert_eq!(sent[1], ":CHANnel3:COUPling DC");
    assert_eq!(sent[2], ":CHANnel3:BWLimit OFF");
    assert_eq!(sent[3], ":CHANnel3:IMPedance OMEG");
    assert_eq!(sent[4], ":CHANnel3:DISPlay ON");
    assert!(sent.contains(&":CHANnel4:SCALe 1".to_string()));
    assert!(sent.contains(&":TRIGger:EDGE:SOURce CHANnel4".to_string()));
    assert!(sent.contains(&":TRIGger:EDGE:LEVel 1.5".to_string()));
    assert!(sent.contains(&":WAVeform:SOURce CHANnel3".to_string()));
    assert_eq!(sent.last().unwrap(), ":ACQuire:TYPE HRESolution");
}

#[test]
fn test_configure_rejects_bad_channels() {
    let (mut scope, sent) = link(MockInstrument::new());
    let mut settings = ScopeSettings::default();
    settings.trace.channel = 5;
    assert!(matches!(
        scope.configure(&settings),
        Err(Error::InvalidInput(_))
    ));

    settings.trace.channel = 2;
    assert!(matches!(
        scope.configure(&settings),
        Err(Error::InvalidInput(_))
    ));
    assert!(sent.lock().unwrap().is_empty());
}

#[test]
fn test_current_settings_parses_first_value() {
    let instrument = MockInstrument::new()
        .reply(":TIMebase:SCALe?", &["5.000000e-06"])
        .reply(":TIMebase:POSition?", &["0.000000e+00\n"])
        .reply(":CHANnel1:OFFSet?", &["-1.2,V"])
        .reply(":CHANnel1:SCALe?", &["2.000000e-01"]);
    let (mut scope, _) = link(instrument);

    let scales = scope.current_settings().unwrap();
    assert_eq!(scales.x_scale, 5e-6);
    assert_eq!(scales.x_offset, 0.0);
    assert_eq!(scales.y_offset, -1.2);
    assert_eq!(scales.y_scale, 0.2);
}

#[test]
fn test_current_settings_bad_number() {
    let instrument = MockInstrument::new().reply(":TIMebase:SCALe?", &["garbage"]);
    let (mut scope, _) = link(instrument);
    assert!(matches!(
        scope.current_settings(),
        Err(Error::ParseFloat(_))
    ));
}

#[test]
fn test_command_strings() {
    assert_eq!(ScopeCommand::Run.to_string(), ":RUN\n");
    assert_eq!(ScopeCommand::OperationComplete.to_string(), "*OPC?\n");
    assert_eq!(
        ScopeCommand::ChannelOffsetQuery { channel: 2 }.to_string(),
        ":CHANnel2:OFFSet?"
    );
}
