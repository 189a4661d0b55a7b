mod common;

use common::{CountingScheduler, Event, MockInstrument, MockSerial, MockSink, event_log, events};
use scalink_lib::crypto::AesReference;
use scalink_lib::scope::block::encode_samples;
use scalink_lib::sink::{GpioMode, Setting};
use scalink_lib::utils::Utils;
use scalink_lib::{CaptureRig, Error, PollConfig, TargetLink, TargetOptions, WaveformLink};
use std::sync::Arc;
use std::time::Duration;

fn scope(instrument: MockInstrument) -> WaveformLink {
    let poll = PollConfig::new(Duration::from_secs(5))
        .with_scheduler(Arc::new(CountingScheduler::default()));
    WaveformLink::new(Box::new(instrument), poll)
}

#[test]
fn test_full_trace() {
    let key = Utils::parse_hex_bytes("000102030405060708090a0b0c0d0e0f").unwrap();
    let plain = Utils::parse_hex_bytes("00112233445566778899aabbccddeeff").unwrap();
    let cipher = Utils::parse_hex_bytes("69c4e0d86a7b0430d8cdb78070b4c55a").unwrap();
    let samples: Vec<i16> = (0..32).map(|i| i * 3 - 40).collect();

    let instrument = MockInstrument::new()
        .reply(":TRIGger:STATus?", &["WAIT"])
        .reply("*OPC?", &["1"])
        .raw(encode_samples(&samples));
    let scope_sent = Arc::clone(&instrument.sent);

    let log = event_log();
    let serial = MockSerial::new(&log).with_response(&cipher);
    let mut target = TargetLink::new(
        Box::new(serial),
        Box::new(MockSink::new(&log)),
        Arc::new(AesReference),
        TargetOptions {
            challenge: "Still not SCAry".to_string(),
            ..TargetOptions::default()
        },
    )
    .unwrap();
    target.connect().unwrap();
    target.init().unwrap();
    log.lock().unwrap().clear();

    let rig = CaptureRig::new(scope(instrument), target);
    let trace = rig.capture_trace(&key, &plain).unwrap();

    assert_eq!(trace.key, key);
    assert_eq!(trace.text_in, plain);
    assert_eq!(trace.text_out, Some(cipher.clone()));
    assert_eq!(trace.expected, Some(cipher));
    assert_eq!(trace.samples, samples);
    assert!(trace.verified());

    // scope is armed before the target starts, and read after it
    assert_eq!(
        *scope_sent.lock().unwrap(),
        vec![":RUN", ":TRIGger:STATus?", "*OPC?", ":WAVeform:DATA?"]
    );

    let mut head = vec![b'e'];
    head.extend(&plain[..15]);
    assert_eq!(
        events(&log),
        vec![
            Event::FlushInput,
            Event::Write(head),
            Event::Setting(Setting::Io4Gpio(GpioMode::High)),
            Event::Write(vec![plain[15]]),
            Event::Read(16),
            Event::Setting(Setting::Io4Gpio(GpioMode::Low)),
        ]
    );
}

#[test]
fn test_trace_without_response() {
    let instrument = MockInstrument::new()
        .reply(":TRIGger:STATus?", &["WAIT"])
        .reply("*OPC?", &["1"])
        .raw(encode_samples(&[1, 2]));
    let log = event_log();
    let mut target = TargetLink::new(
        Box::new(MockSerial::new(&log)),
        Box::new(MockSink::new(&log)),
        Arc::new(AesReference),
        TargetOptions::default(),
    )
    .unwrap();
    target.connect().unwrap();
    target.init().unwrap();

    let rig = CaptureRig::new(scope(instrument), target);
    let trace = rig.capture_trace(&[0xAA; 4], &[0x55; 4]).unwrap();
    assert_eq!(trace.key.len(), 16);
    assert_eq!(&trace.key[..4], &[0xAA; 4]);
    assert_eq!(trace.text_in.len(), 16);
    assert_eq!(trace.text_out, None);
    assert!(trace.expected.is_some());
    assert!(!trace.verified());
    assert_eq!(trace.samples, vec![1, 2]);
}

#[test]
fn test_trace_requires_connected_target() {
    let instrument = MockInstrument::new().reply(":TRIGger:STATus?", &["WAIT"]);
    let log = event_log();
    let target = TargetLink::new(
        Box::new(MockSerial::new(&log)),
        Box::new(MockSink::new(&log)),
        Arc::new(AesReference),
        TargetOptions::default(),
    )
    .unwrap();

    let rig = CaptureRig::new(scope(instrument), target);
    assert!(matches!(
        rig.capture_trace(&[0; 16], &[0; 16]),
        Err(Error::NotConnected)
    ));
    let links = rig.into_links().unwrap();
    assert!(!links.target.session().connected);
}

#[test]
fn test_failed_capture_releases_trigger() {
    let instrument = MockInstrument::new()
        .reply(":TRIGger:STATus?", &["WAIT"])
        .reply("*OPC?", &["0"]);
    let poll = PollConfig::new(Duration::ZERO)
        .with_scheduler(Arc::new(CountingScheduler::default()));
    let log = event_log();
    let mut target = TargetLink::new(
        Box::new(MockSerial::new(&log)),
        Box::new(MockSink::new(&log)),
        Arc::new(AesReference),
        TargetOptions {
            challenge: "Still not SCAry".to_string(),
            ..TargetOptions::default()
        },
    )
    .unwrap();
    target.connect().unwrap();
    target.init().unwrap();
    log.lock().unwrap().clear();

    let rig = CaptureRig::new(WaveformLink::new(Box::new(instrument), poll), target);
    assert!(matches!(
        rig.capture_trace(&[0; 16], &[0; 16]),
        Err(Error::Timeout(_))
    ));

    let levels: Vec<GpioMode> = events(&log)
        .into_iter()
        .filter_map(|e| match e {
            Event::Setting(Setting::Io4Gpio(mode)) => Some(mode),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![GpioMode::High, GpioMode::Low]);
    // nothing was read, the line is released directly
    assert!(!events(&log).contains(&Event::Read(16)));
    assert!(rig.lock().unwrap().target.session().connected);
}
