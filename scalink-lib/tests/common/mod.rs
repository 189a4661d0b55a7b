#![allow(dead_code)]

use scalink_lib::poll::Scheduler;
use scalink_lib::sink::{ConfigSink, Setting};
use scalink_lib::transport::{InstrumentTransport, SerialTransport};
use scalink_lib::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the mocks saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    Read(usize),
    Flush,
    FlushInput,
    Close,
    Setting(Setting),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

pub fn writes(log: &EventLog) -> Vec<Vec<u8>> {
    events(log)
        .into_iter()
        .filter_map(|e| match e {
            Event::Write(data) => Some(data),
            _ => None,
        })
        .collect()
}

pub struct MockSerial {
    pub log: EventLog,
    pub responses: VecDeque<Vec<u8>>,
    pub fail_writes: bool,
    pub fail_reads: bool,
    pub open: bool,
}

impl MockSerial {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
            responses: VecDeque::new(),
            fail_writes: false,
            fail_reads: false,
            open: true,
        }
    }

    pub fn with_response(mut self, data: &[u8]) -> Self {
        self.responses.push_back(data.to_vec());
        self
    }

    fn push(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }
}

fn broken_pipe() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "device unplugged",
    ))
}

impl SerialTransport for MockSerial {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(broken_pipe());
        }
        self.push(Event::Write(data.to_vec()));
        Ok(())
    }

    fn read(&mut self, len: usize, _timeout: Duration) -> Result<Vec<u8>> {
        if self.fail_reads {
            return Err(broken_pipe());
        }
        self.push(Event::Read(len));
        let mut data = self.responses.pop_front().unwrap_or_default();
        data.truncate(len);
        Ok(data)
    }

    fn flush(&mut self) -> Result<()> {
        self.push(Event::Flush);
        Ok(())
    }

    fn flush_input(&mut self) -> Result<()> {
        self.push(Event::FlushInput);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        self.push(Event::Close);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Records settings, rejecting those matched by `reject`.
pub struct MockSink {
    pub log: EventLog,
    pub reject: fn(&Setting) -> bool,
}

impl MockSink {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: Arc::clone(log),
            reject: |_| false,
        }
    }

    pub fn rejecting(log: &EventLog, reject: fn(&Setting) -> bool) -> Self {
        Self {
            log: Arc::clone(log),
            reject,
        }
    }
}

impl ConfigSink for MockSink {
    fn apply(&mut self, setting: Setting) -> Result<()> {
        if (self.reject)(&setting) {
            return Err(Error::rejected(format!("{} not supported", setting)));
        }
        self.log.lock().unwrap().push(Event::Setting(setting));
        Ok(())
    }
}

/// Scripted SCPI instrument. Each query pops the next reply for its command,
/// the last reply repeats.
#[derive(Default)]
pub struct MockInstrument {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub replies: HashMap<String, VecDeque<String>>,
    pub raw: VecDeque<Vec<u8>>,
}

impl MockInstrument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, command: &str, replies: &[&str]) -> Self {
        self.replies.insert(
            command.trim().to_string(),
            replies.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    pub fn raw(mut self, data: Vec<u8>) -> Self {
        self.raw.push_back(data);
        self
    }
}

impl InstrumentTransport for MockInstrument {
    fn write(&mut self, command: &str) -> Result<()> {
        self.sent.lock().unwrap().push(command.trim().to_string());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        let key = command.trim().to_string();
        self.sent.lock().unwrap().push(key.clone());
        let queue = self
            .replies
            .get_mut(&key)
            .ok_or_else(|| Error::invalid_input(format!("unexpected query {}", key)))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(reply.unwrap_or_default().trim().to_string())
    }

    fn read_raw(&mut self) -> Result<Vec<u8>> {
        self.raw
            .pop_front()
            .ok_or_else(|| Error::invalid_input("no raw data scripted"))
    }
}

/// Counts pauses instead of sleeping.
#[derive(Default)]
pub struct CountingScheduler {
    pub pauses: AtomicUsize,
}

impl CountingScheduler {
    pub fn count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl Scheduler for CountingScheduler {
    fn pause(&self, _interval: Duration) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}
