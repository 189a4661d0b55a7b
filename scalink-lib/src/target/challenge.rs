//! RHme2016 side-channel challenge presets.

use crate::sink::{GpioMode, KeyMode, PinFunction, Setting};
use crate::utils::Utils;
use crate::{Error, Result};
use phf::phf_ordered_map;

pub const DEFAULT_CHALLENGE: &str = "Piece of SCAke";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeProfile {
    pub name: &'static str,
    /// Fixed AES key, hex with spaces.
    pub key: &'static str,
    /// Firmware raises its own trigger on IO4.
    pub trigger: bool,
    pub total_samples: u32,
    pub offset: u32,
}

pub static CHALLENGES: phf::OrderedMap<&'static str, ChallengeProfile> = phf_ordered_map! {
    "Piece of SCAke" => ChallengeProfile {
        name: "Piece of SCAke",
        key: "AF 23 D5 45 A0 EA E6 A0 74 65 96 CA CE 51 F0 F7",
        trigger: true,
        total_samples: 4000,
        offset: 4000,
    },
    "Still not SCAry" => ChallengeProfile {
        name: "Still not SCAry",
        key: "89 32 D0 B8 10 16 85 14 53 4B 93 BE 48 2C DF 21",
        trigger: false,
        total_samples: 24400,
        offset: 0,
    },
    "eSCAlate" => ChallengeProfile {
        name: "eSCAlate",
        key: "1C 7B 3F 97 83 A4 72 55 DB 68 B2 D6 E1 9A 9D D2",
        trigger: false,
        total_samples: 24400,
        offset: 0,
    },
};

pub fn lookup(name: &str) -> Result<&'static ChallengeProfile> {
    CHALLENGES
        .get(name)
        .ok_or_else(|| Error::UnknownChallenge(name.to_string()))
}

pub fn names() -> impl Iterator<Item = &'static str> {
    CHALLENGES.keys().copied()
}

impl ChallengeProfile {
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        Utils::parse_hex_bytes(self.key)
    }

    /// Settings to push to the capture side, in application order.
    pub fn settings(&self) -> Vec<Setting> {
        let mut settings = if self.trigger {
            vec![
                Setting::TriggerLine(true),
                Setting::Io4Gpio(GpioMode::Disabled),
                Setting::Io4Pin(PinFunction::HighZ),
            ]
        } else {
            vec![
                Setting::Io4Pin(PinFunction::Gpio),
                Setting::Io4Gpio(GpioMode::Low),
            ]
        };
        settings.extend([
            Setting::KeyMode(KeyMode::Fixed),
            Setting::FixedKey(self.key.to_string()),
            Setting::TotalSamples(self.total_samples),
            Setting::TriggerOffset(self.offset),
        ]);
        settings
    }
}
