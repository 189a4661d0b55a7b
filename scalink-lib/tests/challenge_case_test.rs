use scalink_lib::sink::{GpioMode, PinFunction, Setting};
use scalink_lib::target::challenge::{self, CHALLENGES, DEFAULT_CHALLENGE};

#[derive(Debug, serde::Deserialize)]
struct ChallengeCase {
    name: String,
    key: String,
    trigger: bool,
    total_samples: u32,
    offset: u32,
}

const CASES: &str = r#"
[
    {
        "name": "Piece of SCAke",
        "key": "af23d545a0eae6a0746596cace51f0f7",
        "trigger": true,
        "total_samples": 4000,
        "offset": 4000
    },
    {
        "name": "Still not SCAry",
        "key": "8932d0b810168514534b93be482cdf21",
        "trigger": false,
        "total_samples": 24400,
        "offset": 0
    },
    {
        "name": "eSCAlate",
        "key": "1c7b3f9783a47255db68b2d6e19a9dd2",
        "trigger": false,
        "total_samples": 24400,
        "offset": 0
    }
]
"#;

fn cases() -> Vec<ChallengeCase> {
    serde_json::from_str(CASES).unwrap()
}

#[test]
fn test_presets_match_table() {
    let cases = cases();
    assert_eq!(CHALLENGES.len(), cases.len());
    for case in &cases {
        let profile = challenge::lookup(&case.name).unwrap();
        assert_eq!(profile.name, case.name);
        assert_eq!(hex::encode(profile.key_bytes().unwrap()), case.key, "{}", case.name);
        assert_eq!(profile.trigger, case.trigger, "{}", case.name);
        assert_eq!(profile.total_samples, case.total_samples, "{}", case.name);
        assert_eq!(profile.offset, case.offset, "{}", case.name);
    }
}

#[test]
fn test_preset_order() {
    let names: Vec<&str> = challenge::names().collect();
    let expected: Vec<String> = cases().into_iter().map(|c| c.name).collect();
    assert_eq!(names, expected);
    assert_eq!(names[0], DEFAULT_CHALLENGE);
}

#[test]
fn test_settings_per_trigger_mode() {
    for case in cases() {
        let settings = challenge::lookup(&case.name).unwrap().settings();
        let io4 = if case.trigger {
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
        assert_eq!(settings[..io4.len()], io4[..], "{}", case.name);
        assert_eq!(
            settings.last(),
            Some(&Setting::TriggerOffset(case.offset)),
            "{}",
            case.name
        );
        assert_eq!(settings.len(), io4.len() + 4);
    }
}
