//! Minimal TOML parser for the device configuration
//!
//! Handles only the subset `device.toml` uses. It does NOT support the full
//! TOML grammar.
//!
//! Supported features:
//! - `[section]` headers
//! - Key = value pairs (string, integer, boolean)
//! - Single-line arrays of strings
//! - Comments (# ...)
//!
//! Unknown sections and keys are rejected so typos surface at boot.

use heapless::{String, Vec};

use super::types::{ConfigError, DeviceConfig, MAX_CHANNELS, MAX_LABEL_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection { line: usize },
    /// Key not valid in its section
    UnknownKey { line: usize },
    /// Value of the wrong type or out of range
    InvalidValue { line: usize },
    /// String longer than its field
    TooLong { line: usize },
    /// Array with more items than the field holds
    TooManyItems { line: usize },
    /// Parsed, but the values do not fit together
    Invalid(ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Wifi,
    Mqtt,
    Audio,
    Input,
}

/// Parse TOML text into a validated `DeviceConfig`
///
/// Keys that are absent keep their default values.
pub fn parse_config(input: &str) -> Result<DeviceConfig, ParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = match line[1..line.len() - 1].trim() {
                "wifi" => Section::Wifi,
                "mqtt" => Section::Mqtt,
                "audio" => Section::Audio,
                "input" => Section::Input,
                _ => return Err(ParseError::InvalidSection { line: line_no }),
            };
            continue;
        }

        let (key, value) =
            parse_key_value(line).ok_or(ParseError::InvalidValue { line: line_no })?;
        apply_value(&mut config, section, key, value)
            .map_err(|kind| kind.at(line_no))?;
    }

    config.validate().map_err(ParseError::Invalid)?;
    Ok(config)
}

/// Error kind before a line number is attached
#[derive(Debug, Clone, Copy)]
enum Fault {
    UnknownKey,
    InvalidValue,
    TooLong,
    TooManyItems,
}

impl Fault {
    fn at(self, line: usize) -> ParseError {
        match self {
            Fault::UnknownKey => ParseError::UnknownKey { line },
            Fault::InvalidValue => ParseError::InvalidValue { line },
            Fault::TooLong => ParseError::TooLong { line },
            Fault::TooManyItems => ParseError::TooManyItems { line },
        }
    }
}

fn apply_value(
    config: &mut DeviceConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), Fault> {
    match (section, key) {
        (Section::Wifi, "ssid") => config.wifi.ssid = parse_label(value)?,
        (Section::Wifi, "password") => config.wifi.password = parse_label(value)?,

        (Section::Mqtt, "broker") => config.mqtt.broker = parse_label(value)?,
        (Section::Mqtt, "port") => config.mqtt.port = parse_int(value)?,
        (Section::Mqtt, "prefix") => config.mqtt.prefix = parse_label(value)?,
        (Section::Mqtt, "client_id") => config.mqtt.client_id = parse_label(value)?,
        (Section::Mqtt, "keepalive_s") => config.mqtt.keepalive_s = parse_int(value)?,
        (Section::Mqtt, "update_interval_s") => {
            config.mqtt.update_interval_s = parse_int(value)?
        }

        (Section::Audio, "channels") => config.audio.channels = parse_labels(value)?,
        (Section::Audio, "volume_max") => config.audio.volume_max = parse_int(value)?,
        (Section::Audio, "rotary_step") => config.audio.rotary_step = parse_int(value)?,

        (Section::Input, "button_active_low") => {
            config.input.button_active_low = parse_bool(value)?
        }
        (Section::Input, "debounce_ms") => config.input.debounce_ms = parse_int(value)?,
        (Section::Input, "double_click_ms") => config.input.double_click_ms = parse_int(value)?,
        (Section::Input, "hold_ms") => config.input.hold_ms = parse_int(value)?,

        _ => return Err(Fault::UnknownKey),
    }
    Ok(())
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        // Make sure # is not inside a string
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, Fault> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(Fault::InvalidValue)
    }
}

fn parse_label<const N: usize>(value: &str) -> Result<String<N>, Fault> {
    let mut out = String::new();
    out.push_str(parse_string(value)?)
        .map_err(|_| Fault::TooLong)?;
    Ok(out)
}

fn parse_labels(value: &str) -> Result<Vec<String<MAX_LABEL_LEN>, MAX_CHANNELS>, Fault> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(Fault::InvalidValue)?;

    let mut labels = Vec::new();
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        labels
            .push(parse_label(item)?)
            .map_err(|_| Fault::TooManyItems)?;
    }
    Ok(labels)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, Fault> {
    value.parse().map_err(|_| Fault::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, Fault> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Fault::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Living room unit
[wifi]
ssid = "home"
password = "hunter2 # not a comment"

[mqtt]
broker = "192.168.1.10"
prefix = "livingroom/audio"   # trailing comment
client_id = "e8db84c1"
update_interval_s = 30

[audio]
channels = ["TV", "PHONO"]
volume_max = 128
rotary_step = 2

[input]
button_active_low = true
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.wifi.ssid.as_str(), "home");
        assert_eq!(config.wifi.password.as_str(), "hunter2 # not a comment");
        assert_eq!(config.mqtt.broker.as_str(), "192.168.1.10");
        assert_eq!(config.mqtt.prefix.as_str(), "livingroom/audio");
        assert_eq!(config.mqtt.port, 1883, "absent keys keep defaults");
        assert_eq!(config.mqtt.update_interval_s, 30);
        assert_eq!(config.audio.channels.len(), 2);
        assert_eq!(config.audio.channel_label(1), Some("PHONO"));
        assert_eq!(config.audio.rotary_step, 2);
        assert!(config.input.button_active_low);
        assert_eq!(config.input.debounce_ms, 50);
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config(""), Ok(DeviceConfig::default()));
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse_config("[wifi]\nssid = \"x\"\n[display]\n"),
            Err(ParseError::InvalidSection { line: 3 })
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            parse_config("[audio]\nvolume = 3\n"),
            Err(ParseError::UnknownKey { line: 2 })
        );
        assert_eq!(
            parse_config("ssid = \"x\"\n"),
            Err(ParseError::UnknownKey { line: 1 })
        );
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            parse_config("[mqtt]\nport = 70000\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[mqtt]\nbroker = unquoted\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[input]\nbutton_active_low = yes\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("[audio]\nchannels = \"LINE 1\"\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
    }

    #[test]
    fn test_too_long_and_too_many() {
        assert_eq!(
            parse_config("[audio]\nchannels = [\"A VERY LONG INPUT NAME\"]\n"),
            Err(ParseError::TooLong { line: 2 })
        );
        assert_eq!(
            parse_config("[audio]\nchannels = [\"A\", \"B\", \"C\", \"D\", \"E\"]\n"),
            Err(ParseError::TooManyItems { line: 2 })
        );
    }

    #[test]
    fn test_validation_applies() {
        assert_eq!(
            parse_config("[audio]\nchannels = []\n"),
            Err(ParseError::Invalid(ConfigError::ChannelCount))
        );
        assert_eq!(
            parse_config("[audio]\nvolume_max = 1024\n"),
            Err(ParseError::Invalid(ConfigError::VolumeRange))
        );
    }
}
