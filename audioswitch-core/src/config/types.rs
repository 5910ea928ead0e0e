//! Configuration type definitions

use heapless::{String, Vec};

use crate::input::ButtonTiming;

/// Maximum channel label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum selectable inputs (CD4052 is a 4:1 switch)
pub const MAX_CHANNELS: usize = 4;

/// Largest volume the attenuator can represent (8-bit parts, full scale)
pub const MAX_VOLUME: u16 = 256;

pub type Label = String<MAX_LABEL_LEN>;

/// Invalid configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No channels, or more than the switch has
    ChannelCount,
    /// Volume range zero or beyond the attenuator
    VolumeRange,
    /// Rotary step of zero
    RotaryStep,
    /// Empty MQTT prefix
    EmptyPrefix,
}

/// Wireless network credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiConfig {
    pub ssid: String<32>,
    pub password: String<64>,
}

/// Broker connection and publish behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MqttConfig {
    /// Broker host name or address
    pub broker: String<64>,
    pub port: u16,
    /// Topic prefix for state, status and set topics
    pub prefix: String<48>,
    pub client_id: String<32>,
    pub keepalive_s: u16,
    /// Maximum quiet time between state publishes
    pub update_interval_s: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: String::new(),
            port: 1883,
            prefix: label("digital-audio-switch"),
            client_id: label("audioswitch"),
            keepalive_s: 60,
            update_interval_s: 60,
        }
    }
}

/// Audio path configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Input labels, in switch order
    pub channels: Vec<Label, MAX_CHANNELS>,
    /// Attenuator full-scale level
    pub volume_max: u16,
    /// Level change per encoder detent
    pub rotary_step: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let mut channels = Vec::new();
        for name in ["LINE 1", "LINE 2", "LINE 3", "PHONO"] {
            let _ = channels.push(label(name));
        }
        Self {
            channels,
            volume_max: 128,
            rotary_step: 4,
        }
    }
}

impl AudioConfig {
    /// Index of a channel label
    pub fn channel_index(&self, name: &str) -> Option<u8> {
        self.channels
            .iter()
            .position(|c| c.as_str() == name)
            .map(|i| i as u8)
    }

    /// Label of a channel index
    pub fn channel_label(&self, index: u8) -> Option<&str> {
        self.channels.get(usize::from(index)).map(|c| c.as_str())
    }
}

/// Front-panel input configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputConfig {
    /// Button pulls the line low when pressed
    pub button_active_low: bool,
    pub debounce_ms: u32,
    pub double_click_ms: u32,
    pub hold_ms: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        let timing = ButtonTiming::default();
        Self {
            button_active_low: false,
            debounce_ms: timing.debounce_ms,
            double_click_ms: timing.double_click_ms,
            hold_ms: timing.hold_ms,
        }
    }
}

impl InputConfig {
    pub fn timing(&self) -> ButtonTiming {
        ButtonTiming {
            debounce_ms: self.debounce_ms,
            double_click_ms: self.double_click_ms,
            hold_ms: self.hold_ms,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
}

impl DeviceConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.channels.is_empty() {
            return Err(ConfigError::ChannelCount);
        }
        if self.audio.volume_max == 0 || self.audio.volume_max > MAX_VOLUME {
            return Err(ConfigError::VolumeRange);
        }
        if self.audio.rotary_step == 0 {
            return Err(ConfigError::RotaryStep);
        }
        if self.mqtt.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }
}

fn label<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DeviceConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.audio.channels.len(), 4);
        assert_eq!(config.audio.volume_max, 128);
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.input.timing(), ButtonTiming::default());
    }

    #[test]
    fn test_channel_lookup() {
        let audio = AudioConfig::default();
        assert_eq!(audio.channel_index("PHONO"), Some(3));
        assert_eq!(audio.channel_index("phono"), None);
        assert_eq!(audio.channel_label(1), Some("LINE 2"));
        assert_eq!(audio.channel_label(4), None);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = DeviceConfig::default();
        config.audio.channels.clear();
        assert_eq!(config.validate(), Err(ConfigError::ChannelCount));

        let mut config = DeviceConfig::default();
        config.audio.volume_max = 0;
        assert_eq!(config.validate(), Err(ConfigError::VolumeRange));

        let mut config = DeviceConfig::default();
        config.audio.rotary_step = 0;
        assert_eq!(config.validate(), Err(ConfigError::RotaryStep));

        let mut config = DeviceConfig::default();
        config.mqtt.prefix.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPrefix));
    }
}
