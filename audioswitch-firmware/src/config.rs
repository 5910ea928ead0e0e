//! Configuration loading
//!
//! The device configuration is embedded at build time (and validated there
//! by build.rs), then parsed on the target by the core's no_std parser.

use defmt::*;

use audioswitch_core::config::{parse_config, DeviceConfig};

/// Embedded configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load() -> DeviceConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Configuration loaded: broker={}, prefix={}, {} channels, volume_max={}",
                config.mqtt.broker.as_str(),
                config.mqtt.prefix.as_str(),
                config.audio.channels.len(),
                config.audio.volume_max
            );
            config
        }
        Err(e) => {
            // build.rs validates device.toml, so this is a parser mismatch
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using default configuration");
            DeviceConfig::default()
        }
    }
}
