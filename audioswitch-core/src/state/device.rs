//! Device state schema
//!
//! ```json
//! {
//!   "network": "OFF" | "ACT" | "OK",
//!   "volume": {"left": 0..=max, "right": 0..=max, "muted": "ON" | "OFF"},
//!   "channel": "<configured label>"
//! }
//! ```
//!
//! The field names and value domains are shared with the remote dashboard
//! and must not change.

use audioswitch_protocol::LinkState;

use super::tree::{StateTree, StoreError};

/// State tree paths
pub mod keys {
    pub const NETWORK: &str = "network";
    pub const VOLUME: &str = "volume";
    pub const LEFT: &str = "volume.left";
    pub const RIGHT: &str = "volume.right";
    pub const MUTED: &str = "volume.muted";
    pub const CHANNEL: &str = "channel";
}

pub const ON: &str = "ON";
pub const OFF: &str = "OFF";

/// Mute flag as published
pub fn on_off(flag: bool) -> &'static str {
    if flag {
        ON
    } else {
        OFF
    }
}

/// Network connectivity as published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkStatus {
    /// Radio off
    #[default]
    Off,
    /// Joining
    Active,
    /// Connected
    Ok,
}

impl NetworkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkStatus::Off => "OFF",
            NetworkStatus::Active => "ACT",
            NetworkStatus::Ok => "OK",
        }
    }
}

impl From<LinkState> for NetworkStatus {
    fn from(link: LinkState) -> Self {
        match link {
            LinkState::Off => NetworkStatus::Off,
            LinkState::Joining => NetworkStatus::Active,
            LinkState::Up => NetworkStatus::Ok,
        }
    }
}

/// Build the boot-time state tree, clean
pub fn default_state(first_channel: &str) -> Result<StateTree, StoreError> {
    let mut tree = StateTree::new();
    tree.set_text(keys::NETWORK, NetworkStatus::Off.as_str())?;
    tree.insert_branch(keys::VOLUME)?;
    tree.set(keys::LEFT, 0)?;
    tree.set(keys::RIGHT, 0)?;
    tree.set_text(keys::MUTED, OFF)?;
    tree.set_text(keys::CHANNEL, first_channel)?;
    tree.clean();
    Ok(tree)
}

/// Typed read of the device fields, for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus<'a> {
    pub network: &'a str,
    pub left: i32,
    pub right: i32,
    pub muted: bool,
    pub channel: &'a str,
}

impl<'a> DeviceStatus<'a> {
    /// Missing fields read as zero / empty
    pub fn read(tree: &'a StateTree) -> Self {
        Self {
            network: tree.text(keys::NETWORK).unwrap_or(""),
            left: tree.int(keys::LEFT).unwrap_or(0),
            right: tree.int(keys::RIGHT).unwrap_or(0),
            muted: tree.text(keys::MUTED) == Some(ON),
            channel: tree.text(keys::CHANNEL).unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let tree = default_state("LINE 1").unwrap();
        assert!(!tree.is_dirty());
        assert_eq!(
            serde_json::to_string(&tree.snapshot()).unwrap(),
            r#"{"network":"OFF","volume":{"left":0,"right":0,"muted":"OFF"},"channel":"LINE 1"}"#
        );
    }

    #[test]
    fn test_network_status_strings() {
        assert_eq!(NetworkStatus::from(LinkState::Off).as_str(), "OFF");
        assert_eq!(NetworkStatus::from(LinkState::Joining).as_str(), "ACT");
        assert_eq!(NetworkStatus::from(LinkState::Up).as_str(), "OK");
    }

    #[test]
    fn test_device_status_read() {
        let mut tree = default_state("PHONO").unwrap();
        tree.set(keys::LEFT, 12).unwrap();
        tree.set_text(keys::MUTED, on_off(true)).unwrap();

        let status = DeviceStatus::read(&tree);
        assert_eq!(status.left, 12);
        assert_eq!(status.right, 0);
        assert!(status.muted);
        assert_eq!(status.channel, "PHONO");
        assert_eq!(status.network, "OFF");
    }
}
