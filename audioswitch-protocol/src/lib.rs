//! Audioswitch Control-Plane Protocol
//!
//! This crate defines everything that crosses the device boundary:
//!
//! - The UART framing between the controller and the network bridge
//!   (Wi-Fi + MQTT co-processor), and the messages carried in those frames.
//! - The MQTT topic layout under the configured prefix.
//! - The JSON payloads: remote `set` commands, state snapshots and the
//!   Home Assistant discovery documents.
//!
//! # Uplink frame format
//!
//! ```text
//! ┌───────┬──────────┬──────┬──────────────┬──────────┐
//! │ START │ LENGTH   │ TYPE │ PAYLOAD      │ CHECKSUM │
//! │ 1B    │ 2B (LE)  │ 1B   │ 0–1024B      │ 1B       │
//! └───────┴──────────┴──────┴──────────────┴──────────┘
//! ```
//!
//! The bridge is a transport only. It joins the network, holds the MQTT
//! session and relays publishes and subscribed messages; all device logic
//! stays on the controller.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod command;
pub mod discovery;
pub mod frame;
pub mod json;
pub mod messages;
pub mod topics;

pub use command::{CommandError, RemoteCommand};
pub use discovery::{
    announcements, Announcement, DeviceInfo, DiscoveryContext, ANNOUNCEMENT_COUNT,
};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use json::{to_json, PayloadError};
pub use messages::{
    BridgeMessage, ControllerMessage, Incoming, LastWill, LinkState, SessionParams,
    WifiCredentials, MAX_INCOMING_PAYLOAD, MAX_TOPIC_LEN,
};
pub use topics::{TopicTooLong, Topics, STATUS_OFFLINE, STATUS_ONLINE};
