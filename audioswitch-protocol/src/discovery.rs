//! Home Assistant MQTT discovery documents
//!
//! Five entities are announced for the device: left, right and master
//! volume sliders, a mute switch and a channel select. All of them read the
//! `<prefix>/state` snapshot and write `<prefix>/set` commands.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use serde::Serialize;

use crate::json::{to_json, PayloadError};
use crate::topics::Topics;

/// Discovery topic namespace
pub const DISCOVERY_PREFIX: &str = "homeassistant";
/// Node id used in discovery topics and unique ids
pub const NODE_ID: &str = "digital-audio-switch";
/// Documents returned by [`announcements`]
pub const ANNOUNCEMENT_COUNT: usize = 5;

/// Device registry entry shared by all entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo<'a> {
    pub identifiers: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub name: &'a str,
}

impl<'a> DeviceInfo<'a> {
    pub fn new(client_id: &'a str) -> Self {
        Self {
            identifiers: client_id,
            manufacturer: "correl",
            model: NODE_ID,
            name: "Digital Audio Switch",
        }
    }
}

/// Everything the discovery documents are derived from
#[derive(Debug, Clone)]
pub struct DiscoveryContext<'a> {
    pub device: DeviceInfo<'a>,
    pub topics: &'a Topics,
    pub volume_max: u16,
    pub channels: Vec<&'a str>,
}

/// A retained discovery publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Serialize)]
struct EntityConfig<'a> {
    name: &'a str,
    command_topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_on: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_off: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_on: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_off: Option<&'a str>,
    state_topic: &'a str,
    value_template: &'a str,
    availability_topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a [&'a str]>,
    unique_id: &'a str,
    device: &'a DeviceInfo<'a>,
}

impl<'a> EntityConfig<'a> {
    fn base(
        ctx: &'a DiscoveryContext<'a>,
        name: &'a str,
        unique_id: &'a str,
        value_template: &'a str,
    ) -> Self {
        Self {
            name,
            command_topic: &ctx.topics.set,
            command_template: None,
            payload_on: None,
            payload_off: None,
            state_on: None,
            state_off: None,
            state_topic: &ctx.topics.state,
            value_template,
            availability_topic: &ctx.topics.status,
            min: None,
            max: None,
            mode: None,
            step: None,
            options: None,
            unique_id,
            device: &ctx.device,
        }
    }

    fn slider(mut self, max: u16, command_template: &'a str) -> Self {
        self.command_template = Some(command_template);
        self.min = Some(0);
        self.max = Some(max);
        self.mode = Some("slider");
        self.step = Some(1);
        self
    }
}

fn announce(
    component: &str,
    object_id: &str,
    entity: &EntityConfig<'_>,
) -> Result<Announcement, PayloadError> {
    Ok(Announcement {
        topic: format!("{DISCOVERY_PREFIX}/{component}/{NODE_ID}/{object_id}/config"),
        payload: to_json(entity)?,
    })
}

/// Build the discovery documents, in publish order
pub fn announcements(ctx: &DiscoveryContext<'_>) -> Result<Vec<Announcement>, PayloadError> {
    let left = EntityConfig::base(
        ctx,
        "Digital Audio Switch Volume (Left)",
        "digital-audio-switch-volume-left",
        "{{ value_json.volume.left }}",
    )
    .slider(ctx.volume_max, r#"{"volume": {"left": {{value}}}}"#);

    let right = EntityConfig::base(
        ctx,
        "Digital Audio Switch Volume (Right)",
        "digital-audio-switch-volume-right",
        "{{ value_json.volume.right }}",
    )
    .slider(ctx.volume_max, r#"{"volume": {"right": {{value}}}}"#);

    let master = EntityConfig::base(
        ctx,
        "Digital Audio Switch Volume (Master)",
        "digital-audio-switch-volume-master",
        "{{ [value_json.volume.left, value_json.volume.right] | max }}",
    )
    .slider(
        ctx.volume_max,
        r#"{"volume": {"right": {{value}}, "left": {{value}}}}"#,
    );

    let mut mute = EntityConfig::base(
        ctx,
        "Digital Audio Switch Mute",
        "digital-audio-switch-volume-mute",
        "{{ value_json.volume.muted }}",
    );
    mute.payload_on = Some(r#"{"volume": {"muted": "ON"}}"#);
    mute.payload_off = Some(r#"{"volume": {"muted": "OFF"}}"#);
    mute.state_on = Some("ON");
    mute.state_off = Some("OFF");

    let mut channel = EntityConfig::base(
        ctx,
        "Digital Audio Switch Channel",
        "digital-audio-switch-channel",
        "{{ value_json.channel }}",
    );
    channel.command_template = Some(r#"{"channel": "{{value}}"}"#);
    channel.options = Some(ctx.channels.as_slice());

    let mut out = Vec::with_capacity(ANNOUNCEMENT_COUNT);
    out.push(announce("number", "volume-left", &left)?);
    out.push(announce("number", "volume-right", &right)?);
    out.push(announce("number", "volume-master", &master)?);
    out.push(announce("switch", "mute", &mute)?);
    out.push(announce("select", "channel", &channel)?);
    Ok(out)
}
