//! Message types for the uplink protocol
//!
//! Message types are divided into two categories:
//! - Controller → Bridge: network join, MQTT session, subscribe, publish
//! - Bridge → Controller: link state changes, subscribed messages
//!
//! Strings are encoded as `[len u8][bytes...]`; a publish payload runs to the
//! end of the frame.

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use heapless::{String, Vec};

// Message type IDs: Bridge → Controller
pub const MSG_LINK: u8 = 0x01;
pub const MSG_MESSAGE: u8 = 0x02;

// Message type IDs: Controller → Bridge
pub const MSG_JOIN: u8 = 0x20;
pub const MSG_SESSION: u8 = 0x21;
pub const MSG_SUBSCRIBE: u8 = 0x22;
pub const MSG_PUBLISH: u8 = 0x23;

/// Longest topic accepted on an inbound message
pub const MAX_TOPIC_LEN: usize = 64;

/// Longest payload accepted on an inbound message
pub const MAX_INCOMING_PAYLOAD: usize = 256;

/// Network bridge link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Radio off or not yet asked to join
    #[default]
    Off,
    /// Join in progress
    Joining,
    /// Associated and addressed
    Up,
}

impl LinkState {
    pub fn to_byte(self) -> u8 {
        match self {
            LinkState::Off => 0,
            LinkState::Joining => 1,
            LinkState::Up => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LinkState::Off),
            1 => Some(LinkState::Joining),
            2 => Some(LinkState::Up),
            _ => None,
        }
    }
}

/// Network credentials for a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiCredentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// Message published by the broker when the session dies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LastWill<'a> {
    pub topic: &'a str,
    pub payload: &'a str,
    pub retain: bool,
}

/// MQTT session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionParams<'a> {
    pub client_id: &'a str,
    pub broker: &'a str,
    pub port: u16,
    pub keepalive_s: u16,
    pub will: LastWill<'a>,
}

/// Messages from the controller to the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerMessage<'a> {
    /// Join the wireless network
    Join(WifiCredentials<'a>),
    /// Connect to the broker
    OpenSession(SessionParams<'a>),
    /// Subscribe to a topic
    Subscribe { topic: &'a str },
    /// Publish a message
    Publish {
        topic: &'a str,
        payload: &'a [u8],
        retain: bool,
    },
}

impl<'a> ControllerMessage<'a> {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut w = PayloadWriter::new();
        match self {
            ControllerMessage::Join(creds) => {
                // Payload: [ssid][password]
                w.string(creds.ssid)?;
                w.string(creds.password)?;
                Frame::new(MSG_JOIN, w.as_slice())
            }
            ControllerMessage::OpenSession(params) => {
                // Payload: [port u16][keepalive u16][will_retain]
                //          [client_id][broker][will_topic][will_payload]
                w.u16(params.port)?;
                w.u16(params.keepalive_s)?;
                w.u8(u8::from(params.will.retain))?;
                w.string(params.client_id)?;
                w.string(params.broker)?;
                w.string(params.will.topic)?;
                w.string(params.will.payload)?;
                Frame::new(MSG_SESSION, w.as_slice())
            }
            ControllerMessage::Subscribe { topic } => {
                w.string(topic)?;
                Frame::new(MSG_SUBSCRIBE, w.as_slice())
            }
            ControllerMessage::Publish {
                topic,
                payload,
                retain,
            } => {
                // Payload: [retain][topic][payload...]
                w.u8(u8::from(*retain))?;
                w.string(topic)?;
                w.bytes(payload)?;
                Frame::new(MSG_PUBLISH, w.as_slice())
            }
        }
    }

    /// Parse a controller message from a frame (bridge side)
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let mut r = PayloadReader::new(&frame.payload);
        let msg = match frame.msg_type {
            MSG_JOIN => ControllerMessage::Join(WifiCredentials {
                ssid: r.string()?,
                password: r.string()?,
            }),
            MSG_SESSION => {
                let port = r.u16()?;
                let keepalive_s = r.u16()?;
                let retain = r.u8()? != 0;
                ControllerMessage::OpenSession(SessionParams {
                    port,
                    keepalive_s,
                    client_id: r.string()?,
                    broker: r.string()?,
                    will: LastWill {
                        topic: r.string()?,
                        payload: r.string()?,
                        retain,
                    },
                })
            }
            MSG_SUBSCRIBE => ControllerMessage::Subscribe { topic: r.string()? },
            MSG_PUBLISH => {
                let retain = r.u8()? != 0;
                let topic = r.string()?;
                return Ok(ControllerMessage::Publish {
                    topic,
                    payload: r.rest(),
                    retain,
                });
            }
            _ => return Err(FrameError::InvalidFrame),
        };
        r.finish()?;
        Ok(msg)
    }
}

/// A message delivered on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Incoming {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_INCOMING_PAYLOAD>,
}

impl Incoming {
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, FrameError> {
        let mut t = String::new();
        t.push_str(topic).map_err(|_| FrameError::PayloadTooLarge)?;
        let mut p = Vec::new();
        p.extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            topic: t,
            payload: p,
        })
    }
}

/// Messages from the bridge to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeMessage {
    /// Link state changed
    Link(LinkState),
    /// Message received on a subscribed topic
    Message(Incoming),
}

impl BridgeMessage {
    /// Parse a bridge message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let mut r = PayloadReader::new(&frame.payload);
        match frame.msg_type {
            MSG_LINK => {
                let state = LinkState::from_byte(r.u8()?).ok_or(FrameError::InvalidFrame)?;
                r.finish()?;
                Ok(BridgeMessage::Link(state))
            }
            MSG_MESSAGE => {
                let topic = r.string()?;
                Ok(BridgeMessage::Message(Incoming::new(topic, r.rest())?))
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this message into a frame (bridge side)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            BridgeMessage::Link(state) => Frame::new(MSG_LINK, &[state.to_byte()]),
            BridgeMessage::Message(incoming) => {
                let mut w = PayloadWriter::new();
                w.string(&incoming.topic)?;
                w.bytes(&incoming.payload)?;
                Frame::new(MSG_MESSAGE, w.as_slice())
            }
        }
    }
}

struct PayloadWriter {
    buf: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl PayloadWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn u8(&mut self, value: u8) -> Result<(), FrameError> {
        self.buf.push(value).map_err(|_| FrameError::PayloadTooLarge)
    }

    fn u16(&mut self, value: u16) -> Result<(), FrameError> {
        self.bytes(&value.to_le_bytes())
    }

    fn string(&mut self, s: &str) -> Result<(), FrameError> {
        let len = u8::try_from(s.len()).map_err(|_| FrameError::PayloadTooLarge)?;
        self.u8(len)?;
        self.bytes(s.as_bytes())
    }

    fn bytes(&mut self, data: &[u8]) -> Result<(), FrameError> {
        self.buf
            .extend_from_slice(data)
            .map_err(|_| FrameError::PayloadTooLarge)
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        let end = self.pos.checked_add(n).ok_or(FrameError::InvalidFrame)?;
        let slice = self.data.get(self.pos..end).ok_or(FrameError::InvalidFrame)?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn string(&mut self) -> Result<&'a str, FrameError> {
        let len = usize::from(self.u8()?);
        core::str::from_utf8(self.take(len)?).map_err(|_| FrameError::InvalidFrame)
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    fn finish(&self) -> Result<(), FrameError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(FrameError::InvalidFrame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_layout() {
        let msg = ControllerMessage::Publish {
            topic: "sw/status",
            payload: b"online",
            retain: true,
        };
        let frame = msg.to_frame().unwrap();

        assert_eq!(frame.msg_type, MSG_PUBLISH);
        assert_eq!(frame.payload[0], 1); // retain
        assert_eq!(frame.payload[1], 9); // topic len
        assert_eq!(&frame.payload[2..11], b"sw/status");
        assert_eq!(&frame.payload[11..], b"online");
    }

    #[test]
    fn test_session_roundtrip() {
        let msg = ControllerMessage::OpenSession(SessionParams {
            client_id: "e8db84c1",
            broker: "192.168.1.10",
            port: 1883,
            keepalive_s: 60,
            will: LastWill {
                topic: "sw/status",
                payload: "offline",
                retain: true,
            },
        });
        let frame = msg.to_frame().unwrap();
        assert_eq!(ControllerMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_join_rejects_trailing_bytes() {
        let frame = Frame::new(MSG_JOIN, &[1, b'a', 1, b'b', 0xFF]).unwrap();
        assert_eq!(
            ControllerMessage::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_string_too_long_for_prefix() {
        let long = "x".repeat(300);
        let msg = ControllerMessage::Subscribe { topic: &long };
        assert_eq!(msg.to_frame(), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_parse_link() {
        let frame = Frame::new(MSG_LINK, &[2]).unwrap();
        assert_eq!(
            BridgeMessage::from_frame(&frame).unwrap(),
            BridgeMessage::Link(LinkState::Up)
        );
    }

    #[test]
    fn test_parse_link_unknown_state() {
        let frame = Frame::new(MSG_LINK, &[7]).unwrap();
        assert_eq!(BridgeMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_parse_message() {
        let mut payload = std::vec![6];
        payload.extend_from_slice(b"sw/set");
        payload.extend_from_slice(br#"{"channel": "PHONO"}"#);
        let frame = Frame::new(MSG_MESSAGE, &payload).unwrap();

        let BridgeMessage::Message(incoming) = BridgeMessage::from_frame(&frame).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(incoming.topic.as_str(), "sw/set");
        assert_eq!(&incoming.payload[..], br#"{"channel": "PHONO"}"#);
    }

    #[test]
    fn test_parse_message_truncated_topic() {
        let frame = Frame::new(MSG_MESSAGE, &[10, b's', b'w']).unwrap();
        assert_eq!(BridgeMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_unknown_message_type() {
        let frame = Frame::empty(0x7F);
        assert_eq!(BridgeMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
        assert_eq!(
            ControllerMessage::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }
}
