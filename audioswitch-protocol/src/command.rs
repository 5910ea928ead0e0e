//! Remote `set` commands
//!
//! Commands arrive as loosely-typed JSON from the dashboard:
//!
//! ```json
//! {"volume": {"left": 64, "right": 64, "muted": "ON"}, "channel": "PHONO"}
//! ```
//!
//! Every field is optional. A field of the wrong type is ignored on its own
//! without discarding the rest of the command.

use alloc::string::String;
use serde_json::Value;

/// Error parsing a remote command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Payload is not valid JSON
    NotJson,
    /// Payload is JSON but not an object
    NotAnObject,
}

/// A parsed remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCommand {
    /// Requested left level (unclamped)
    pub left: Option<i64>,
    /// Requested right level (unclamped)
    pub right: Option<i64>,
    /// Requested mute state
    pub muted: Option<bool>,
    /// Requested channel label, not yet resolved
    pub channel: Option<String>,
}

impl RemoteCommand {
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_slice(payload).map_err(|_| CommandError::NotJson)?;
        let obj = value.as_object().ok_or(CommandError::NotAnObject)?;

        let mut cmd = RemoteCommand::default();
        if let Some(volume) = obj.get("volume").and_then(Value::as_object) {
            cmd.left = volume.get("left").and_then(Value::as_i64);
            cmd.right = volume.get("right").and_then(Value::as_i64);
            cmd.muted = volume
                .get("muted")
                .and_then(Value::as_str)
                .map(|s| s == "ON");
        }
        cmd.channel = obj.get("channel").and_then(Value::as_str).map(String::from);
        Ok(cmd)
    }

    /// Whether the command requests anything at all
    pub fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.right.is_none()
            && self.muted.is_none()
            && self.channel.is_none()
    }
}
