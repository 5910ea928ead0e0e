//! Control-plane topic layout
//!
//! All device topics hang off a configurable prefix:
//!
//! | Topic             | Direction | Payload                         |
//! |-------------------|-----------|---------------------------------|
//! | `<prefix>/state`  | out       | JSON snapshot of the state tree |
//! | `<prefix>/status` | out       | `online` / `offline` (will)     |
//! | `<prefix>/set`    | in        | JSON remote command             |

use core::fmt::Write;
use heapless::String;

use crate::messages::MAX_TOPIC_LEN;

/// Availability payload published before every state update
pub const STATUS_ONLINE: &str = "online";
/// Availability payload registered as the session's last will
pub const STATUS_OFFLINE: &str = "offline";

/// Prefix exceeds the topic buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopicTooLong;

/// Resolved device topics
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Topics {
    pub state: String<MAX_TOPIC_LEN>,
    pub status: String<MAX_TOPIC_LEN>,
    pub set: String<MAX_TOPIC_LEN>,
}

impl Topics {
    pub fn new(prefix: &str) -> Result<Self, TopicTooLong> {
        Ok(Self {
            state: join(prefix, "state")?,
            status: join(prefix, "status")?,
            set: join(prefix, "set")?,
        })
    }

    /// Whether an inbound topic is the command topic
    pub fn is_command(&self, topic: &str) -> bool {
        self.set.as_str() == topic
    }
}

fn join(prefix: &str, leaf: &str) -> Result<String<MAX_TOPIC_LEN>, TopicTooLong> {
    let mut topic = String::new();
    write!(topic, "{}/{}", prefix.trim_end_matches('/'), leaf).map_err(|_| TopicTooLong)?;
    Ok(topic)
}
