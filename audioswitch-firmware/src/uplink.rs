//! Control-plane client over the network bridge
//!
//! Requests are encoded into frames and queued for the uplink TX task;
//! nothing here waits on the UART. Link state and inbound messages are
//! filled in by the uplink RX task.

use audioswitch_core::traits::ControlPlane;
use audioswitch_protocol::{
    ControllerMessage, FrameError, Incoming, LinkState, SessionParams, WifiCredentials,
};

use crate::channels::{link_state, INBOX, OUTBOX};

/// Uplink request errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum UplinkError {
    /// Request does not fit in a frame
    Frame(FrameError),
    /// TX task is behind; request dropped
    QueueFull,
}

/// Handle to the bridge
pub struct UplinkClient;

impl UplinkClient {
    fn send(&self, message: ControllerMessage<'_>) -> Result<(), UplinkError> {
        let frame = message.to_frame().map_err(UplinkError::Frame)?;
        OUTBOX.try_send(frame).map_err(|_| UplinkError::QueueFull)
    }
}

impl ControlPlane for UplinkClient {
    type Error = UplinkError;

    fn link(&self) -> LinkState {
        link_state()
    }

    fn start_link(&mut self, credentials: &WifiCredentials<'_>) -> Result<(), UplinkError> {
        self.send(ControllerMessage::Join(*credentials))
    }

    fn open_session(&mut self, params: &SessionParams<'_>) -> Result<(), UplinkError> {
        self.send(ControllerMessage::OpenSession(*params))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), UplinkError> {
        self.send(ControllerMessage::Subscribe { topic })
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), UplinkError> {
        self.send(ControllerMessage::Publish {
            topic,
            payload,
            retain,
        })
    }

    fn poll_incoming(&mut self) -> Option<Incoming> {
        INBOX.try_receive().ok()
    }
}
