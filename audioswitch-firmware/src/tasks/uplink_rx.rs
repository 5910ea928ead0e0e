//! Uplink UART receive task
//!
//! Receives frames from the network bridge, tracks link state and queues
//! inbound broker messages for the control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use audioswitch_protocol::{BridgeMessage, FrameParser};

use crate::channels::{link_state, set_link_state, INBOX};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Uplink RX task - receives and parses frames from the bridge
#[embassy_executor::task]
pub async fn uplink_rx_task(mut rx: BufferedUartRx) {
    info!("Uplink RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match BridgeMessage::from_frame(&frame) {
                            Ok(message) => handle_bridge_message(message),
                            Err(e) => warn!("Failed to parse bridge message: {:?}", e),
                        },
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

fn handle_bridge_message(message: BridgeMessage) {
    match message {
        BridgeMessage::Link(state) => {
            if state != link_state() {
                info!("Link state: {:?}", state);
            }
            set_link_state(state);
        }
        BridgeMessage::Message(incoming) => {
            debug!("Message on {}", incoming.topic.as_str());
            // Drop if the control loop is behind
            if INBOX.try_send(incoming).is_err() {
                warn!("Inbox full, dropping message");
            }
        }
    }
}
