//! Uplink UART transmit task
//!
//! Writes queued frames to the network bridge.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use audioswitch_protocol::MAX_FRAME_SIZE;

use crate::channels::OUTBOX;

/// Uplink TX task - drains the outbox to the bridge
#[embassy_executor::task]
pub async fn uplink_tx_task(mut tx: BufferedUartTx) {
    info!("Uplink TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];

    loop {
        let frame = OUTBOX.receive().await;

        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("Failed to send frame: {:?}", e);
                } else {
                    trace!("TX: frame type {:#x}, {} bytes", frame.msg_type, len);
                }
            }
            Err(e) => {
                warn!("Failed to encode frame: {:?}", e);
            }
        }
    }
}
