//! Rotary encoder task
//!
//! Samples the encoder phases and moves the shared position. Runs faster
//! than the control loop so detents are not missed between cycles.

use defmt::*;
use embassy_time::{Duration, Ticker};

use audioswitch_drivers::rotary::Encoder;
use audioswitch_hal_rp2040::RpInput;

use crate::channels::ENCODER;

/// Encoder sampling interval in milliseconds
const POLL_INTERVAL_MS: u64 = 1;

#[embassy_executor::task]
pub async fn encoder_task(mut encoder: Encoder<RpInput<'static>, RpInput<'static>>) {
    info!("Encoder task started");

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        ticker.next().await;

        if let Some(step) = encoder.poll() {
            trace!("Encoder step {:?}", step);
            ENCODER.lock(|rotary| rotary.borrow_mut().apply(step));
        }
    }
}
