//! Control task
//!
//! Runs one reconciliation cycle every tick and logs what happened.

use defmt::*;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::{I2C0, SPI1};
use embassy_time::{Duration, Instant, Ticker};

use audioswitch_core::controller::CycleEvent;
use audioswitch_core::{Controller, Devices};
use audioswitch_display::StatusPanel;
use audioswitch_drivers::attenuator::Mcp4;
use audioswitch_drivers::switch::Cd4052;
use audioswitch_hal_rp2040::{BlockingSpi, RpInput, RpOutput};

use crate::display::Ssd1306;
use crate::rotary::SharedRotary;
use crate::uplink::UplinkClient;

/// Control cycle interval in milliseconds
pub const CYCLE_INTERVAL_MS: u64 = 10;

type Attenuator = Mcp4<BlockingSpi<'static, SPI1>, RpOutput<'static>>;
type Switch = Cd4052<RpOutput<'static>, RpOutput<'static>, RpOutput<'static>>;
type Oled = StatusPanel<Ssd1306<I2c<'static, I2C0, Blocking>>>;

/// Everything the control loop drives
pub type ControlDevices =
    Devices<RpInput<'static>, Attenuator, Switch, SharedRotary, UplinkClient, Option<Oled>>;

/// Control task - owns the controller and the front-panel hardware
#[embassy_executor::task]
pub async fn control_task(mut controller: Controller, mut devices: ControlDevices) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CYCLE_INTERVAL_MS));

    loop {
        ticker.next().await;

        // Wraps after ~49 days; the controller only uses differences
        let now_ms = Instant::now().as_millis() as u32;

        match controller.cycle(&mut devices, now_ms) {
            Ok(report) => {
                for event in report.events() {
                    log_event(event);
                }
            }
            Err(e) => {
                error!("Control cycle failed: {:?}", Debug2Format(&e));
            }
        }
    }
}

fn log_event(event: &CycleEvent) {
    match event {
        CycleEvent::MuteToggled { muted } => info!("Mute {}", if *muted { "on" } else { "off" }),
        CycleEvent::ChannelSelected { channel } => info!("Selected input {}", channel),
        CycleEvent::RotaryMoved { value } => info!("Volume {}", value),
        CycleEvent::RotaryResynced { value } => debug!("Rotary resynced to {}", value),
        CycleEvent::LinkRequested => info!("Joining network"),
        CycleEvent::LinkRequestFailed => warn!("Network join request not sent"),
        CycleEvent::SessionOpened => info!("Broker session open"),
        CycleEvent::SessionFailed => warn!("Broker session setup failed, retrying"),
        CycleEvent::SessionClosed => warn!("Link lost, broker session closed"),
        CycleEvent::Published => trace!("State published"),
        CycleEvent::PublishFailed => warn!("State publish failed, retrying"),
        CycleEvent::CommandApplied => info!("Remote command applied"),
        CycleEvent::CommandIgnored => debug!("Message on unexpected topic ignored"),
        CycleEvent::CommandMalformed(e) => debug!("Malformed command dropped: {:?}", e),
        CycleEvent::UnknownChannel(label) => {
            warn!("Attempted to select invalid channel {}", label.as_str())
        }
        CycleEvent::Rendered => trace!("Display updated"),
        CycleEvent::RenderFailed => warn!("Display update failed"),
    }
}
