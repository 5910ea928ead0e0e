//! Audioswitch - Digital Audio Source Selector Firmware
//!
//! Main firmware binary for RP2040-based audio switches: a rotary encoder
//! with push button on the front panel, an MCP4 dual digital potentiometer
//! as the volume attenuator, a CD4052 selecting one of four stereo inputs,
//! an SSD1306 status screen and an MQTT control plane reached through a
//! UART-attached network bridge.
//!
//! # Pin assignments
//!
//! | Function            | GPIO          |
//! |---------------------|---------------|
//! | Bridge UART0 TX/RX  | 0 / 1         |
//! | Encoder button      | 2             |
//! | Encoder A / B       | 3 / 4         |
//! | CD4052 A / B / INH  | 6 / 7 / 8     |
//! | SPI1 SCK/MOSI/MISO  | 10 / 11 / 12  |
//! | MCP4 chip select    | 13            |
//! | OLED I2C0 SDA/SCL   | 16 / 17       |

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::Spi;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_time::Instant;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use audioswitch_core::traits::AudioSwitch;
use audioswitch_core::{Controller, Devices};
use audioswitch_display::StatusPanel;
use audioswitch_drivers::attenuator::Mcp4;
use audioswitch_drivers::rotary::Encoder;
use audioswitch_drivers::switch::Cd4052;
use audioswitch_hal::spi::SpiConfig;
use audioswitch_hal_rp2040::{rp_config, BlockingSpi, RpInput, RpOutput};

use crate::display::Ssd1306;
use crate::rotary::SharedRotary;
use crate::uplink::UplinkClient;

// Heap allocator for JSON payloads
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

mod channels;
mod config;
mod display;
mod rotary;
mod tasks;
mod uplink;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Audioswitch firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Setup UART for the network bridge
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 512]);
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Irqs,
        tx_buf,
        rx_buf,
        UartConfig::default(), // 115200 baud
    );
    let (tx, rx) = uart.split();

    info!("UART initialized for network bridge");

    // Front panel
    let pull = if config.input.button_active_low {
        Pull::Up
    } else {
        Pull::Down
    };
    let button = RpInput::new(Input::new(p.PIN_2, pull));
    let encoder = Encoder::new(
        RpInput::new(Input::new(p.PIN_3, Pull::Up)),
        RpInput::new(Input::new(p.PIN_4, Pull::Up)),
    );
    let rotary = SharedRotary::configure(config.audio.volume_max, config.audio.rotary_step);

    // Source switch, first input
    let mut switch = Cd4052::new(
        RpOutput::new(Output::new(p.PIN_6, Level::Low)),
        RpOutput::new(Output::new(p.PIN_7, Level::Low)),
        RpOutput::new(Output::new(p.PIN_8, Level::Low)),
    );
    switch.select(0);

    // Attenuator on SPI1
    let spi = Spi::new_blocking(
        p.SPI1,
        p.PIN_10,
        p.PIN_11,
        p.PIN_12,
        rp_config(&SpiConfig::default()),
    );
    let attenuator = Mcp4::new(
        BlockingSpi::new(spi),
        RpOutput::new(Output::new(p.PIN_13, Level::High)),
    );

    info!("Audio path initialized");

    // Status screen; the device runs without one
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_17, p.PIN_16, i2c::Config::default());
    let mut oled = Ssd1306::new(i2c);
    let display = match oled.init() {
        Ok(()) => {
            info!("OLED initialized");
            Some(StatusPanel::new(oled, config.audio.volume_max))
        }
        Err(e) => {
            warn!("OLED unavailable: {:?}", e);
            None
        }
    };

    let now_ms = Instant::now().as_millis() as u32;
    // Prefix length and schema size are bounded by config validation
    let controller = unwrap!(Controller::new(config, &button, &rotary, now_ms));

    let devices = Devices {
        button,
        attenuator,
        switch,
        rotary,
        uplink: UplinkClient,
        display,
    };

    // Spawn tasks
    spawner.spawn(tasks::uplink_rx_task(rx)).unwrap();
    spawner.spawn(tasks::uplink_tx_task(tx)).unwrap();
    spawner.spawn(tasks::encoder_task(encoder)).unwrap();
    spawner.spawn(tasks::control_task(controller, devices)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
