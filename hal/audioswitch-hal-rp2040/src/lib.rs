//! RP2040-specific HAL for the Audioswitch firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `audioswitch-hal` traits:
//!
//! - GPIO wrappers (`RpOutput`, `RpInput`) over embassy-rp pins
//! - A blocking SPI wrapper (`BlockingSpi`) for the attenuator bus

#![no_std]

pub mod gpio;
pub mod spi;

pub use gpio::{RpInput, RpOutput};
pub use spi::{rp_config, BlockingSpi};

// Re-export shared traits from audioswitch-hal for convenience
pub use audioswitch_hal::{InputPin, OutputPin, SpiBus};
