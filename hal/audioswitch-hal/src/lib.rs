//! Audioswitch Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the drivers are written
//! against. Chip-specific crates (currently `audioswitch-hal-rp2040`) implement
//! them, so the drivers and the control loop can be tested on the host with
//! mock pins and buses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  audioswitch-drivers (MCP4, CD4052)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  audioswitch-hal (this crate - traits)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          ┌─────────────────────┐
//!          │ audioswitch-hal-    │
//!          │      rp2040         │
//!          └─────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`spi::SpiBus`] - SPI bus operations

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod spi;

pub use gpio::{InputPin, OutputPin};
pub use spi::SpiBus;
