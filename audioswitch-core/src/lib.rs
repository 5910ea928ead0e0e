//! Board-agnostic core logic for the Audioswitch firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Button gesture classification (debounce, click, double-click, hold)
//! - Change-tracked state tree published to the control plane
//! - Collaborator traits (attenuator, switch, rotary, control plane, display)
//! - The per-cycle reconciliation loop
//! - Configuration type definitions and the embedded config parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod input;
pub mod state;
pub mod traits;

pub use controller::{Controller, CycleError, CycleEvent, CycleReport, Devices};
pub use input::{Button, ButtonTiming};
pub use state::{StateTree, StoreError, Value};
