//! Collaborator traits
//!
//! These traits define the interface between the control loop and the
//! peripherals and services it drives. Drivers and the firmware implement
//! them; tests implement them with mocks.

pub mod audio;
pub mod control_plane;
pub mod display;
pub mod rotary;

pub use audio::{Attenuator, AudioSwitch, Wiper};
pub use control_plane::ControlPlane;
pub use display::StatusDisplay;
pub use rotary::RotaryControl;
