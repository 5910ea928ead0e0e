//! Rotary position shared with the encoder task

use audioswitch_core::traits::RotaryControl;
use audioswitch_drivers::rotary::BoundedRotary;

use crate::channels::ENCODER;

/// Control-task view of the encoder position
pub struct SharedRotary;

impl SharedRotary {
    /// Configure range and step, starting at zero
    pub fn configure(max: u16, step: u16) -> Self {
        ENCODER.lock(|rotary| rotary.replace(BoundedRotary::new(0, max, step)));
        Self
    }
}

impl RotaryControl for SharedRotary {
    fn value(&self) -> u16 {
        ENCODER.lock(|rotary| rotary.borrow().value())
    }

    fn set_value(&mut self, value: u16) {
        ENCODER.lock(|rotary| rotary.borrow_mut().set_value(value));
    }
}
