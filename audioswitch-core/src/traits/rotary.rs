//! Rotary volume control trait

/// Bounded rotary position
pub trait RotaryControl {
    /// Current logical position
    fn value(&self) -> u16;

    /// Move the logical position, clamped to the control's range
    fn set_value(&mut self, value: u16);
}
