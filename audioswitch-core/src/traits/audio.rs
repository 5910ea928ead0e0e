//! Audio path traits: level attenuator and source switch

/// Attenuator channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wiper {
    Left,
    Right,
}

impl Wiper {
    pub const BOTH: [Wiper; 2] = [Wiper::Left, Wiper::Right];
}

/// Dual-channel level control
///
/// Bus errors are returned as-is; the control loop treats them as fatal for
/// the cycle and never retries.
pub trait Attenuator {
    /// Error type for bus operations
    type Error;

    /// Read back the current level of a wiper
    fn level(&mut self, wiper: Wiper) -> Result<u16, Self::Error>;

    /// Set the level of a wiper
    fn set_level(&mut self, wiper: Wiper, level: u16) -> Result<(), Self::Error>;
}

/// Multi-input source selector with a mute line
pub trait AudioSwitch {
    /// Route an input to the output
    fn select(&mut self, channel: u8);

    /// Currently routed input
    fn channel(&self) -> u8;

    fn is_muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn toggle_mute(&mut self) {
        let muted = self.is_muted();
        self.set_muted(!muted);
    }
}
