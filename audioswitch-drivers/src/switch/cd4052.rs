//! CD4052B dual 4-channel analog multiplexer
//!
//! Two select lines route one of four input pairs to the common pins. The
//! INH line disconnects all channels, which doubles as mute.
//!
//! | B | A | Channel |
//! |---|---|---------|
//! | 0 | 0 | 0       |
//! | 0 | 1 | 1       |
//! | 1 | 0 | 2       |
//! | 1 | 1 | 3       |

use audioswitch_core::traits::AudioSwitch;
use audioswitch_hal::OutputPin;

/// Number of selectable input pairs
pub const CHANNELS: u8 = 4;

/// CD4052 on three output pins
pub struct Cd4052<A, B, INH> {
    select_a: A,
    select_b: B,
    inh: INH,
}

impl<A: OutputPin, B: OutputPin, INH: OutputPin> Cd4052<A, B, INH> {
    /// Take ownership of the pins, keeping their current levels
    pub fn new(select_a: A, select_b: B, inh: INH) -> Self {
        Self {
            select_a,
            select_b,
            inh,
        }
    }
}

impl<A: OutputPin, B: OutputPin, INH: OutputPin> AudioSwitch for Cd4052<A, B, INH> {
    /// Route an input pair (only the low two bits are used)
    ///
    /// Output is inhibited while the select lines change, then the previous
    /// mute state is restored.
    fn select(&mut self, channel: u8) {
        let muted = self.inh.is_set_high();
        self.inh.set_high();
        self.select_a.set_state(channel & 0b01 != 0);
        self.select_b.set_state(channel & 0b10 != 0);
        self.inh.set_state(muted);
    }

    fn channel(&self) -> u8 {
        u8::from(self.select_a.is_set_high()) | (u8::from(self.select_b.is_set_high()) << 1)
    }

    fn is_muted(&self) -> bool {
        self.inh.is_set_high()
    }

    fn set_muted(&mut self, muted: bool) {
        self.inh.set_state(muted);
    }

    fn toggle_mute(&mut self) {
        self.inh.toggle();
    }
}
