//! Quadrature rotary encoder
//!
//! Decodes the two encoder phases into detent steps and keeps a bounded
//! logical position. Both inputs idle high (pulled up).

use audioswitch_core::traits::RotaryControl;
use audioswitch_hal::InputPin;

/// One detent of rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Clockwise,
    CounterClockwise,
}

/// Decoder state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature state machine
///
/// ```text
/// CW:  Idle (1,1) -> CwStep1 (0,1) -> CwStep2 (0,0) -> step on (1,x)/(x,1)
/// CCW: Idle (1,1) -> CcwStep1 (1,0) -> CcwStep2 (0,0) -> step on (1,x)/(x,1)
/// ```
///
/// Returning to (1,1) before both phases are low is treated as bounce.
#[derive(Debug, Clone, Copy)]
pub struct QuadratureDecoder {
    state: State,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Feed the current phase levels
    pub fn decode(&mut self, a: bool, b: bool) -> Option<Step> {
        match self.state {
            State::Idle => {
                if !a && b {
                    // A fell first
                    self.state = State::CwStep1;
                } else if a && !b {
                    // B fell first
                    self.state = State::CcwStep1;
                }
                None
            }
            State::CwStep1 => {
                if !a && !b {
                    self.state = State::CwStep2;
                } else if a && b {
                    self.state = State::Idle;
                }
                None
            }
            State::CwStep2 => {
                if a || b {
                    self.state = State::Idle;
                    return Some(Step::Clockwise);
                }
                None
            }
            State::CcwStep1 => {
                if !a && !b {
                    self.state = State::CcwStep2;
                } else if a && b {
                    self.state = State::Idle;
                }
                None
            }
            State::CcwStep2 => {
                if a || b {
                    self.state = State::Idle;
                    return Some(Step::CounterClockwise);
                }
                None
            }
        }
    }
}

/// Encoder on two input pins
pub struct Encoder<A, B> {
    a: A,
    b: B,
    decoder: QuadratureDecoder,
    last_a: bool,
    last_b: bool,
}

impl<A: InputPin, B: InputPin> Encoder<A, B> {
    pub fn new(a: A, b: B) -> Self {
        let last_a = a.is_high();
        let last_b = b.is_high();
        Self {
            a,
            b,
            decoder: QuadratureDecoder::new(),
            last_a,
            last_b,
        }
    }

    /// Sample both phases
    ///
    /// Should be called every 1-5ms.
    pub fn poll(&mut self) -> Option<Step> {
        let a = self.a.is_high();
        let b = self.b.is_high();

        if a == self.last_a && b == self.last_b {
            return None;
        }

        self.last_a = a;
        self.last_b = b;
        self.decoder.decode(a, b)
    }
}

/// Logical position moved by encoder steps, clamped to `0..=max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundedRotary {
    value: u16,
    max: u16,
    step: u16,
}

impl BoundedRotary {
    pub const fn new(value: u16, max: u16, step: u16) -> Self {
        let value = if value > max { max } else { value };
        Self { value, max, step }
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    /// Apply one detent
    pub fn apply(&mut self, step: Step) {
        self.value = match step {
            Step::Clockwise => self.value.saturating_add(self.step).min(self.max),
            Step::CounterClockwise => self.value.saturating_sub(self.step),
        };
    }
}

impl RotaryControl for BoundedRotary {
    fn value(&self) -> u16 {
        self.value
    }

    fn set_value(&mut self, value: u16) {
        self.value = value.min(self.max);
    }
}
