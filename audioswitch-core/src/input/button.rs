//! Push-button gesture classifier
//!
//! Turns a sampled digital level into click, double-click and hold gestures.
//! The caller samples the pin and supplies a monotonic millisecond clock; the
//! classifier itself never touches hardware.
//!
//! ```text
//!        ┌──debounce──┐                 ┌─double-click window─┐
//! raw ___/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\_______________________________
//!                     ^ pressed        ^ release              ^ clicked
//! ```
//!
//! Only the press edge is debounced. A release is accepted on the first low
//! sample after the press was confirmed.

/// Gesture timing thresholds in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonTiming {
    /// Time the signal must stay asserted before a press is confirmed
    pub debounce_ms: u32,
    /// Window after a release in which a second release is a double-click
    pub double_click_ms: u32,
    /// Press duration after which the gesture is a hold
    pub hold_ms: u32,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            double_click_ms: 400,
            hold_ms: 1000,
        }
    }
}

/// Button gesture state machine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Button {
    timing: ButtonTiming,
    pressed: bool,
    held: bool,
    clicked: bool,
    double_clicked: bool,
    /// Start of a pending press confirmation
    debounce_since: Option<u32>,
    /// Start of a confirmed press that may still become a hold
    hold_since: Option<u32>,
    /// Time of the release that opened the double-click window
    window_since: Option<u32>,
}

impl Button {
    /// Create a classifier seeded with the current raw level
    pub fn new(raw: bool, now_ms: u32) -> Self {
        Self::with_timing(ButtonTiming::default(), raw, now_ms)
    }

    pub fn with_timing(timing: ButtonTiming, raw: bool, now_ms: u32) -> Self {
        Self {
            timing,
            pressed: false,
            held: false,
            clicked: false,
            double_clicked: false,
            debounce_since: raw.then_some(now_ms),
            hold_since: None,
            window_since: None,
        }
    }

    pub fn timing(&self) -> ButtonTiming {
        self.timing
    }

    /// Advance the state machine by one sample
    pub fn update(&mut self, raw: bool, now_ms: u32) {
        let elapsed = |since: u32| now_ms.wrapping_sub(since);

        if raw {
            if self
                .debounce_since
                .is_some_and(|s| elapsed(s) >= self.timing.debounce_ms)
            {
                self.debounce_since = None;
                self.pressed = true;
                self.hold_since = Some(now_ms);
            } else if !self.pressed && self.debounce_since.is_none() {
                self.debounce_since = Some(now_ms);
            } else if self
                .hold_since
                .is_some_and(|s| elapsed(s) >= self.timing.hold_ms)
            {
                self.hold_since = None;
                self.held = true;
            }
            return;
        }

        if self.pressed {
            self.pressed = false;
            match self.window_since {
                Some(since) if elapsed(since) <= self.timing.double_click_ms => {
                    self.double_clicked = true;
                    self.window_since = None;
                    self.hold_since = None;
                    self.held = false;
                }
                // Stale window: resolved as a click below
                Some(_) => {}
                None => self.window_since = Some(now_ms),
            }
        }

        if self
            .window_since
            .is_some_and(|s| elapsed(s) > self.timing.double_click_ms)
        {
            if !self.held {
                self.clicked = true;
            }
            self.window_since = None;
            self.hold_since = None;
            self.held = false;
        }
    }

    /// Debounced press state
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Whether a single click fired since the last call
    pub fn take_clicked(&mut self) -> bool {
        core::mem::take(&mut self.clicked)
    }

    /// Whether a double-click fired since the last call
    pub fn take_double_clicked(&mut self) -> bool {
        core::mem::take(&mut self.double_clicked)
    }

    /// Whether the current gesture is a hold
    ///
    /// Level, not edge: stays true until the gesture resolves.
    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the button with a level from `from` to `to` (exclusive) in 10 ms steps
    fn drive(button: &mut Button, raw: bool, from: u32, to: u32) {
        let mut t = from;
        while t < to {
            button.update(raw, t);
            t += 10;
        }
    }

    fn click_at(button: &mut Button, start: u32) -> u32 {
        drive(button, true, start, start + 100);
        drive(button, false, start + 100, start + 110);
        start + 110
    }

    #[test]
    fn test_press_needs_debounce() {
        let mut button = Button::new(false, 0);
        button.update(true, 0);
        button.update(true, 40);
        assert!(!button.is_pressed());
        button.update(true, 50);
        assert!(button.is_pressed());
    }

    #[test]
    fn test_seeded_with_asserted_signal() {
        let mut button = Button::new(true, 1000);
        button.update(true, 1050);
        assert!(button.is_pressed());
    }

    #[test]
    fn test_single_click() {
        let mut button = Button::new(false, 0);
        let t = click_at(&mut button, 0);
        assert!(!button.take_clicked(), "click fires only after the window");

        drive(&mut button, false, t, t + 400);
        assert!(!button.take_clicked());
        button.update(false, t + 400);

        assert!(button.take_clicked());
        assert!(!button.take_clicked());
        assert!(!button.take_double_clicked());
    }

    #[test]
    fn test_double_click() {
        let mut button = Button::new(false, 0);
        let t = click_at(&mut button, 0);
        let t = click_at(&mut button, t + 50);
        assert!(button.take_double_clicked());
        assert!(!button.take_double_clicked());

        drive(&mut button, false, t, t + 1000);
        assert!(!button.take_clicked());
    }

    #[test]
    fn test_second_click_too_late_is_two_clicks() {
        let mut button = Button::new(false, 0);
        let t = click_at(&mut button, 0);
        drive(&mut button, false, t, t + 500);
        assert!(button.take_clicked());

        let t = click_at(&mut button, t + 500);
        drive(&mut button, false, t, t + 500);
        assert!(button.take_clicked());
        assert!(!button.take_double_clicked());
    }

    #[test]
    fn test_hold_suppresses_click() {
        let mut button = Button::new(false, 0);
        drive(&mut button, true, 0, 1100);
        assert!(button.is_held());
        assert!(button.is_pressed());

        drive(&mut button, false, 1100, 1200);
        assert!(button.is_held(), "hold persists until the gesture resolves");

        drive(&mut button, false, 1200, 2000);
        assert!(!button.is_held());
        assert!(!button.take_clicked());
        assert!(!button.take_double_clicked());
    }

    #[test]
    fn test_bounce_during_debounce_keeps_timer() {
        // A low sample before confirmation does not restart the debounce timer
        let mut button = Button::new(false, 0);
        button.update(true, 0);
        button.update(false, 20);
        button.update(true, 50);
        assert!(button.is_pressed());
    }

    #[test]
    fn test_release_is_not_debounced() {
        let mut button = Button::new(false, 0);
        drive(&mut button, true, 0, 100);
        assert!(button.is_pressed());
        button.update(false, 100);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_clock_wraparound() {
        let start = u32::MAX - 30;
        let mut button = Button::new(false, start);
        button.update(true, start);
        button.update(true, start.wrapping_add(60));
        assert!(button.is_pressed());

        let release = start.wrapping_add(100);
        button.update(false, release);
        button.update(false, release.wrapping_add(401));
        assert!(button.take_clicked());
    }

    #[test]
    fn test_custom_timing() {
        let timing = ButtonTiming {
            debounce_ms: 10,
            double_click_ms: 200,
            hold_ms: 300,
        };
        let mut button = Button::with_timing(timing, false, 0);
        button.update(true, 0);
        button.update(true, 10);
        assert!(button.is_pressed());
        button.update(true, 310);
        assert!(button.is_held());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A press confirms once per assertion, however long it is held
        #[test]
        fn press_confirms_once(hold in 50u32..3000) {
            let mut button = Button::new(false, 0);
            let mut rising_edges = 0;
            let mut was_pressed = false;
            let mut t = 0;
            while t <= hold {
                button.update(true, t);
                if button.is_pressed() && !was_pressed {
                    rising_edges += 1;
                }
                was_pressed = button.is_pressed();
                t += 10;
            }
            prop_assert_eq!(rising_edges, 1);
        }

        /// Two short presses inside the window are one double-click and no click
        #[test]
        fn double_click_within_window(
            first in 60u32..200,
            gap in 0u32..150,
            second in 60u32..150,
        ) {
            let mut button = Button::new(false, 0);
            let mut t = 0;
            let mut doubles = 0;
            let mut clicks = 0;
            let mut step = |button: &mut Button, raw: bool, t: u32| {
                button.update(raw, t);
                if button.take_double_clicked() { doubles += 1; }
                if button.take_clicked() { clicks += 1; }
            };
            while t < first { step(&mut button, true, t); t += 10; }
            let gap_end = t + gap + 10;
            while t < gap_end { step(&mut button, false, t); t += 10; }
            let second_end = t + second;
            while t < second_end { step(&mut button, true, t); t += 10; }
            let settle = t + 1000;
            while t < settle { step(&mut button, false, t); t += 10; }

            prop_assert_eq!(doubles, 1);
            prop_assert_eq!(clicks, 0);
        }

        /// A press of at least the hold threshold never produces a click
        #[test]
        fn hold_never_clicks(hold in 1060u32..4000) {
            let mut button = Button::new(false, 0);
            let mut t = 0;
            let mut saw_held = false;
            while t < hold {
                button.update(true, t);
                saw_held |= button.is_held();
                t += 10;
            }
            let settle = t + 1000;
            while t < settle {
                button.update(false, t);
                t += 10;
            }
            prop_assert!(saw_held);
            prop_assert!(!button.take_clicked());
            prop_assert!(!button.take_double_clicked());
        }
    }
}
