//! Status screen

use core::fmt::Write;

use audioswitch_core::state::{DeviceStatus, StateTree};
use audioswitch_core::traits::StatusDisplay;
use heapless::String;

use crate::backend::{DisplayError, GraphicsDisplayBackend};

/// Inner width of a level bar in pixels
pub const BAR_WIDTH: u16 = 88;

/// Column of the numeric level readout
const VALUE_X: u16 = 104;

/// Bottom row baseline
const STATUS_Y: u16 = 20;

/// Status screen on a graphics backend
pub struct StatusPanel<B> {
    backend: B,
    volume_max: u16,
}

impl<B: GraphicsDisplayBackend> StatusPanel<B> {
    pub fn new(backend: B, volume_max: u16) -> Self {
        Self {
            backend,
            volume_max,
        }
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Filled width of a level bar, rounded to the nearest pixel
    pub fn bar_width(&self, level: i32) -> u16 {
        if self.volume_max == 0 {
            return 0;
        }
        let max = u32::from(self.volume_max);
        let level = level.clamp(0, i32::from(self.volume_max)) as u32;
        ((level * u32::from(BAR_WIDTH) + max / 2) / max) as u16
    }

    /// Draw the whole screen and flush it
    pub fn draw(&mut self, status: &DeviceStatus<'_>) -> Result<(), DisplayError> {
        self.backend.clear()?;

        self.level_bar(0, "L", status.left)?;
        self.level_bar(10, "R", status.right)?;

        if status.muted {
            self.backend.fill_rect(40, 4, 34, 10, false)?;
            self.backend.draw_rect(39, 3, 36, 12, true)?;
            self.backend.draw_rect(38, 2, 38, 14, false)?;
            self.backend.draw_text(41, 5, "MUTE")?;
        }

        let mut line: String<24> = String::new();
        // Overlong text is truncated by the backend
        let _ = write!(line, "WiFi: {}", status.network);
        self.backend.draw_text(0, STATUS_Y, &line)?;

        let mut label: String<24> = String::new();
        let _ = write!(label, "{:>6}", status.channel);
        self.backend.draw_text(80, STATUS_Y, &label)?;

        self.backend.flush()
    }

    fn level_bar(&mut self, y: u16, name: &str, level: i32) -> Result<(), DisplayError> {
        self.backend.draw_rect(10, y, BAR_WIDTH + 4, 8, true)?;
        let width = self.bar_width(level);
        if width > 0 {
            self.backend.fill_rect(12, y + 2, width, 4, true)?;
        }
        self.backend.draw_text(0, y, name)?;

        let mut value: String<12> = String::new();
        let _ = write!(value, "{:3}", level);
        self.backend.draw_text(VALUE_X, y, &value)
    }
}

impl<B: GraphicsDisplayBackend> StatusDisplay for StatusPanel<B> {
    type Error = DisplayError;

    fn render(&mut self, state: &StateTree) -> Result<(), DisplayError> {
        self.draw(&DeviceStatus::read(state))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use audioswitch_core::state::{default_state, keys};
    use std::string::ToString;
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Clear,
        Rect(u16, u16, u16, u16, bool),
        Fill(u16, u16, u16, u16, bool),
        Text(u16, u16, std::string::String),
        Flush,
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
        offline: bool,
    }

    impl Recorder {
        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(_, _, text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl GraphicsDisplayBackend for Recorder {
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.ops.push(Op::Clear);
            Ok(())
        }

        fn draw_rect(
            &mut self,
            x: u16,
            y: u16,
            w: u16,
            h: u16,
            on: bool,
        ) -> Result<(), DisplayError> {
            self.ops.push(Op::Rect(x, y, w, h, on));
            Ok(())
        }

        fn fill_rect(
            &mut self,
            x: u16,
            y: u16,
            w: u16,
            h: u16,
            on: bool,
        ) -> Result<(), DisplayError> {
            self.ops.push(Op::Fill(x, y, w, h, on));
            Ok(())
        }

        fn draw_text(&mut self, x: u16, y: u16, text: &str) -> Result<(), DisplayError> {
            self.ops.push(Op::Text(x, y, text.to_string()));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), DisplayError> {
            if self.offline {
                return Err(DisplayError::Communication);
            }
            self.ops.push(Op::Flush);
            Ok(())
        }
    }

    #[test]
    fn test_bar_width_scales_and_clamps() {
        let panel = StatusPanel::new(Recorder::default(), 128);
        assert_eq!(panel.bar_width(0), 0);
        assert_eq!(panel.bar_width(64), 44);
        assert_eq!(panel.bar_width(128), 88);
        assert_eq!(panel.bar_width(1), 1);
        assert_eq!(panel.bar_width(500), 88);
        assert_eq!(panel.bar_width(-3), 0);
    }

    #[test]
    fn test_zero_range_draws_empty_bars() {
        let panel = StatusPanel::new(Recorder::default(), 0);
        assert_eq!(panel.bar_width(10), 0);
    }

    #[test]
    fn test_render_layout() {
        let mut tree = default_state("LINE 2").unwrap();
        tree.set(keys::LEFT, 64).unwrap();
        tree.set(keys::RIGHT, 0).unwrap();
        tree.set_text(keys::NETWORK, "OK").unwrap();

        let mut panel = StatusPanel::new(Recorder::default(), 128);
        panel.render(&tree).unwrap();

        let ops = &panel.backend_mut().ops;
        assert_eq!(ops.first(), Some(&Op::Clear));
        assert_eq!(ops.last(), Some(&Op::Flush));
        assert!(ops.contains(&Op::Rect(10, 0, 92, 8, true)));
        assert!(ops.contains(&Op::Rect(10, 10, 92, 8, true)));
        assert!(ops.contains(&Op::Fill(12, 2, 44, 4, true)));
        // Empty right bar has no fill
        assert!(!ops.iter().any(|op| matches!(op, Op::Fill(12, 12, _, _, _))));
        assert!(ops.contains(&Op::Text(104, 0, " 64".to_string())));
        assert!(ops.contains(&Op::Text(104, 10, "  0".to_string())));
        assert!(ops.contains(&Op::Text(0, 20, "WiFi: OK".to_string())));
        assert!(ops.contains(&Op::Text(80, 20, "LINE 2".to_string())));
        assert!(!panel.backend_mut().texts().contains(&"MUTE"));
    }

    #[test]
    fn test_render_mute_badge() {
        let mut tree = default_state("PHONO").unwrap();
        tree.set_text(keys::MUTED, "ON").unwrap();

        let mut panel = StatusPanel::new(Recorder::default(), 128);
        panel.render(&tree).unwrap();

        let backend = panel.into_inner();
        let badge: Vec<&Op> = backend
            .ops
            .iter()
            .skip_while(|op| **op != Op::Fill(40, 4, 34, 10, false))
            .take(4)
            .collect();
        assert_eq!(
            badge,
            [
                &Op::Fill(40, 4, 34, 10, false),
                &Op::Rect(39, 3, 36, 12, true),
                &Op::Rect(38, 2, 38, 14, false),
                &Op::Text(41, 5, "MUTE".to_string()),
            ]
        );
        assert!(backend.texts().contains(&" PHONO"));
    }

    #[test]
    fn test_render_error_propagates() {
        let tree = default_state("LINE 1").unwrap();
        let mut panel = StatusPanel::new(
            Recorder {
                offline: true,
                ..Recorder::default()
            },
            128,
        );
        assert_eq!(panel.render(&tree), Err(DisplayError::Communication));
    }
}
