//! Page-organized monochrome frame buffer
//!
//! Each byte covers eight vertical pixels of one column, least significant
//! bit on top, which is the GDDRAM layout of SSD1306/SH1106 controllers.
//! A page can be sent to the controller as-is.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::backend::{DisplayError, GraphicsDisplayBackend};

/// Display width in pixels
pub const WIDTH: usize = 128;

/// Frame buffer `WIDTH` pixels wide and `PAGES * 8` pixels high
pub struct FrameBuffer<const PAGES: usize> {
    pages: [[u8; WIDTH]; PAGES],
}

impl<const PAGES: usize> Default for FrameBuffer<PAGES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PAGES: usize> FrameBuffer<PAGES> {
    pub const HEIGHT: usize = PAGES * 8;

    pub const fn new() -> Self {
        Self {
            pages: [[0; WIDTH]; PAGES],
        }
    }

    /// Raw page data, top page first
    pub fn pages(&self) -> &[[u8; WIDTH]; PAGES] {
        &self.pages
    }

    /// Set one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= Self::HEIGHT {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let bit = 1u8 << (y % 8);
        if on {
            self.pages[y / 8][x] |= bit;
        } else {
            self.pages[y / 8][x] &= !bit;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < Self::HEIGHT && self.pages[y / 8][x] & (1 << (y % 8)) != 0
    }

    fn rectangle(x: u16, y: u16, width: u16, height: u16) -> Rectangle {
        Rectangle::new(
            Point::new(i32::from(x), i32::from(y)),
            Size::new(u32::from(width), u32::from(height)),
        )
    }
}

impl<const PAGES: usize> OriginDimensions for FrameBuffer<PAGES> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, Self::HEIGHT as u32)
    }
}

impl<const PAGES: usize> DrawTarget for FrameBuffer<PAGES> {
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

/// Drawing only; `flush` is a no-op since there is no device behind it
impl<const PAGES: usize> GraphicsDisplayBackend for FrameBuffer<PAGES> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        for page in self.pages.iter_mut() {
            page.fill(0);
        }
        Ok(())
    }

    fn draw_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        on: bool,
    ) -> Result<(), DisplayError> {
        Self::rectangle(x, y, width, height)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::from(on), 1))
            .draw(self)
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        on: bool,
    ) -> Result<(), DisplayError> {
        Self::rectangle(x, y, width, height)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::from(on)))
            .draw(self)
    }

    fn draw_text(&mut self, x: u16, y: u16, text: &str) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, Point::new(i32::from(x), i32::from(y)), style, Baseline::Top)
            .draw(self)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusPanel;
    use audioswitch_core::state::{default_state, keys};
    use audioswitch_core::traits::StatusDisplay;

    type Oled = FrameBuffer<4>;

    fn lit(fb: &Oled) -> usize {
        (0..Oled::HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y))
            .count()
    }

    #[test]
    fn test_page_layout() {
        let mut fb = Oled::new();
        fb.set_pixel(3, 0, true);
        fb.set_pixel(3, 9, true);
        assert_eq!(fb.pages()[0][3], 0b0000_0001);
        assert_eq!(fb.pages()[1][3], 0b0000_0010);

        fb.set_pixel(3, 0, false);
        assert_eq!(fb.pages()[0][3], 0);
    }

    #[test]
    fn test_out_of_range_is_clipped() {
        let mut fb = Oled::new();
        fb.set_pixel(-1, 0, true);
        fb.set_pixel(128, 0, true);
        fb.set_pixel(0, 32, true);
        assert_eq!(lit(&fb), 0);
        assert!(!fb.pixel(500, 500));
    }

    #[test]
    fn test_rect_outline_and_fill() {
        let mut fb = Oled::new();
        fb.draw_rect(10, 0, 92, 8, true).unwrap();
        assert!(fb.pixel(10, 0));
        assert!(fb.pixel(101, 7));
        assert!(!fb.pixel(11, 1));
        assert!(!fb.pixel(102, 0));

        fb.fill_rect(12, 2, 44, 4, true).unwrap();
        assert_eq!(lit(&fb), 2 * 92 + 2 * 6 + 44 * 4);

        fb.fill_rect(0, 0, 128, 32, false).unwrap();
        assert_eq!(lit(&fb), 0);
    }

    #[test]
    fn test_text_draws_glyphs() {
        let mut fb = Oled::new();
        fb.draw_text(0, 20, "WiFi").unwrap();
        assert!(lit(&fb) > 0);
        // Nothing above the text box
        assert!((0..20).all(|y| (0..WIDTH).all(|x| !fb.pixel(x, y))));
        GraphicsDisplayBackend::clear(&mut fb).unwrap();
        assert_eq!(lit(&fb), 0);
    }

    #[test]
    fn test_status_panel_on_frame_buffer() {
        let mut tree = default_state("LINE 1").unwrap();
        tree.set(keys::LEFT, 128).unwrap();
        tree.set_text(keys::MUTED, "ON").unwrap();

        let mut panel = StatusPanel::new(Oled::new(), 128);
        panel.render(&tree).unwrap();
        let fb = panel.into_inner();

        // Bars either side of the badge: left full, right empty
        let beside_badge = || (12..38).chain(76..100);
        assert!(beside_badge().all(|x| fb.pixel(x, 3)));
        assert!(beside_badge().all(|x| !fb.pixel(x, 13)));
        // Badge border is lit, gap around it is dark
        assert!(fb.pixel(39, 3));
        assert!(!fb.pixel(38, 2));
    }
}
