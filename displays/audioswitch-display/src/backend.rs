//! Display backend trait
//!
//! Defines the interface for pixel displays.

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Display not initialized
    NotInitialized,
}

/// Monochrome graphics backend
///
/// Drawing goes to a frame buffer; nothing is visible until `flush`.
/// Shapes that fall partly outside the display are clipped.
pub trait GraphicsDisplayBackend {
    /// Clear the frame buffer
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw a rectangle outline
    fn draw_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        on: bool,
    ) -> Result<(), DisplayError>;

    /// Fill a rectangle
    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        on: bool,
    ) -> Result<(), DisplayError>;

    /// Draw text with its top-left corner at (x, y)
    fn draw_text(&mut self, x: u16, y: u16, text: &str) -> Result<(), DisplayError>;

    /// Send the frame buffer to the display
    fn flush(&mut self) -> Result<(), DisplayError>;
}
