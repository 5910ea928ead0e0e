//! Front-panel input handling

pub mod button;

pub use button::{Button, ButtonTiming};
