//! Level attenuators

pub mod mcp4;

pub use mcp4::{Mcp4, Mcp4Error, NetworkControl, TerminalControl};
