//! Configuration types
//!
//! Device configuration is authored as TOML (`device.toml`), embedded in the
//! firmware image and parsed at boot.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
