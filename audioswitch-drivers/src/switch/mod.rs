//! Source switches

pub mod cd4052;

pub use cd4052::{Cd4052, CHANNELS};
