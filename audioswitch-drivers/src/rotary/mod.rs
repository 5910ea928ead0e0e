//! Rotary encoders

pub mod quadrature;

pub use quadrature::{BoundedRotary, Encoder, QuadratureDecoder, Step};
