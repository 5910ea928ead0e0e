//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in audioswitch-core for the front panel and audio path:
//!
//! - Attenuator (MCP413X/415X/423X/425X dual digital potentiometer, SPI)
//! - Source switch (CD4052B dual 4:1 analog multiplexer, GPIO)
//! - Rotary encoder (quadrature decoder with bounded position)

#![no_std]
#![deny(unsafe_code)]

pub mod attenuator;
pub mod rotary;
pub mod switch;
