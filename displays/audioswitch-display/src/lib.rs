//! Display abstraction and status screen for Audioswitch
//!
//! This crate provides:
//! - `GraphicsDisplayBackend` trait for pixel displays (OLED, LCD)
//! - `FrameBuffer`, a page-organized monochrome buffer (SSD1306 layout)
//!   usable as an embedded-graphics `DrawTarget`
//! - `StatusPanel`, the status screen layout, which implements the core
//!   `StatusDisplay` collaborator on top of any backend
//!
//! # Layout (128x32)
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │L  [██████████          ]  64           │
//! │R  [██████████  MUTE    ]  64           │
//! │WiFi: OK                   LINE 2       │
//! └────────────────────────────────────────┘
//! ```

#![no_std]

pub mod backend;
pub mod framebuffer;
pub mod status;

pub use backend::{DisplayError, GraphicsDisplayBackend};
pub use framebuffer::FrameBuffer;
pub use status::StatusPanel;
