//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod control;
pub mod encoder;
pub mod uplink_rx;
pub mod uplink_tx;

pub use control::{control_task, ControlDevices};
pub use encoder::encoder_task;
pub use uplink_rx::uplink_rx_task;
pub use uplink_tx::uplink_tx_task;
