//! Observable device state
//!
//! The state tree is the single source for everything published to the
//! control plane and drawn on the status screen. Writes that change a value
//! mark the tree dirty; the control loop reacts to a dirty tree once per
//! cycle and then cleans it.

pub mod device;
pub mod tree;

pub use device::{default_state, keys, on_off, DeviceStatus, NetworkStatus};
pub use tree::{Entry, NodeId, StateTree, StoreError, Subtree, SubtreeMut, Value, MAX_NODES};
