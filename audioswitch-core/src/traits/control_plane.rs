//! Remote control-plane trait
//!
//! The control plane is a publish/subscribe broker reached over a network
//! link. Implementations report link state rather than blocking on it, so
//! a missing network never stalls the control loop.

use audioswitch_protocol::{Incoming, LinkState, SessionParams, WifiCredentials};

pub trait ControlPlane {
    /// Transport error
    type Error;

    /// Current network link state
    fn link(&self) -> LinkState;

    /// Ask the network interface to join
    fn start_link(&mut self, credentials: &WifiCredentials<'_>) -> Result<(), Self::Error>;

    /// Connect to the broker with a last-will message
    fn open_session(&mut self, params: &SessionParams<'_>) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Take the next pending inbound message, if any
    fn poll_incoming(&mut self) -> Option<Incoming>;
}
