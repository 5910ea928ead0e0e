//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks:
//!
//! - `INBOX`: inbound broker messages, uplink RX task → control task
//! - `OUTBOX`: frames for the bridge, control task → uplink TX task
//! - `LINK_STATE`: last link state reported by the bridge
//! - `ENCODER`: rotary position, encoder task ↔ control task

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicU8, Ordering};

use audioswitch_core::controller::MAX_UPLINK_SENDS_PER_CYCLE;
use audioswitch_drivers::rotary::BoundedRotary;
use audioswitch_protocol::{Frame, Incoming, LinkState};

/// Inbound messages held between control cycles
const INBOX_SIZE: usize = 4;

/// Outbound frames. A control cycle runs without yielding, so the queue
/// holds everything one cycle can send.
const OUTBOX_SIZE: usize = MAX_UPLINK_SENDS_PER_CYCLE;

/// Messages received on subscribed topics
pub static INBOX: Channel<CriticalSectionRawMutex, Incoming, INBOX_SIZE> = Channel::new();

/// Frames waiting to be written to the bridge
pub static OUTBOX: Channel<CriticalSectionRawMutex, Frame, OUTBOX_SIZE> = Channel::new();

static LINK_STATE: AtomicU8 = AtomicU8::new(0);

/// Rotary position, configured at boot
pub static ENCODER: Mutex<CriticalSectionRawMutex, RefCell<BoundedRotary>> =
    Mutex::new(RefCell::new(BoundedRotary::new(0, 0, 1)));

pub fn link_state() -> LinkState {
    LinkState::from_byte(LINK_STATE.load(Ordering::Acquire)).unwrap_or_default()
}

pub fn set_link_state(state: LinkState) {
    LINK_STATE.store(state.to_byte(), Ordering::Release);
}
