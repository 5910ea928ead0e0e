//! Per-cycle reconciliation loop
//!
//! One call to [`Controller::cycle`] runs a complete control cycle:
//!
//! 1. Sample the button and classify the gesture
//! 2. Click toggles mute; double-click advances the input
//! 3. Read the attenuator and switch back into the state tree
//! 4. Reconcile the rotary control with the observed volume
//! 5. Keep the network link and broker session up
//! 6. Publish the state when it changed or the quiet interval ran out
//! 7. Apply pending remote commands
//! 8. Redraw the status screen when the state changed
//! 9. Clean the state tree
//!
//! Peripheral readback is the only way state enters the tree, so local
//! gestures and remote commands both show up through the same path. A remote
//! command applied in step 7 becomes visible on the next cycle.

use alloc::vec::Vec as AllocVec;

use audioswitch_hal::InputPin;
use audioswitch_protocol::discovery::{
    announcements, DeviceInfo, DiscoveryContext, ANNOUNCEMENT_COUNT,
};
use audioswitch_protocol::{
    to_json, CommandError, Incoming, LastWill, LinkState, RemoteCommand, SessionParams,
    TopicTooLong, Topics, WifiCredentials, STATUS_OFFLINE, STATUS_ONLINE,
};
use heapless::Vec;

use crate::config::{DeviceConfig, Label};
use crate::input::Button;
use crate::state::{default_state, keys, on_off, NetworkStatus, StateTree, StoreError};
use crate::traits::{Attenuator, AudioSwitch, ControlPlane, RotaryControl, StatusDisplay, Wiper};

/// Minimum time between network join requests
pub const LINK_RETRY_MS: u32 = 10_000;

/// Inbound messages handled per cycle
pub const MAX_COMMANDS_PER_CYCLE: usize = 8;

/// Events recorded per cycle
pub const MAX_CYCLE_EVENTS: usize = 24;

/// Most control-plane sends in one cycle. The session cycle is the worst
/// case: session, subscribe, the discovery documents, then status and state.
pub const MAX_UPLINK_SENDS_PER_CYCLE: usize = 2 + ANNOUNCEMENT_COUNT + 2;

/// Something notable that happened during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleEvent {
    /// Click toggled the mute line
    MuteToggled { muted: bool },
    /// Double-click advanced the input
    ChannelSelected { channel: u8 },
    /// Rotary turned; both wipers follow it
    RotaryMoved { value: u16 },
    /// Volume changed elsewhere; rotary moved to match
    RotaryResynced { value: u16 },
    /// Network join requested
    LinkRequested,
    /// Network join request could not be sent
    LinkRequestFailed,
    /// Broker session opened and discovery announced
    SessionOpened,
    /// Broker session setup failed, retried next cycle
    SessionFailed,
    /// Link dropped, session will be reopened
    SessionClosed,
    /// State published
    Published,
    /// State publish failed, retried next cycle
    PublishFailed,
    /// Remote command applied to the peripherals
    CommandApplied,
    /// Message on a topic other than the command topic
    CommandIgnored,
    /// Command payload discarded
    CommandMalformed(CommandError),
    /// Command named an input that does not exist
    UnknownChannel(Label),
    /// Status screen redrawn; not reported without a display
    Rendered,
    /// Status screen redraw failed
    RenderFailed,
}

/// Events of one cycle, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    events: Vec<CycleEvent, MAX_CYCLE_EVENTS>,
}

impl CycleReport {
    fn push(&mut self, event: CycleEvent) {
        // Drop on overflow; the report is diagnostic only
        let _ = self.events.push(event);
    }

    pub fn events(&self) -> &[CycleEvent] {
        &self.events
    }

    pub fn contains(&self, event: &CycleEvent) -> bool {
        self.events.contains(event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Fatal cycle error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleError<E> {
    /// Attenuator bus error
    Attenuator(E),
    /// State tree rejected a write
    Store(StoreError),
}

impl<E> From<StoreError> for CycleError<E> {
    fn from(e: StoreError) -> Self {
        CycleError::Store(e)
    }
}

/// Controller construction error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// MQTT prefix too long for a topic
    Topic(TopicTooLong),
    /// Initial state could not be built
    Store(StoreError),
}

/// Hardware and services driven by the controller
pub struct Devices<P, A, S, R, C, D> {
    pub button: P,
    pub attenuator: A,
    pub switch: S,
    pub rotary: R,
    pub uplink: C,
    pub display: D,
}

enum UplinkFailure<E> {
    Transport(#[allow(dead_code)] E),
    Payload,
}

impl<E> From<E> for UplinkFailure<E> {
    fn from(e: E) -> Self {
        UplinkFailure::Transport(e)
    }
}

/// Control loop context
pub struct Controller {
    config: DeviceConfig,
    topics: Topics,
    state: StateTree,
    button: Button,
    /// Rotary position the wipers were last driven from
    last_rotary: u16,
    last_publish: Option<u32>,
    publish_pending: bool,
    session_open: bool,
    link_requested_at: Option<u32>,
}

impl Controller {
    /// Create a controller, seeding the classifier and rotary tracking from
    /// the current hardware
    pub fn new<P: InputPin, R: RotaryControl>(
        config: DeviceConfig,
        button: &P,
        rotary: &R,
        now_ms: u32,
    ) -> Result<Self, SetupError> {
        let topics = Topics::new(&config.mqtt.prefix).map_err(SetupError::Topic)?;
        let first = config.audio.channel_label(0).unwrap_or("");
        let state = default_state(first).map_err(SetupError::Store)?;
        let raw = button.is_high() != config.input.button_active_low;
        let button = Button::with_timing(config.input.timing(), raw, now_ms);

        Ok(Self {
            config,
            topics,
            state,
            button,
            last_rotary: rotary.value(),
            last_publish: None,
            publish_pending: false,
            session_open: false,
            link_requested_at: None,
        })
    }

    pub fn state(&self) -> &StateTree {
        &self.state
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn is_session_open(&self) -> bool {
        self.session_open
    }

    /// Run one control cycle
    ///
    /// The state tree is cleaned on every exit, including errors.
    pub fn cycle<P, A, S, R, C, D>(
        &mut self,
        dev: &mut Devices<P, A, S, R, C, D>,
        now_ms: u32,
    ) -> Result<CycleReport, CycleError<A::Error>>
    where
        P: InputPin,
        A: Attenuator,
        S: AudioSwitch,
        R: RotaryControl,
        C: ControlPlane,
        D: StatusDisplay,
    {
        let mut report = CycleReport::default();
        let result = self.run_steps(dev, now_ms, &mut report);
        self.state.clean();
        result.map(|()| report)
    }

    fn run_steps<P, A, S, R, C, D>(
        &mut self,
        dev: &mut Devices<P, A, S, R, C, D>,
        now_ms: u32,
        report: &mut CycleReport,
    ) -> Result<(), CycleError<A::Error>>
    where
        P: InputPin,
        A: Attenuator,
        S: AudioSwitch,
        R: RotaryControl,
        C: ControlPlane,
        D: StatusDisplay,
    {
        let raw = dev.button.is_high() != self.config.input.button_active_low;
        self.button.update(raw, now_ms);

        if self.button.take_clicked() {
            dev.switch.toggle_mute();
            report.push(CycleEvent::MuteToggled {
                muted: dev.switch.is_muted(),
            });
        }
        if self.button.take_double_clicked() {
            let count = self.config.audio.channels.len() as u8;
            let next = dev.switch.channel() + 1;
            let channel = if next >= count { 0 } else { next };
            dev.switch.select(channel);
            report.push(CycleEvent::ChannelSelected { channel });
        }

        let (left, right) = self.read_back(dev)?;
        self.reconcile_rotary(dev, left, right, report)?;
        self.maintain_link(&mut dev.uplink, now_ms, report)?;

        if self.session_open {
            let due = self.state.is_dirty()
                || self.publish_pending
                || self.last_publish.map_or(true, |t| {
                    now_ms.wrapping_sub(t) >= u32::from(self.config.mqtt.update_interval_s) * 1000
                });
            if due {
                match self.publish_state(&mut dev.uplink) {
                    Ok(()) => {
                        self.last_publish = Some(now_ms);
                        self.publish_pending = false;
                        report.push(CycleEvent::Published);
                    }
                    Err(_) => {
                        self.publish_pending = true;
                        report.push(CycleEvent::PublishFailed);
                    }
                }
            }
        }

        for _ in 0..MAX_COMMANDS_PER_CYCLE {
            let Some(incoming) = dev.uplink.poll_incoming() else {
                break;
            };
            self.apply_command(dev, &incoming, report)?;
        }

        if self.state.is_dirty() && dev.display.is_present() {
            match dev.display.render(&self.state) {
                Ok(()) => report.push(CycleEvent::Rendered),
                Err(_) => report.push(CycleEvent::RenderFailed),
            }
        }
        Ok(())
    }

    /// Mirror the peripherals into the state tree
    fn read_back<P, A, S, R, C, D>(
        &mut self,
        dev: &mut Devices<P, A, S, R, C, D>,
    ) -> Result<(u16, u16), CycleError<A::Error>>
    where
        A: Attenuator,
        S: AudioSwitch,
    {
        let left = dev
            .attenuator
            .level(Wiper::Left)
            .map_err(CycleError::Attenuator)?;
        let right = dev
            .attenuator
            .level(Wiper::Right)
            .map_err(CycleError::Attenuator)?;

        let label = self
            .config
            .audio
            .channel_label(dev.switch.channel())
            .unwrap_or("");

        self.state.set(keys::LEFT, i32::from(left))?;
        self.state.set(keys::RIGHT, i32::from(right))?;
        self.state.set_text(keys::MUTED, on_off(dev.switch.is_muted()))?;
        self.state.set_text(keys::CHANNEL, label)?;
        Ok((left, right))
    }

    /// A turned rotary drives both wipers. Otherwise a volume change that
    /// did not come from the rotary moves the rotary to match it.
    fn reconcile_rotary<P, A, S, R, C, D>(
        &mut self,
        dev: &mut Devices<P, A, S, R, C, D>,
        left: u16,
        right: u16,
        report: &mut CycleReport,
    ) -> Result<(), CycleError<A::Error>>
    where
        A: Attenuator,
        R: RotaryControl,
    {
        let position = dev.rotary.value();

        if position != self.last_rotary {
            let level = position.min(self.config.audio.volume_max);
            for wiper in Wiper::BOTH {
                dev.attenuator
                    .set_level(wiper, level)
                    .map_err(CycleError::Attenuator)?;
            }
            self.state.set(keys::LEFT, i32::from(level))?;
            self.state.set(keys::RIGHT, i32::from(level))?;
            self.last_rotary = position;
            report.push(CycleEvent::RotaryMoved { value: level });
            return Ok(());
        }

        let target = left.max(right);
        if self.state.is_dirty_at(keys::VOLUME)? && position != target {
            dev.rotary.set_value(target);
            self.last_rotary = dev.rotary.value();
            report.push(CycleEvent::RotaryResynced {
                value: self.last_rotary,
            });
        }
        Ok(())
    }

    fn maintain_link<C: ControlPlane>(
        &mut self,
        uplink: &mut C,
        now_ms: u32,
        report: &mut CycleReport,
    ) -> Result<(), StoreError> {
        let link = uplink.link();
        self.state
            .set_text(keys::NETWORK, NetworkStatus::from(link).as_str())?;

        if link != LinkState::Up && self.session_open {
            self.session_open = false;
            report.push(CycleEvent::SessionClosed);
        }

        match link {
            LinkState::Off => {
                let retry_due = self
                    .link_requested_at
                    .map_or(true, |t| now_ms.wrapping_sub(t) >= LINK_RETRY_MS);
                if retry_due {
                    self.link_requested_at = Some(now_ms);
                    let credentials = WifiCredentials {
                        ssid: &self.config.wifi.ssid,
                        password: &self.config.wifi.password,
                    };
                    match uplink.start_link(&credentials) {
                        Ok(()) => report.push(CycleEvent::LinkRequested),
                        Err(_) => report.push(CycleEvent::LinkRequestFailed),
                    }
                }
            }
            LinkState::Joining => {}
            LinkState::Up if !self.session_open => match self.open_session(uplink) {
                Ok(()) => {
                    self.session_open = true;
                    report.push(CycleEvent::SessionOpened);
                }
                Err(_) => report.push(CycleEvent::SessionFailed),
            },
            LinkState::Up => {}
        }
        Ok(())
    }

    /// Connect, subscribe to commands and announce discovery documents
    fn open_session<C: ControlPlane>(&self, uplink: &mut C) -> Result<(), UplinkFailure<C::Error>> {
        let mqtt = &self.config.mqtt;
        uplink.open_session(&SessionParams {
            client_id: &mqtt.client_id,
            broker: &mqtt.broker,
            port: mqtt.port,
            keepalive_s: mqtt.keepalive_s,
            will: LastWill {
                topic: &self.topics.status,
                payload: STATUS_OFFLINE,
                retain: true,
            },
        })?;
        uplink.subscribe(&self.topics.set)?;

        let ctx = DiscoveryContext {
            device: DeviceInfo::new(&mqtt.client_id),
            topics: &self.topics,
            volume_max: self.config.audio.volume_max,
            channels: self
                .config
                .audio
                .channels
                .iter()
                .map(|c| c.as_str())
                .collect::<AllocVec<&str>>(),
        };
        let docs = announcements(&ctx).map_err(|_| UplinkFailure::Payload)?;
        for doc in &docs {
            uplink.publish(&doc.topic, &doc.payload, true)?;
        }
        Ok(())
    }

    fn publish_state<C: ControlPlane>(
        &self,
        uplink: &mut C,
    ) -> Result<(), UplinkFailure<C::Error>> {
        let payload = to_json(&self.state.snapshot()).map_err(|_| UplinkFailure::Payload)?;
        uplink.publish(&self.topics.status, STATUS_ONLINE.as_bytes(), true)?;
        uplink.publish(&self.topics.state, &payload, true)?;
        Ok(())
    }

    fn apply_command<P, A, S, R, C, D>(
        &mut self,
        dev: &mut Devices<P, A, S, R, C, D>,
        incoming: &Incoming,
        report: &mut CycleReport,
    ) -> Result<(), CycleError<A::Error>>
    where
        A: Attenuator,
        S: AudioSwitch,
    {
        if !self.topics.is_command(&incoming.topic) {
            report.push(CycleEvent::CommandIgnored);
            return Ok(());
        }

        let command = match RemoteCommand::parse(&incoming.payload) {
            Ok(command) => command,
            Err(e) => {
                report.push(CycleEvent::CommandMalformed(e));
                return Ok(());
            }
        };

        if command.is_empty() {
            return Ok(());
        }

        let mut applied = false;
        let max = i64::from(self.config.audio.volume_max);
        for (wiper, requested) in [(Wiper::Left, command.left), (Wiper::Right, command.right)] {
            if let Some(level) = requested {
                dev.attenuator
                    .set_level(wiper, level.clamp(0, max) as u16)
                    .map_err(CycleError::Attenuator)?;
                applied = true;
            }
        }
        if let Some(muted) = command.muted {
            dev.switch.set_muted(muted);
            applied = true;
        }
        if let Some(name) = command.channel.as_deref() {
            match self.config.audio.channel_index(name) {
                Some(index) => {
                    dev.switch.select(index);
                    applied = true;
                }
                None => report.push(CycleEvent::UnknownChannel(truncated(name))),
            }
        }

        if applied {
            report.push(CycleEvent::CommandApplied);
        }
        Ok(())
    }
}

/// Longest prefix of `s` that fits a label, on a char boundary
fn truncated(s: &str) -> Label {
    let mut label = Label::new();
    for c in s.chars() {
        if label.push(c).is_err() {
            break;
        }
    }
    label
}
