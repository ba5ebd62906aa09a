//! Input subsystem instance
//!
//! [`InputSystem`] owns the backend, the active-device slot, the analog buffers and
//! the trigger counters. Lifecycle, translation and rumble are implemented on it in
//! their own modules. Everything runs on the thread that calls [`InputSystem::pump`].

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

use super::analog::{AnalogBuffers, AnalogState, TriggerButtons};
use super::backend::{BackendEvent, DeviceId, GamepadBackend};
use super::codes::{AnalogCode, ButtonCode};
use super::device::{ActiveDevice, DeviceSlot};
use crate::config::JoystickSettings;

/// Capacity of the backend notification channel
pub const NOTIFICATION_CAPACITY: usize = 256;

/// Notifications handled per [`InputSystem::pump`], the rest wait for the next one
pub const MAX_EVENTS_PER_PUMP: usize = 100;

// Normalized event published to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    ButtonPressed(ButtonCode),
    ButtonReleased(ButtonCode),
    AnalogValueChanged {
        code: AnalogCode,
        value: i32,
        delta: i32,
    },
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub timestamp: DateTime<Local>,
}

/// Flags the host reads to know whether a gamepad is usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostFlags {
    pub gamepad_present: bool,
    pub joystick_input_enabled: bool,
}

pub struct InputSystem<B: GamepadBackend> {
    pub(super) backend: B,
    pub(super) settings: JoystickSettings,
    pub(super) initialized: bool,
    pub(super) slot: DeviceSlot<B::Input, B::Haptic>,
    pub(super) analog: AnalogBuffers,
    pub(super) triggers: TriggerButtons,
    pub(super) notifications: Option<mpsc::Receiver<BackendEvent>>,
    events: mpsc::Sender<InputEvent>,
    flags: watch::Sender<HostFlags>,
    settings_out: watch::Sender<JoystickSettings>,
}

impl<B: GamepadBackend> InputSystem<B> {
    /// Create an uninitialized subsystem publishing into `events`
    pub fn new(backend: B, settings: JoystickSettings, events: mpsc::Sender<InputEvent>) -> Self {
        debug!("Creating input system with settings: {:?}", settings);
        let (flags, _) = watch::channel(HostFlags::default());
        let (settings_out, _) = watch::channel(settings.clone());
        Self {
            backend,
            settings,
            initialized: false,
            slot: DeviceSlot::Empty,
            analog: AnalogBuffers::default(),
            triggers: TriggerButtons::default(),
            notifications: None,
            events,
            flags,
            settings_out,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn settings(&self) -> &JoystickSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn active_device(&self) -> Option<&ActiveDevice<B::Input, B::Haptic>> {
        self.slot.device()
    }

    pub fn active_device_id(&self) -> Option<DeviceId> {
        self.slot.active_id()
    }

    pub fn host_flags(&self) -> HostFlags {
        *self.flags.borrow()
    }

    pub fn subscribe_flags(&self) -> watch::Receiver<HostFlags> {
        self.flags.subscribe()
    }

    /// Settings as the subsystem itself rewrites them, for the host to persist
    pub fn subscribe_settings(&self) -> watch::Receiver<JoystickSettings> {
        self.settings_out.subscribe()
    }

    /// Analog state published at the last sampling boundary
    pub fn analog_current(&self) -> &AnalogState {
        self.analog.current()
    }

    /// Analog state being written by notifications
    pub fn analog_pending(&self) -> &AnalogState {
        self.analog.write()
    }

    /// Sampling boundary: publish what notifications wrote since the last swap
    pub fn swap_analog_buffers(&mut self) {
        self.analog.swap();
    }

    /// Pump the backend and handle queued notifications in order
    pub fn pump(&mut self) {
        if !self.initialized {
            return;
        }
        self.backend.pump();

        let mut batch = Vec::new();
        if let Some(rx) = self.notifications.as_mut() {
            while batch.len() < MAX_EVENTS_PER_PUMP {
                match rx.try_recv() {
                    Ok(event) => batch.push(event),
                    Err(_) => break,
                }
            }
        }

        for event in batch {
            self.handle_notification(event);
        }
    }

    pub fn handle_notification(&mut self, event: BackendEvent) {
        trace!("Backend notification: {:?}", event);
        match event {
            BackendEvent::DeviceAdded(id) => self.add(id),
            BackendEvent::DeviceRemoved(id) => {
                self.remove(id);
                self.search_for_device();
            }
            BackendEvent::ButtonDown { device, button } => self.on_button_down(device, button),
            BackendEvent::ButtonUp { device, button } => self.on_button_up(device, button),
            BackendEvent::AxisMotion {
                device,
                axis,
                value,
            } => self.on_axis_motion(device, axis, value),
        }
    }

    /// React to changed settings
    ///
    /// A new preferred device triggers a rescan. A changed controller mapping restarts
    /// the backend, unless it went from empty to empty.
    pub fn apply_settings(&mut self, next: JoystickSettings) {
        if next == self.settings {
            return;
        }
        info!("Applying joystick settings: {:?}", next);

        let previous = std::mem::replace(&mut self.settings, next);
        self.publish_settings();

        if previous.controller_mapping != self.settings.controller_mapping {
            let had_mapping = !previous.controller_mapping.is_empty();
            let has_mapping = !self.settings.controller_mapping.is_empty();
            if self.initialized && (had_mapping || has_mapping) {
                info!("Controller mapping changed, reinitializing joysticks");
                self.shutdown();
                self.initialize();
                return;
            }
        }

        if previous.preferred_device != self.settings.preferred_device && self.initialized {
            self.search_for_device();
        }
    }

    pub(super) fn emit(&self, kind: InputEventKind) {
        let event = InputEvent {
            kind,
            timestamp: Local::now(),
        };
        match self.events.try_send(event) {
            Ok(_) => trace!("Event sent to host queue: {:?}", kind),
            Err(e) => error!("Failed to send event to host: {}", e),
        }
    }

    pub(super) fn set_flags(&self, gamepad_present: bool, joystick_input_enabled: bool) {
        self.flags.send_replace(HostFlags {
            gamepad_present,
            joystick_input_enabled,
        });
    }

    pub(super) fn publish_settings(&self) {
        self.settings_out.send_replace(self.settings.clone());
    }
}
