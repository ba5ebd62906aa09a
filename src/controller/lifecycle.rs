//! Device lifecycle: bring-up, teardown and hotplug handling
//!
//! Only the code in this module opens or closes device handles.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{DeviceId, GamepadBackend};
use super::device::{ActiveDevice, DeviceSlot};
use super::rumble::RumbleState;
use super::selector::{select, RejectReason, Selection};
use super::startup::{BackendStartup, StartupError};
use super::system::{InputSystem, NOTIFICATION_CAPACITY};

impl<B: GamepadBackend> InputSystem<B> {
    /// Start the backend and open the first suitable device
    ///
    /// Calling this while initialized restarts the subsystem. Failures leave it
    /// uninitialized and are only logged.
    pub fn initialize(&mut self) {
        if self.initialized {
            self.shutdown();
        }

        self.slot = DeviceSlot::Empty;
        self.analog.reset();
        self.triggers.reset();
        self.set_flags(false, false);

        let startup = BackendStartup::create(
            &self.settings.controller_mapping,
            self.settings.disable_at_startup,
        )
        .apply_mapping_hint(&mut self.backend);

        let running = match startup.start(&mut self.backend) {
            Ok(running) => running,
            Err(StartupError::Disabled) => return,
            Err(e) => {
                warn!("Joystick init failed: {}", e);
                return;
            }
        };

        self.initialized = true;

        let (tx, rx) = mpsc::channel(NOTIFICATION_CAPACITY);
        self.backend.register_watcher(tx);
        self.notifications = Some(rx);

        let report = running.scan(&self.backend);
        for info in &report.unsupported {
            info!(
                "Found joystick '{}' ({}), but no recognized controller configuration for it",
                info.name, info.id
            );
        }
        for id in report.supported {
            self.add(id);
        }

        if self.slot.active_id().is_none() {
            info!("No supported gamepad connected");
        }
    }

    /// Close the active device and stop the backend; no-op when not initialized
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.backend.unregister_watcher();
        self.notifications = None;

        if let Some(id) = self.slot.active_id() {
            self.remove(id);
        }

        self.backend.stop();
        self.initialized = false;
        info!("Joystick subsystem shut down");
    }

    /// Hotplug add: offer `id` to the selector and open it if accepted
    pub fn add(&mut self, id: DeviceId) {
        let Some(info) = self.backend.describe(id) else {
            warn!("Device {} is not known to the backend", id);
            return;
        };

        match select(&info, self.settings.preferred_device, self.slot.active_id()) {
            Selection::Reject(RejectReason::Unsupported) => {
                warn!(
                    "Joystick {} '{}' is not recognized by the game controller system",
                    id, info.name
                );
                return;
            }
            Selection::Reject(RejectReason::SlotTaken { active }) => {
                info!(
                    "Detected supported joystick {} '{}'. Currently active joystick is {}",
                    id, info.name, active
                );
                return;
            }
            Selection::Reject(RejectReason::NotPreferred { preferred }) => {
                info!(
                    "Detected supported joystick {} '{}'. Configured joystick is #{}",
                    id, info.name, preferred
                );
                return;
            }
            Selection::AlreadyActive => {
                debug!("Joystick {} is already active", id);
                return;
            }
            Selection::Accept {
                replaces: Some(previous),
            } => {
                debug!("Joystick {} already initialized, removing it first", previous);
                self.remove(previous);
            }
            Selection::Accept { replaces: None } => {}
        }

        info!("Initializing joystick {} and making it active", id);

        let input = match self.backend.open_input(id) {
            Ok(input) => input,
            Err(e) => {
                warn!("Failed to open joystick {}: {}", id, e);
                return;
            }
        };

        let haptic = match self.backend.open_haptic(&input) {
            Ok(haptic) => Some(haptic),
            Err(e) => {
                warn!("Unable to initialize rumble for joystick {}: {}", id, e);
                None
            }
        };

        self.slot = DeviceSlot::Open(ActiveDevice {
            id,
            name: info.name,
            input,
            haptic,
            button_count: info.button_count,
            rumble: RumbleState::default(),
        });
        self.analog.reset();
        self.triggers.reset();

        self.set_flags(true, true);

        // Device ids are never reused, so keep auto-selection for the next hotplug.
        self.settings.preferred_device = -1;
        if self.settings.joystick_enabled.is_some() {
            self.settings.joystick_enabled = Some(true);
        }
        self.publish_settings();
    }

    /// Hotplug remove: close the active device if `id` is it
    ///
    /// Stale or repeated notifications are ignored.
    pub fn remove(&mut self, id: DeviceId) {
        if !self.slot.is_active(id) {
            info!(
                "Ignoring hotplug remove for {}, active joystick is {:?}",
                id,
                self.slot.active_id()
            );
            return;
        }
        let Some(mut device) = self.slot.take() else {
            return;
        };

        self.set_flags(false, false);

        if let Some(mut haptic) = device.haptic.take() {
            if device.rumble.is_enabled() {
                if let Err(e) = self.backend.stop_rumble(&mut haptic) {
                    warn!("Failed to stop rumble on {}: {}", id, e);
                }
            }
            self.backend.close_haptic(haptic);
        }
        self.backend.close_input(device.input);

        info!("Joystick {} removed", id);
    }

    /// Offer every connected device to [`add`](Self::add)
    pub fn search_for_device(&mut self) {
        if !self.initialized {
            return;
        }
        for id in self.backend.enumerate_devices() {
            self.add(id);
        }
    }
}
