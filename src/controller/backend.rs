//! Platform backend seam
//!
//! The subsystem never talks to a device API directly. Everything it needs from the
//! platform goes through [`GamepadBackend`]: enumerate devices, open and close input and
//! haptic handles, play and stop rumble, and deliver notifications into a bounded
//! channel that the subsystem drains on its own thread.

use std::fmt;
use tokio::sync::mpsc;

use super::codes::{RawAxis, RawButton};

/// Backend identifier of a physical controller
///
/// Stable for the lifetime of the connection and never handed to another device
/// while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Whether a configured preferred index names this device
    pub fn matches_index(self, index: i32) -> bool {
        i64::from(index) == i64::from(self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the backend reports about a connected device before it is opened
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub button_count: usize,
    pub axis_count: usize,
    pub has_haptics: bool,
}

impl DeviceInfo {
    /// Digital buttons plus at least both sticks
    pub fn supports_gamepad_profile(&self) -> bool {
        self.button_count > 0 && self.axis_count >= 4
    }
}

/// Notification pushed by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    DeviceAdded(DeviceId),
    DeviceRemoved(DeviceId),
    ButtonDown {
        device: DeviceId,
        button: RawButton,
    },
    ButtonUp {
        device: DeviceId,
        button: RawButton,
    },
    AxisMotion {
        device: DeviceId,
        axis: RawAxis,
        value: i16,
    },
}

// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to start gamepad backend: {0}")]
    StartError(String),

    #[error("Gamepad backend is not running")]
    NotRunning,

    #[error("Device {0} is not connected")]
    DeviceNotFound(DeviceId),

    #[error("Failed to open device {0}: {1}")]
    OpenError(DeviceId, String),

    #[error("Device {0} has no force feedback support")]
    HapticUnavailable(DeviceId),

    #[error("Rumble command failed: {0}")]
    RumbleError(String),
}

/// Capability interface the subsystem consumes from the platform
///
/// Handles are owned values: closing one consumes it, so a handle can not be closed
/// twice.
pub trait GamepadBackend {
    type Input;
    type Haptic;

    /// Controller mapping configuration, only honoured by the next [`start`](Self::start)
    fn set_mapping_hint(&mut self, mapping: &str);

    fn start(&mut self) -> Result<(), BackendError>;

    fn stop(&mut self);

    fn enumerate_devices(&self) -> Vec<DeviceId>;

    fn describe(&self, device: DeviceId) -> Option<DeviceInfo>;

    fn open_input(&mut self, device: DeviceId) -> Result<Self::Input, BackendError>;

    fn close_input(&mut self, input: Self::Input);

    fn open_haptic(&mut self, input: &Self::Input) -> Result<Self::Haptic, BackendError>;

    fn close_haptic(&mut self, haptic: Self::Haptic);

    /// Rumble at `strength` in `[0, 1]` until stopped
    fn play_rumble(&mut self, haptic: &mut Self::Haptic, strength: f32)
        -> Result<(), BackendError>;

    fn stop_rumble(&mut self, haptic: &mut Self::Haptic) -> Result<(), BackendError>;

    /// Route notifications into `watcher` until [`unregister_watcher`](Self::unregister_watcher)
    fn register_watcher(&mut self, watcher: mpsc::Sender<BackendEvent>);

    fn unregister_watcher(&mut self);

    /// Let the backend process pending platform events and push notifications
    fn pump(&mut self);
}
