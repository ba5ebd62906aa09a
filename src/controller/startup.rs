use statum::{machine, state};
use tracing::{debug, info, warn};

use super::backend::{BackendError, DeviceId, DeviceInfo, GamepadBackend};

// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Joystick support disabled at startup")]
    Disabled,

    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),
}

/// Devices found right after the backend came up
#[derive(Debug, Default)]
pub struct ScanReport {
    pub supported: Vec<DeviceId>,
    pub unsupported: Vec<DeviceInfo>,
}

// The mapping hint has to reach the backend before it starts, scanning only after
#[state]
#[derive(Debug, Clone)]
pub enum StartupState {
    Configuring,
    Running,
}

#[machine]
#[derive(Debug)]
pub struct BackendStartup<S: StartupState> {
    mapping: String,
    disabled: bool,
}

impl BackendStartup<Configuring> {
    pub fn create(mapping: &str, disabled: bool) -> Self {
        debug!(
            "Preparing backend startup (mapping: {} bytes, disabled: {})",
            mapping.len(),
            disabled
        );
        Self::new(mapping.to_string(), disabled)
    }

    pub fn apply_mapping_hint<B: GamepadBackend>(self, backend: &mut B) -> Self {
        if !self.disabled && !self.mapping.is_empty() {
            debug!("Passing controller mapping to backend ('{}')", self.mapping);
            backend.set_mapping_hint(&self.mapping);
        }
        self
    }

    pub fn start<B: GamepadBackend>(
        self,
        backend: &mut B,
    ) -> Result<BackendStartup<Running>, StartupError> {
        if self.disabled {
            info!("Joystick support disabled at startup, backend not opened");
            return Err(StartupError::Disabled);
        }

        backend.start()?;
        info!("Gamepad backend started");
        Ok(self.transition())
    }
}

impl BackendStartup<Running> {
    /// Split connected devices into gamepads and everything else
    pub fn scan<B: GamepadBackend>(&self, backend: &B) -> ScanReport {
        let mut report = ScanReport::default();
        for id in backend.enumerate_devices() {
            match backend.describe(id) {
                Some(info) if info.supports_gamepad_profile() => report.supported.push(id),
                Some(info) => report.unsupported.push(info),
                None => warn!("Device {} vanished during scan", id),
            }
        }
        debug!(
            "Scan found {} supported and {} unsupported devices",
            report.supported.len(),
            report.unsupported.len()
        );
        report
    }
}
