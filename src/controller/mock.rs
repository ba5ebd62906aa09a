//! In-memory backend for tests

use std::collections::BTreeMap;
use tokio::sync::mpsc;

use super::backend::{BackendError, BackendEvent, DeviceId, DeviceInfo, GamepadBackend};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetMappingHint(String),
    Start,
    Stop,
    OpenInput(DeviceId),
    CloseInput(DeviceId),
    OpenHaptic(DeviceId),
    CloseHaptic(DeviceId),
    PlayRumble(DeviceId, f32),
    StopRumble(DeviceId),
    RegisterWatcher,
    UnregisterWatcher,
}

#[derive(Debug)]
pub struct MockInput(pub DeviceId);

#[derive(Debug)]
pub struct MockHaptic(pub DeviceId);

#[derive(Debug, Default)]
pub struct MockBackend {
    pub devices: BTreeMap<DeviceId, DeviceInfo>,
    pub calls: Vec<Call>,
    pub fail_start: bool,
    pub fail_open: bool,
    pub fail_play: bool,
    pub running: bool,
    pub watcher: Option<mpsc::Sender<BackendEvent>>,
    pub queued: Vec<BackendEvent>,
}

pub fn gamepad(id: u32) -> DeviceInfo {
    DeviceInfo {
        id: DeviceId(id),
        name: format!("Test Pad {}", id),
        button_count: 15,
        axis_count: 6,
        has_haptics: true,
    }
}

impl MockBackend {
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceInfo>) -> Self {
        let mut backend = Self::default();
        for info in devices {
            backend.connect(info);
        }
        backend
    }

    pub fn connect(&mut self, info: DeviceInfo) {
        self.devices.insert(info.id, info);
    }

    pub fn disconnect(&mut self, id: DeviceId) {
        self.devices.remove(&id);
    }

    /// Queue a notification for delivery on the next pump
    pub fn push(&mut self, event: BackendEvent) {
        self.queued.push(event);
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn count_matching(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }
}

impl GamepadBackend for MockBackend {
    type Input = MockInput;
    type Haptic = MockHaptic;

    fn set_mapping_hint(&mut self, mapping: &str) {
        self.calls.push(Call::SetMappingHint(mapping.to_string()));
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.calls.push(Call::Start);
        if self.fail_start {
            return Err(BackendError::StartError("mock refused".to_string()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
        self.running = false;
    }

    fn enumerate_devices(&self) -> Vec<DeviceId> {
        self.devices.keys().copied().collect()
    }

    fn describe(&self, device: DeviceId) -> Option<DeviceInfo> {
        self.devices.get(&device).cloned()
    }

    fn open_input(&mut self, device: DeviceId) -> Result<MockInput, BackendError> {
        if self.fail_open || !self.devices.contains_key(&device) {
            return Err(BackendError::OpenError(device, "mock refused".to_string()));
        }
        self.calls.push(Call::OpenInput(device));
        Ok(MockInput(device))
    }

    fn close_input(&mut self, input: MockInput) {
        self.calls.push(Call::CloseInput(input.0));
    }

    fn open_haptic(&mut self, input: &MockInput) -> Result<MockHaptic, BackendError> {
        let supported = self
            .devices
            .get(&input.0)
            .map(|info| info.has_haptics)
            .unwrap_or(false);
        if !supported {
            return Err(BackendError::HapticUnavailable(input.0));
        }
        self.calls.push(Call::OpenHaptic(input.0));
        Ok(MockHaptic(input.0))
    }

    fn close_haptic(&mut self, haptic: MockHaptic) {
        self.calls.push(Call::CloseHaptic(haptic.0));
    }

    fn play_rumble(&mut self, haptic: &mut MockHaptic, strength: f32) -> Result<(), BackendError> {
        self.calls.push(Call::PlayRumble(haptic.0, strength));
        if self.fail_play {
            return Err(BackendError::RumbleError("mock refused".to_string()));
        }
        Ok(())
    }

    fn stop_rumble(&mut self, haptic: &mut MockHaptic) -> Result<(), BackendError> {
        self.calls.push(Call::StopRumble(haptic.0));
        Ok(())
    }

    fn register_watcher(&mut self, watcher: mpsc::Sender<BackendEvent>) {
        self.calls.push(Call::RegisterWatcher);
        self.watcher = Some(watcher);
    }

    fn unregister_watcher(&mut self) {
        self.calls.push(Call::UnregisterWatcher);
        self.watcher = None;
    }

    fn pump(&mut self) {
        let Some(watcher) = self.watcher.as_ref() else {
            return;
        };
        // Like a platform queue, whatever does not fit waits for the next pump
        let fits = watcher.capacity().min(self.queued.len());
        for event in self.queued.drain(..fits) {
            let _ = watcher.try_send(event);
        }
    }
}
