use super::backend::DeviceId;
use super::rumble::RumbleState;

/// The open active device and the handles it exclusively owns
#[derive(Debug)]
pub struct ActiveDevice<I, H> {
    pub id: DeviceId,
    pub name: String,
    pub input: I,
    /// Absent when the device has no usable force feedback
    pub haptic: Option<H>,
    pub button_count: usize,
    pub rumble: RumbleState,
}

/// The single active-device slot
#[derive(Debug)]
pub enum DeviceSlot<I, H> {
    Empty,
    Open(ActiveDevice<I, H>),
}

impl<I, H> Default for DeviceSlot<I, H> {
    fn default() -> Self {
        DeviceSlot::Empty
    }
}

impl<I, H> DeviceSlot<I, H> {
    pub fn active_id(&self) -> Option<DeviceId> {
        match self {
            DeviceSlot::Empty => None,
            DeviceSlot::Open(device) => Some(device.id),
        }
    }

    pub fn is_active(&self, id: DeviceId) -> bool {
        self.active_id() == Some(id)
    }

    pub fn device(&self) -> Option<&ActiveDevice<I, H>> {
        match self {
            DeviceSlot::Empty => None,
            DeviceSlot::Open(device) => Some(device),
        }
    }

    /// Empty the slot and hand back whatever was in it
    pub fn take(&mut self) -> Option<ActiveDevice<I, H>> {
        match std::mem::take(self) {
            DeviceSlot::Empty => None,
            DeviceSlot::Open(device) => Some(device),
        }
    }
}
