//! Raw button and axis notifications to normalized host events

use tracing::{debug, info, trace, warn};

use super::analog::{apply_deadzone, scaled_threshold, TriggerEdge};
use super::backend::{DeviceId, GamepadBackend};
use super::codes::{analog_code, button_code, RawAxis, RawButton};
use super::system::{InputEventKind, InputSystem};

impl<B: GamepadBackend> InputSystem<B> {
    /// Whether input from `device` belongs to the active joystick, logging when it does not
    fn from_active(&self, device: DeviceId) -> bool {
        let active = self.slot.is_active(device);
        if !active {
            info!(
                "Ignoring input from {}, active joystick is {:?}",
                device,
                self.slot.active_id()
            );
        }
        active
    }

    pub fn on_button_down(&mut self, device: DeviceId, button: RawButton) {
        if !self.from_active(device) {
            return;
        }
        match button_code(button) {
            Some(code) => self.emit(InputEventKind::ButtonPressed(code)),
            None => debug!("No button code for {:?}, press dropped", button),
        }
    }

    pub fn on_button_up(&mut self, device: DeviceId, button: RawButton) {
        if !self.from_active(device) {
            return;
        }
        match button_code(button) {
            Some(code) => self.emit(InputEventKind::ButtonReleased(code)),
            None => debug!("No button code for {:?}, release dropped", button),
        }
    }

    /// Trigger emulation, deadzone, then delta against the last written value
    pub fn on_axis_motion(&mut self, device: DeviceId, axis: RawAxis, value: i16) {
        if !self.from_active(device) {
            return;
        }

        let Some(code) = analog_code(axis) else {
            warn!("Invalid code for axis {:?}", axis);
            return;
        };

        let mut value = i32::from(value);

        if let Some(side) = axis.trigger_side() {
            let threshold = scaled_threshold(self.settings.press_threshold);
            let button = side.button_code();
            match self.triggers.sample(side, value, threshold) {
                TriggerEdge::Pressed => self.emit(InputEventKind::ButtonPressed(button)),
                TriggerEdge::Held => {}
                // Repeated on every low sample, release handling upstream is idempotent.
                TriggerEdge::Released => self.emit(InputEventKind::ButtonReleased(button)),
            }
        }

        value = apply_deadzone(value, self.settings.deadzone);

        let delta = self.analog.write_mut().record(code, value);
        trace!("Axis {:?} -> {:?} = {} (delta {})", axis, code, value, delta);
        if delta != 0 {
            self.emit(InputEventKind::AnalogValueChanged { code, value, delta });
        }
    }
}
