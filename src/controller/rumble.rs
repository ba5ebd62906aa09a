//! Rumble hysteresis
//!
//! [`RumbleState`] decides which haptic command, if any, a requested motor strength
//! needs. [`InputSystem::set_rumble`] applies it to the active device.

use tracing::{debug, trace, warn};

use super::backend::GamepadBackend;
use super::device::DeviceSlot;
use super::system::InputSystem;

/// Strength changes smaller than this keep the current effect, and averages below it stop
pub const RUMBLE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RumbleCommand {
    None,
    Stop,
    Play(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RumbleState {
    enabled: bool,
    strength: f32,
}

impl RumbleState {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last strength sent to the haptic backend
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Combine both motors and work out the command
    ///
    /// `allowed` is false when the host has joystick input turned off. A play command
    /// records the rumble as enabled even if the backend later fails to play it.
    pub fn request(&mut self, left: f32, right: f32, allowed: bool) -> RumbleCommand {
        let strength = (left + right) / 2.0;
        let should_stop = strength < RUMBLE_EPSILON || !allowed;

        if should_stop {
            if self.enabled {
                self.enabled = false;
                self.strength = 0.0;
                return RumbleCommand::Stop;
            }
            return RumbleCommand::None;
        }

        if self.enabled && (self.strength - strength).abs() < RUMBLE_EPSILON {
            return RumbleCommand::None;
        }

        self.enabled = true;
        self.strength = strength;
        RumbleCommand::Play(strength)
    }
}

impl<B: GamepadBackend> InputSystem<B> {
    /// Drive both motors of the active device
    ///
    /// There is only one active device, so `user_id` does not select anything.
    pub fn set_rumble(&mut self, left: f32, right: f32, user_id: u32) {
        trace!("Rumble request {:.2}/{:.2} for user {}", left, right, user_id);
        let allowed = self.settings.joystick_enabled.unwrap_or(false);

        let DeviceSlot::Open(device) = &mut self.slot else {
            return;
        };
        let Some(haptic) = device.haptic.as_mut() else {
            return;
        };

        match device.rumble.request(left, right, allowed) {
            RumbleCommand::None => {}
            RumbleCommand::Stop => {
                debug!("Stopping rumble on {}", device.id);
                if let Err(e) = self.backend.stop_rumble(haptic) {
                    warn!("Couldn't stop rumble on {}: {}", device.id, e);
                }
            }
            RumbleCommand::Play(strength) => {
                debug!("Rumble on {} at strength {:.2}", device.id, strength);
                if let Err(e) = self.backend.play_rumble(haptic, strength) {
                    warn!("Couldn't play rumble (strength {:.1}): {}", strength, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_request_plays_once() {
        let mut rumble = RumbleState::default();
        assert_eq!(rumble.request(0.5, 0.5, true), RumbleCommand::Play(0.5));
        assert_eq!(rumble.request(0.5, 0.5, true), RumbleCommand::None);
        assert!(rumble.is_enabled());
    }

    #[test]
    fn small_jitter_is_ignored() {
        let mut rumble = RumbleState::default();
        rumble.request(0.5, 0.5, true);
        assert_eq!(rumble.request(0.505, 0.5, true), RumbleCommand::None);
        assert_eq!(rumble.request(0.6, 0.6, true), RumbleCommand::Play(0.6));
        assert_eq!(rumble.strength(), 0.6);
    }

    #[test]
    fn zero_stops_once() {
        let mut rumble = RumbleState::default();
        rumble.request(1.0, 0.0, true);
        assert_eq!(rumble.request(0.0, 0.0, true), RumbleCommand::Stop);
        assert_eq!(rumble.strength(), 0.0);
        assert_eq!(rumble.request(0.0, 0.0, true), RumbleCommand::None);
    }

    #[test]
    fn stop_without_rumble_is_noop() {
        let mut rumble = RumbleState::default();
        assert_eq!(rumble.request(0.0, 0.0, true), RumbleCommand::None);
        assert_eq!(rumble.request(0.004, 0.01, true), RumbleCommand::None);
    }

    #[test]
    fn disabled_joystick_never_rumbles() {
        let mut rumble = RumbleState::default();
        assert_eq!(rumble.request(1.0, 1.0, false), RumbleCommand::None);
        rumble.request(1.0, 1.0, true);
        assert_eq!(rumble.request(1.0, 1.0, false), RumbleCommand::Stop);
        assert!(!rumble.is_enabled());
    }
}
