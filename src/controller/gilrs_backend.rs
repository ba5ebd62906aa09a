//! [`GamepadBackend`] on top of gilrs
//!
//! gilrs delivers events by polling [`Gilrs::next_event`]; [`GilrsBackend::pump`] turns
//! them into [`BackendEvent`]s for the registered watcher. Analog triggers arrive as
//! `ButtonChanged` on `LeftTrigger2`/`RightTrigger2` and are reported as trigger axes.

use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs, GilrsBuilder, MappingSource};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::backend::{BackendError, BackendEvent, DeviceId, DeviceInfo, GamepadBackend};
use super::codes::{RawAxis, RawButton};

/// Length of one replay of the rumble effect, repeated until stopped
const RUMBLE_REPLAY_MS: u32 = 1000;

/// Buttons and axes a mapped gamepad exposes
const MAPPED_BUTTON_COUNT: usize = RawButton::NAMED.len();
const MAPPED_AXIS_COUNT: usize = RawAxis::NAMED.len();

#[derive(Debug)]
pub struct GilrsInput {
    gamepad: GamepadId,
}

pub struct GilrsHaptic {
    gamepad: GamepadId,
    effect: Option<Effect>,
}

#[derive(Default)]
pub struct GilrsBackend {
    gilrs: Option<Gilrs>,
    mapping_hint: Option<String>,
    watcher: Option<mpsc::Sender<BackendEvent>>,
}

impl GilrsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn device_id(id: GamepadId) -> DeviceId {
        DeviceId(usize::from(id) as u32)
    }

    fn gamepad_id(&self, device: DeviceId) -> Option<GamepadId> {
        let gilrs = self.gilrs.as_ref()?;
        gilrs
            .gamepads()
            .find(|(id, _)| Self::device_id(*id) == device)
            .map(|(id, _)| id)
    }

    fn send(&self, event: BackendEvent) {
        let Some(watcher) = self.watcher.as_ref() else {
            return;
        };
        if let Err(e) = watcher.try_send(event) {
            error!("Failed to queue gamepad notification: {}", e);
        }
    }

    fn convert_event(id: GamepadId, event: EventType) -> Option<BackendEvent> {
        let device = Self::device_id(id);
        match event {
            EventType::Connected => Some(BackendEvent::DeviceAdded(device)),
            EventType::Disconnected => Some(BackendEvent::DeviceRemoved(device)),
            EventType::ButtonPressed(button, _) => {
                map_button(button).map(|button| BackendEvent::ButtonDown { device, button })
            }
            EventType::ButtonReleased(button, _) => {
                map_button(button).map(|button| BackendEvent::ButtonUp { device, button })
            }
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
                Some(BackendEvent::AxisMotion {
                    device,
                    axis: RawAxis::LeftTrigger,
                    value: scale_axis(value),
                })
            }
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
                Some(BackendEvent::AxisMotion {
                    device,
                    axis: RawAxis::RightTrigger,
                    value: scale_axis(value),
                })
            }
            EventType::AxisChanged(axis, value, _) => match map_axis(axis) {
                Some(axis) => Some(BackendEvent::AxisMotion {
                    device,
                    axis,
                    value: scale_axis(value),
                }),
                None => {
                    trace!("Dropping {:?} motion on {}", axis, device);
                    None
                }
            },
            _ => {
                trace!("Unhandled gilrs event: {:?}", event);
                None
            }
        }
    }
}

impl GamepadBackend for GilrsBackend {
    type Input = GilrsInput;
    type Haptic = GilrsHaptic;

    fn set_mapping_hint(&mut self, mapping: &str) {
        self.mapping_hint = Some(mapping.to_string());
    }

    fn start(&mut self) -> Result<(), BackendError> {
        info!("Initializing gilrs controller interface");
        let mut builder = GilrsBuilder::new();
        if let Some(mapping) = self.mapping_hint.take() {
            builder = builder.add_mappings(&mapping);
        }

        match builder.build() {
            Ok(gilrs) => {
                info!("Successfully initialized gilrs");
                self.gilrs = Some(gilrs);
                Ok(())
            }
            Err(gilrs::Error::NotImplemented(_)) => Err(BackendError::StartError(
                "platform not supported by gilrs".to_string(),
            )),
            Err(e) => Err(BackendError::StartError(e.to_string())),
        }
    }

    fn stop(&mut self) {
        if self.gilrs.take().is_some() {
            info!("gilrs controller interface stopped");
        }
    }

    fn enumerate_devices(&self) -> Vec<DeviceId> {
        match self.gilrs.as_ref() {
            Some(gilrs) => gilrs.gamepads().map(|(id, _)| Self::device_id(id)).collect(),
            None => Vec::new(),
        }
    }

    fn describe(&self, device: DeviceId) -> Option<DeviceInfo> {
        let id = self.gamepad_id(device)?;
        let gamepad = self.gilrs.as_ref()?.gamepad(id);
        let mapped = gamepad.mapping_source() != MappingSource::None;
        Some(DeviceInfo {
            id: device,
            name: gamepad.name().to_string(),
            button_count: if mapped { MAPPED_BUTTON_COUNT } else { 0 },
            axis_count: if mapped { MAPPED_AXIS_COUNT } else { 0 },
            has_haptics: gamepad.is_ff_supported(),
        })
    }

    fn open_input(&mut self, device: DeviceId) -> Result<GilrsInput, BackendError> {
        if self.gilrs.is_none() {
            return Err(BackendError::NotRunning);
        }
        let gamepad = self
            .gamepad_id(device)
            .ok_or(BackendError::DeviceNotFound(device))?;
        debug!("Opened gilrs gamepad {}", gamepad);
        Ok(GilrsInput { gamepad })
    }

    fn close_input(&mut self, input: GilrsInput) {
        debug!("Closed gilrs gamepad {}", input.gamepad);
    }

    fn open_haptic(&mut self, input: &GilrsInput) -> Result<GilrsHaptic, BackendError> {
        let gilrs = self.gilrs.as_ref().ok_or(BackendError::NotRunning)?;
        let device = Self::device_id(input.gamepad);
        if !gilrs.gamepad(input.gamepad).is_ff_supported() {
            return Err(BackendError::HapticUnavailable(device));
        }
        Ok(GilrsHaptic {
            gamepad: input.gamepad,
            effect: None,
        })
    }

    fn close_haptic(&mut self, haptic: GilrsHaptic) {
        debug!("Closed force feedback for gamepad {}", haptic.gamepad);
    }

    fn play_rumble(&mut self, haptic: &mut GilrsHaptic, strength: f32) -> Result<(), BackendError> {
        let gilrs = self.gilrs.as_mut().ok_or(BackendError::NotRunning)?;
        let magnitude = (strength.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;

        let effect = EffectBuilder::new()
            .add_effect(BaseEffect {
                kind: BaseEffectType::Strong { magnitude },
                scheduling: Replay {
                    play_for: Ticks::from_ms(RUMBLE_REPLAY_MS),
                    ..Default::default()
                },
                ..Default::default()
            })
            .repeat(Repeat::Infinitely)
            .gamepads(&[haptic.gamepad])
            .finish(gilrs)
            .map_err(|e| BackendError::RumbleError(e.to_string()))?;
        effect
            .play()
            .map_err(|e| BackendError::RumbleError(e.to_string()))?;

        // Dropping the previous effect ends it.
        haptic.effect = Some(effect);
        Ok(())
    }

    fn stop_rumble(&mut self, haptic: &mut GilrsHaptic) -> Result<(), BackendError> {
        match haptic.effect.take() {
            Some(effect) => effect
                .stop()
                .map_err(|e| BackendError::RumbleError(e.to_string())),
            None => Ok(()),
        }
    }

    fn register_watcher(&mut self, watcher: mpsc::Sender<BackendEvent>) {
        self.watcher = Some(watcher);
    }

    fn unregister_watcher(&mut self) {
        self.watcher = None;
    }

    /// Forward pending gilrs events while the watcher has room
    ///
    /// Events that do not fit stay queued inside gilrs for the next pump, so a full
    /// channel delays notifications instead of dropping them.
    fn pump(&mut self) {
        let mut room = self.watcher.as_ref().map(|w| w.capacity());
        let mut pending = Vec::new();
        if let Some(gilrs) = self.gilrs.as_mut() {
            while room != Some(0) {
                let Some(Event { id, event, .. }) = gilrs.next_event() else {
                    break;
                };
                if let Some(converted) = Self::convert_event(id, event) {
                    pending.push(converted);
                    if let Some(left) = room.as_mut() {
                        *left -= 1;
                    }
                }
            }
        }
        for event in pending {
            self.send(event);
        }
    }
}

fn map_button(button: Button) -> Option<RawButton> {
    match button {
        Button::South => Some(RawButton::South),
        Button::East => Some(RawButton::East),
        Button::West => Some(RawButton::West),
        Button::North => Some(RawButton::North),
        Button::Select => Some(RawButton::Back),
        Button::Mode => Some(RawButton::Guide),
        Button::Start => Some(RawButton::Start),
        Button::LeftThumb => Some(RawButton::LeftStick),
        Button::RightThumb => Some(RawButton::RightStick),
        Button::LeftTrigger => Some(RawButton::LeftShoulder),
        Button::RightTrigger => Some(RawButton::RightShoulder),
        Button::DPadUp => Some(RawButton::DPadUp),
        Button::DPadDown => Some(RawButton::DPadDown),
        Button::DPadLeft => Some(RawButton::DPadLeft),
        Button::DPadRight => Some(RawButton::DPadRight),
        Button::C => Some(RawButton::Misc),
        // Analog triggers are reported through ButtonChanged
        Button::LeftTrigger2 | Button::RightTrigger2 => None,
        Button::Z => {
            trace!("Ignoring button {:?}", button);
            None
        }
        _ => {
            warn!("Ignoring unsupported button: {:?}", button);
            None
        }
    }
}

/// `None` for D-pad axes, the D-pad also arrives as buttons
fn map_axis(axis: Axis) -> Option<RawAxis> {
    match axis {
        Axis::LeftStickX => Some(RawAxis::LeftX),
        Axis::LeftStickY => Some(RawAxis::LeftY),
        Axis::RightStickX => Some(RawAxis::RightX),
        Axis::RightStickY => Some(RawAxis::RightY),
        Axis::LeftZ => Some(RawAxis::LeftTrigger),
        Axis::RightZ => Some(RawAxis::RightTrigger),
        _ => None,
    }
}

/// gilrs reports `[-1, 1]`, raw axis values are `[-32767, 32767]`
fn scale_axis(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * 32767.0).round() as i16
}
