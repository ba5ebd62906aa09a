//! Translation tables from backend-native identifiers to normalized codes
//!
//! Buttons and axes arrive from the backend as [`RawButton`] / [`RawAxis`] and leave
//! the subsystem as [`ButtonCode`] / [`AnalogCode`]. Inputs without a translation map
//! to `None` and are dropped by the caller.
//!
//! Two overlaps are kept on purpose:
//!
//! - the guide button reports as [`GUIDE_BUTTON_CODE`], which is the back button code
//! - both trigger axes share [`TRIGGER_ANALOG_CODE`], so left and right trigger analog
//!   values can not be told apart downstream

use serde::{Deserialize, Serialize};

/// Backend-native gamepad button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawButton {
    South,
    East,
    West,
    North,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Misc,
    Touchpad,
    Other(u16),
}

impl RawButton {
    /// Every named button, in backend order
    pub const NAMED: [RawButton; 17] = [
        RawButton::South,
        RawButton::East,
        RawButton::West,
        RawButton::North,
        RawButton::Back,
        RawButton::Guide,
        RawButton::Start,
        RawButton::LeftStick,
        RawButton::RightStick,
        RawButton::LeftShoulder,
        RawButton::RightShoulder,
        RawButton::DPadUp,
        RawButton::DPadDown,
        RawButton::DPadLeft,
        RawButton::DPadRight,
        RawButton::Misc,
        RawButton::Touchpad,
    ];
}

/// Backend-native gamepad axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
    Other(u16),
}

impl RawAxis {
    pub const NAMED: [RawAxis; 6] = [
        RawAxis::LeftX,
        RawAxis::LeftY,
        RawAxis::RightX,
        RawAxis::RightY,
        RawAxis::LeftTrigger,
        RawAxis::RightTrigger,
    ];

    /// Which trigger this axis belongs to, if it is a trigger at all
    pub fn trigger_side(self) -> Option<TriggerSide> {
        match self {
            RawAxis::LeftTrigger => Some(TriggerSide::Left),
            RawAxis::RightTrigger => Some(TriggerSide::Right),
            _ => None,
        }
    }
}

// Trigger side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSide {
    Left,
    Right,
}

impl TriggerSide {
    pub fn index(self) -> usize {
        match self {
            TriggerSide::Left => 0,
            TriggerSide::Right => 1,
        }
    }

    /// Button code emitted when the trigger is used as a digital button
    pub fn button_code(self) -> ButtonCode {
        match self {
            TriggerSide::Left => ButtonCode::LeftTrigger,
            TriggerSide::Right => ButtonCode::RightTrigger,
        }
    }
}

/// Normalized button code published to the host
///
/// `Button1`..`Button4` are positional: south, east, west, north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonCode {
    Button1,
    Button2,
    Button3,
    Button4,
    Back,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    Up,
    Down,
    Left,
    Right,
    LeftTrigger,
    RightTrigger,
}

/// The guide button has no code of its own and reports as back.
pub const GUIDE_BUTTON_CODE: ButtonCode = ButtonCode::Back;

/// Normalized analog channel published to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogCode {
    X,
    Y,
    Z,
    R,
    U,
}

/// Both triggers publish on this single channel.
pub const TRIGGER_ANALOG_CODE: AnalogCode = AnalogCode::Z;

impl AnalogCode {
    pub const COUNT: usize = 5;

    pub const ALL: [AnalogCode; AnalogCode::COUNT] = [
        AnalogCode::X,
        AnalogCode::Y,
        AnalogCode::Z,
        AnalogCode::R,
        AnalogCode::U,
    ];

    pub fn index(self) -> usize {
        match self {
            AnalogCode::X => 0,
            AnalogCode::Y => 1,
            AnalogCode::Z => 2,
            AnalogCode::R => 3,
            AnalogCode::U => 4,
        }
    }
}

pub fn button_code(button: RawButton) -> Option<ButtonCode> {
    match button {
        RawButton::South => Some(ButtonCode::Button1),
        RawButton::East => Some(ButtonCode::Button2),
        RawButton::West => Some(ButtonCode::Button3),
        RawButton::North => Some(ButtonCode::Button4),
        RawButton::Back => Some(ButtonCode::Back),
        RawButton::Start => Some(ButtonCode::Start),
        RawButton::Guide => Some(GUIDE_BUTTON_CODE),
        RawButton::LeftStick => Some(ButtonCode::LeftStick),
        RawButton::RightStick => Some(ButtonCode::RightStick),
        RawButton::LeftShoulder => Some(ButtonCode::LeftShoulder),
        RawButton::RightShoulder => Some(ButtonCode::RightShoulder),
        RawButton::DPadUp => Some(ButtonCode::Up),
        RawButton::DPadDown => Some(ButtonCode::Down),
        RawButton::DPadLeft => Some(ButtonCode::Left),
        RawButton::DPadRight => Some(ButtonCode::Right),
        RawButton::Misc | RawButton::Touchpad | RawButton::Other(_) => None,
    }
}

pub fn analog_code(axis: RawAxis) -> Option<AnalogCode> {
    match axis {
        RawAxis::LeftX => Some(AnalogCode::X),
        RawAxis::LeftY => Some(AnalogCode::Y),
        RawAxis::RightX => Some(AnalogCode::U),
        RawAxis::RightY => Some(AnalogCode::R),
        RawAxis::LeftTrigger | RawAxis::RightTrigger => Some(TRIGGER_ANALOG_CODE),
        RawAxis::Other(_) => None,
    }
}
