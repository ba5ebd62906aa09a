//! Gamepad subsystem
//!
//! Keeps exactly one gamepad active and turns its raw notifications into normalized
//! host events:
//!
//! 1. [`codes`] - Backend button/axis to normalized code tables
//! 2. [`selector`] - Which connected device becomes active
//! 3. [`lifecycle`] - Opening, closing and hotplug handling for the active device
//! 4. [`translator`] - Deadzone, trigger emulation and analog deltas
//! 5. [`rumble`] - Force feedback hysteresis
//!
//! # Architecture
//!
//! ```text
//! Backend ──► notification channel ──► InputSystem::pump ──► InputEvent channel
//!                                           │
//!                                           └──► HostFlags (watch)
//! ```
//!
//! All handlers run synchronously on the thread that calls [`InputSystem::pump`].

pub mod analog;
pub mod backend;
pub mod codes;
pub mod device;
pub mod gilrs_backend;
pub mod lifecycle;
pub mod rumble;
pub mod selector;
pub mod startup;
pub mod system;
pub mod translator;

#[cfg(test)]
mod mock;

// Re-export types that need to be public
pub use crate::controller::backend::{BackendError, BackendEvent, DeviceId, DeviceInfo, GamepadBackend};
pub use crate::controller::codes::{AnalogCode, ButtonCode, RawAxis, RawButton, TriggerSide};
pub use crate::controller::gilrs_backend::GilrsBackend;
pub use crate::controller::system::{HostFlags, InputEvent, InputEventKind, InputSystem};
