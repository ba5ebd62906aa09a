//! Active-device selection policy
//!
//! Pure decision logic, consulted whenever a device is reported. The caller owns all
//! state; this module only says what to do with a candidate.

use super::backend::{DeviceId, DeviceInfo};

/// Outcome of offering a candidate device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Open the candidate, closing `replaces` first if set
    Accept { replaces: Option<DeviceId> },

    /// The candidate is already the active device
    AlreadyActive,

    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Missing the digital button and four-axis profile
    Unsupported,

    /// Auto-selection is on and another device is already active
    SlotTaken { active: DeviceId },

    /// A specific device index is configured and this is not it
    NotPreferred { preferred: i32 },
}

/// Decide whether `candidate` should become the active device
///
/// A negative `preferred` index means "first available".
pub fn select(candidate: &DeviceInfo, preferred: i32, active: Option<DeviceId>) -> Selection {
    if !candidate.supports_gamepad_profile() {
        return Selection::Reject(RejectReason::Unsupported);
    }

    if preferred < 0 {
        if let Some(active) = active {
            return Selection::Reject(RejectReason::SlotTaken { active });
        }
    } else if !candidate.id.matches_index(preferred) {
        return Selection::Reject(RejectReason::NotPreferred { preferred });
    }

    match active {
        Some(active) if active == candidate.id => Selection::AlreadyActive,
        replaces => Selection::Accept { replaces },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(id: u32) -> DeviceInfo {
        DeviceInfo {
            id: DeviceId(id),
            name: format!("pad {}", id),
            button_count: 15,
            axis_count: 6,
            has_haptics: true,
        }
    }

    #[test]
    fn rejects_devices_without_gamepad_profile() {
        let mut stick = pad(1);
        stick.axis_count = 2;
        assert_eq!(
            select(&stick, -1, None),
            Selection::Reject(RejectReason::Unsupported)
        );

        let mut wheel = pad(2);
        wheel.button_count = 0;
        assert_eq!(
            select(&wheel, 2, None),
            Selection::Reject(RejectReason::Unsupported)
        );
    }

    #[test]
    fn first_available_takes_empty_slot() {
        assert_eq!(
            select(&pad(3), -1, None),
            Selection::Accept { replaces: None }
        );
    }

    #[test]
    fn first_available_keeps_current_device() {
        assert_eq!(
            select(&pad(4), -1, Some(DeviceId(3))),
            Selection::Reject(RejectReason::SlotTaken {
                active: DeviceId(3)
            })
        );
    }

    #[test]
    fn preferred_index_must_match() {
        assert_eq!(
            select(&pad(4), 5, None),
            Selection::Reject(RejectReason::NotPreferred { preferred: 5 })
        );
    }

    #[test]
    fn preferred_device_replaces_active_one() {
        assert_eq!(
            select(&pad(5), 5, Some(DeviceId(3))),
            Selection::Accept {
                replaces: Some(DeviceId(3))
            }
        );
    }

    #[test]
    fn preferred_device_already_active_is_noop() {
        assert_eq!(
            select(&pad(5), 5, Some(DeviceId(5))),
            Selection::AlreadyActive
        );
    }
}
