//! Analog axis state and trigger-as-button emulation
//!
//! [`AnalogBuffers`] keeps two [`AnalogState`] instances: the one notifications write
//! into and the one last published to consumers. The host swaps them at its sampling
//! boundary.

use super::codes::{AnalogCode, TriggerSide};

/// Full positive range of a raw axis value
pub const AXIS_MAX: i32 = 32767;

/// Scale a fraction of the full axis range to a raw threshold, truncating
pub fn scaled_threshold(fraction: f32) -> i32 {
    (fraction * AXIS_MAX as f32) as i32
}

/// Clamp `value` to zero when its magnitude is below the deadzone threshold
pub fn apply_deadzone(value: i32, deadzone: f32) -> i32 {
    if value.abs() < scaled_threshold(deadzone) {
        0
    } else {
        value
    }
}

/// Per-channel value and delta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalogState {
    values: [i32; AnalogCode::COUNT],
    deltas: [i32; AnalogCode::COUNT],
}

impl AnalogState {
    pub fn value(&self, code: AnalogCode) -> i32 {
        self.values[code.index()]
    }

    pub fn delta(&self, code: AnalogCode) -> i32 {
        self.deltas[code.index()]
    }

    /// Store `value` and return the delta against the previous value
    pub fn record(&mut self, code: AnalogCode, value: i32) -> i32 {
        let idx = code.index();
        let delta = value - self.values[idx];
        self.values[idx] = value;
        self.deltas[idx] = delta;
        delta
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalogBuffers {
    states: [AnalogState; 2],
    write_index: usize,
}

impl AnalogBuffers {
    pub fn write(&self) -> &AnalogState {
        &self.states[self.write_index]
    }

    pub fn write_mut(&mut self) -> &mut AnalogState {
        &mut self.states[self.write_index]
    }

    pub fn current(&self) -> &AnalogState {
        &self.states[1 - self.write_index]
    }

    /// Publish the write buffer and continue writing from a copy of it
    ///
    /// Deltas in the new write buffer start at zero.
    pub fn swap(&mut self) {
        let published = self.write_index;
        self.write_index = 1 - published;
        let mut next = self.states[published].clone();
        next.deltas = [0; AnalogCode::COUNT];
        self.states[self.write_index] = next;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Edge produced by a trigger sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Pressed,
    Held,
    Released,
}

/// Repeat counters for the two triggers used as digital buttons
#[derive(Debug, Clone, Default)]
pub struct TriggerButtons {
    repeats: [u32; 2],
}

impl TriggerButtons {
    /// Feed one raw trigger sample
    ///
    /// Press is edge-triggered. Release is level-triggered: every sample at or below
    /// the threshold reports [`TriggerEdge::Released`].
    pub fn sample(&mut self, side: TriggerSide, value: i32, threshold: i32) -> TriggerEdge {
        let repeats = &mut self.repeats[side.index()];
        if value > threshold {
            let edge = if *repeats < 1 {
                TriggerEdge::Pressed
            } else {
                TriggerEdge::Held
            };
            *repeats = repeats.saturating_add(1);
            edge
        } else {
            *repeats = 0;
            TriggerEdge::Released
        }
    }

    pub fn repeats(&self, side: TriggerSide) -> u32 {
        self.repeats[side.index()]
    }

    pub fn reset(&mut self) {
        self.repeats = [0; 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn thresholds_truncate() {
        assert_eq!(scaled_threshold(0.2), 6553);
        assert_eq!(scaled_threshold(0.3), 9830);
        assert_eq!(scaled_threshold(0.0), 0);
    }

    #[test]
    fn deadzone_edges() {
        assert_eq!(apply_deadzone(6552, 0.2), 0);
        assert_eq!(apply_deadzone(6553, 0.2), 6553);
        assert_eq!(apply_deadzone(-6552, 0.2), 0);
        assert_eq!(apply_deadzone(-32768, 0.2), -32768);
    }

    #[test]
    fn record_tracks_delta() {
        let mut state = AnalogState::default();
        assert_eq!(state.record(AnalogCode::X, 20000), 20000);
        assert_eq!(state.record(AnalogCode::X, 0), -20000);
        assert_eq!(state.value(AnalogCode::X), 0);
        assert_eq!(state.delta(AnalogCode::X), -20000);
        assert_eq!(state.value(AnalogCode::Y), 0);
    }

    #[test]
    fn swap_publishes_and_keeps_continuity() {
        let mut buffers = AnalogBuffers::default();
        buffers.write_mut().record(AnalogCode::U, 1200);
        assert_eq!(buffers.current().value(AnalogCode::U), 0);

        buffers.swap();
        assert_eq!(buffers.current().value(AnalogCode::U), 1200);
        assert_eq!(buffers.current().delta(AnalogCode::U), 1200);
        assert_eq!(buffers.write().value(AnalogCode::U), 1200);
        assert_eq!(buffers.write().delta(AnalogCode::U), 0);

        assert_eq!(buffers.write_mut().record(AnalogCode::U, 1500), 300);
    }

    #[test]
    fn trigger_press_then_hold_then_release() {
        let mut triggers = TriggerButtons::default();
        let t = 9830;
        assert_eq!(triggers.sample(TriggerSide::Left, 10000, t), TriggerEdge::Pressed);
        assert_eq!(triggers.sample(TriggerSide::Left, 20000, t), TriggerEdge::Held);
        assert_eq!(triggers.repeats(TriggerSide::Left), 2);
        assert_eq!(triggers.sample(TriggerSide::Left, t, t), TriggerEdge::Released);
        assert_eq!(triggers.sample(TriggerSide::Left, 0, t), TriggerEdge::Released);
        assert_eq!(triggers.repeats(TriggerSide::Left), 0);
    }

    #[test]
    fn triggers_are_independent() {
        let mut triggers = TriggerButtons::default();
        assert_eq!(triggers.sample(TriggerSide::Left, 30000, 100), TriggerEdge::Pressed);
        assert_eq!(triggers.sample(TriggerSide::Right, 30000, 100), TriggerEdge::Pressed);
        assert_eq!(triggers.sample(TriggerSide::Right, 0, 100), TriggerEdge::Released);
        assert_eq!(triggers.sample(TriggerSide::Left, 30000, 100), TriggerEdge::Held);
    }

    proptest! {
        #[test]
        fn values_inside_deadzone_are_zero(deadzone in 0.0f32..1.0, value in -32768i32..=32767) {
            let out = apply_deadzone(value, deadzone);
            if value.abs() < scaled_threshold(deadzone) {
                prop_assert_eq!(out, 0);
            } else {
                prop_assert_eq!(out, value);
            }
        }

        #[test]
        fn one_press_per_upward_crossing(
            samples in proptest::collection::vec(0i32..=32767, 0..200),
            fraction in 0.05f32..0.95,
        ) {
            let threshold = scaled_threshold(fraction);
            let mut triggers = TriggerButtons::default();
            let mut above = false;
            let mut crossings = 0;
            let mut presses = 0;
            let mut open = false;
            for value in samples {
                if value > threshold && !above {
                    crossings += 1;
                }
                above = value > threshold;
                let edge = triggers.sample(TriggerSide::Right, value, threshold);
                prop_assert_eq!(edge == TriggerEdge::Released, value <= threshold);
                match edge {
                    TriggerEdge::Pressed => {
                        presses += 1;
                        prop_assert!(!open);
                        open = true;
                    }
                    TriggerEdge::Released => open = false,
                    TriggerEdge::Held => {
                        prop_assert!(open);
                    }
                }
            }
            prop_assert_eq!(presses, crossings);
        }
    }
}
