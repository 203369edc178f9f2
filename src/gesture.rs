//! Multi-tap toggle recognizer.
//!
//! Counts taps that arrive within `tap_timeout_ms` of each other; the tap that
//! brings the count to `taps_to_toggle` fires and resets the count.

use std::time::Duration;

use crate::policy::TapState;

pub const TAP_TIMEOUT_MS: u64 = 1_000;
pub const TAPS_TO_TOGGLE: u32 = 3;
pub const HAPTIC_PULSE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureSettings {
    pub tap_timeout_ms: u64,
    pub taps_to_toggle: u32,
    pub haptic_pulse: Duration,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            tap_timeout_ms: TAP_TIMEOUT_MS,
            taps_to_toggle: TAPS_TO_TOGGLE,
            haptic_pulse: HAPTIC_PULSE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tap counted; `count` taps so far in the current run.
    Counting { count: u32 },
    /// Tap completed the gesture.
    Fired,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TapRecognizer {
    settings: GestureSettings,
}

impl TapRecognizer {
    pub fn new(settings: GestureSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    pub fn on_tap(&self, state: &mut TapState, at_ms: u64) -> TapOutcome {
        let timed_out = state
            .last_tap_ms
            .map_or(true, |last| at_ms.saturating_sub(last) > self.settings.tap_timeout_ms);
        if timed_out {
            state.count = 0;
        }
        state.count += 1;
        state.last_tap_ms = Some(at_ms);

        if state.count >= self.settings.taps_to_toggle {
            state.count = 0;
            TapOutcome::Fired
        } else {
            TapOutcome::Counting { count: state.count }
        }
    }
}
