//! Haptic feedback boundary.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub trait Haptics: Send {
    fn pulse(&self, duration: Duration);
}

/// Logs pulses; used where no vibration motor is available.
#[derive(Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&self, duration: Duration) {
        log::info!("haptic pulse {}ms", duration.as_millis());
    }
}

/// Counts pulses.
#[derive(Clone, Default)]
pub struct CountingHaptics {
    pulses: Arc<AtomicU32>,
}

impl CountingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl Haptics for CountingHaptics {
    fn pulse(&self, _duration: Duration) {
        self.pulses.fetch_add(1, Ordering::SeqCst);
    }
}
