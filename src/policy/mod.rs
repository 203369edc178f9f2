//! Announcement policy.
//!
//! Converts the noisy per-frame detection stream into a sparse sequence of
//! spoken announcements:
//!
//! - a new label is announced once the global speech cooldown has passed;
//! - the same label is repeated with a growing backoff, at most a fixed number
//!   of times, and then stays silent until another label is announced;
//! - priority labels repeat sooner and are phrased with an attention marker.

mod announcement;
mod engine;
mod state;

pub use announcement::{
    confidence_percent, Announcement, AnnouncementKind, Language, Phrasebook, Priority,
    PrioritySet, DEFAULT_PRIORITY_LABELS,
};
pub use engine::{
    AnnouncementPolicy, PolicySettings, DETECTION_COOLDOWN_MS, MAX_CONSECUTIVE_SAME_OBJECT,
    MIN_CONFIDENCE_SCORE, REPEAT_BACKOFF_MS, SPEECH_COOLDOWN_MS,
};
pub use state::{PolicyState, TapState};
