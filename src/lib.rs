//! Detection Announcer
//!
//! Core of a camera object-detection overlay with voice announcements.
//!
//! # Architecture
//!
//! Every camera frame takes one turn through the session:
//!
//! 1. **Detect**: a `DetectorBackend` runs the model; the `DetectorAdapter`
//!    turns its tensors into a ranked top-K `DetectionFrame`.
//! 2. **Render**: the boxes go to an `OverlaySink`, unconditionally.
//! 3. **Decide**: the `AnnouncementPolicy` reads the frame and the session's
//!    `PolicyState` and emits at most one `Announcement`.
//! 4. **Speak**: the text is posted to a single-slot speech mailbox, preempting
//!    whatever is still pending.
//!
//! Taps feed a `TapRecognizer` that flips `voice_enabled`.
//!
//! # Module Structure
//!
//! - `detect`: backends, label map, adapter, registry
//! - `policy`: announcement policy, state, phrasing
//! - `gesture`: multi-tap toggle
//! - `speech`, `overlay`, `haptics`: output boundaries
//! - `ingest`, `frame`, `clock`: frame sources and time
//! - `session`: single-consumer event loop tying it together
//! - `config`: file + env configuration

pub mod clock;
pub mod config;
pub mod detect;
pub mod frame;
pub mod gesture;
pub mod haptics;
pub mod ingest;
pub mod overlay;
pub mod policy;
pub mod session;
pub mod speech;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::AnnouncerConfig;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectionFrame, DetectorAdapter, DetectorBackend,
    LabelMap, RawModelOutput,
};
pub use frame::Frame;
pub use gesture::{GestureSettings, TapOutcome, TapRecognizer};
pub use ingest::{CameraSource, SourceSettings};
pub use overlay::{LabeledBox, LatestBoxes, OverlaySink};
pub use policy::{
    Announcement, AnnouncementKind, AnnouncementPolicy, Language, Phrasebook, PolicySettings,
    PolicyState, Priority, PrioritySet,
};
pub use session::{Session, SessionEvent, SessionStats};
pub use speech::{MemorySpeech, SpeechSink, SpeechWorker};
