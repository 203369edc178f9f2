//! Frame-processing session.
//!
//! The session owns the only `PolicyState` and is driven by one consumer loop.
//! Camera frames and tap events arrive on a single bounded channel; frames are
//! offered with `try_send` and dropped while the session is busy, taps are
//! always delivered.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::clock::Clock;
use crate::config::AnnouncerConfig;
#[cfg(feature = "backend-tract")]
use crate::detect::TractBackend;
use crate::detect::{BackendRegistry, DetectionFrame, DetectorAdapter, LabelMap, StubBackend};
use crate::frame::Frame;
use crate::gesture::{TapOutcome, TapRecognizer};
use crate::haptics::{Haptics, LogHaptics};
use crate::overlay::{LabeledBox, LogOverlay, OverlaySink};
use crate::policy::{Announcement, AnnouncementPolicy, Phrasebook, PolicyState};
use crate::speech::SpeechSink;

/// Events delivered to the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    Frame(Frame),
    Tap { at_ms: u64 },
    Shutdown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub skipped_frames: u64,
    pub announcements: u64,
    pub toggles: u64,
}

/// Bounded event channel feeding a session.
pub fn channel(capacity: usize) -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    crossbeam_channel::bounded(capacity)
}

/// Offer a frame without blocking. Returns false when it was dropped.
pub fn offer_frame(tx: &Sender<SessionEvent>, frame: Frame) -> bool {
    match tx.try_send(SessionEvent::Frame(frame)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::trace!("session busy, frame dropped");
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

/// Register the backends available to this build.
///
/// `stub` is always present; `tract` is added when the feature is enabled and a
/// model path is configured.
pub fn registry_for(cfg: &AnnouncerConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());
    #[cfg(feature = "backend-tract")]
    if let Some(path) = &cfg.detector.model_path {
        registry.register(TractBackend::new(path, cfg.source.width, cfg.source.height)?);
    }
    #[cfg(not(feature = "backend-tract"))]
    if cfg.detector.model_path.is_some() {
        log::warn!("model_path ignored: built without the backend-tract feature");
    }
    Ok(registry)
}

pub struct Session {
    adapter: DetectorAdapter,
    policy: AnnouncementPolicy,
    recognizer: TapRecognizer,
    state: PolicyState,
    clock: Box<dyn Clock>,
    overlay: Box<dyn OverlaySink>,
    speech: Option<Box<dyn SpeechSink>>,
    haptics: Box<dyn Haptics>,
    stats: SessionStats,
}

impl Session {
    pub fn new(
        adapter: DetectorAdapter,
        policy: AnnouncementPolicy,
        recognizer: TapRecognizer,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            adapter,
            policy,
            recognizer,
            state: PolicyState::default(),
            clock,
            overlay: Box::new(LogOverlay),
            speech: None,
            haptics: Box::new(LogHaptics),
            stats: SessionStats::default(),
        }
    }

    /// Build a session from configuration. Speech is attached separately.
    pub fn from_config(cfg: &AnnouncerConfig, clock: Box<dyn Clock>) -> Result<Self> {
        let registry = registry_for(cfg)?;
        let backend = registry.select(&cfg.detector.backend)?;
        let phrasebook = Phrasebook::new(cfg.language);
        let labels = match &cfg.labels_path {
            Some(path) => LabelMap::load(path)?,
            None => LabelMap::bundled(),
        }
        .with_unknown(phrasebook.unknown_label());
        let adapter = DetectorAdapter::new(backend, labels, cfg.detector.adapter);
        log::info!("detector backend: {}", adapter.backend_name()?);
        let policy = AnnouncementPolicy::new(cfg.policy, cfg.priority_set(), phrasebook);
        Ok(Self::new(adapter, policy, TapRecognizer::new(cfg.gesture), clock)
            .with_voice_enabled(cfg.voice_enabled))
    }

    pub fn with_overlay(mut self, overlay: Box<dyn OverlaySink>) -> Self {
        self.overlay = overlay;
        self
    }

    /// Attach speech output. Without it announcements are never decided.
    pub fn with_speech(mut self, speech: Box<dyn SpeechSink>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_haptics(mut self, haptics: Box<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn with_voice_enabled(mut self, enabled: bool) -> Self {
        self.state.voice_enabled = enabled;
        self
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    /// Speak the usage hint once speech is available.
    pub fn announce_startup(&self) {
        if let Some(speech) = &self.speech {
            let hint = self
                .policy
                .phrasebook()
                .startup_hint(self.recognizer.settings().taps_to_toggle);
            speech.speak(&hint, true);
        }
    }

    /// Detect, render and possibly announce one frame.
    ///
    /// A failed inference skips the frame; the session carries on with the next.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<Announcement> {
        self.stats.frames += 1;
        let detections = match self.adapter.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.stats.skipped_frames += 1;
                log::warn!("frame skipped: {:#}", e);
                return None;
            }
        };
        log::debug!(
            "frame {}x{} at {}ms: {} detections",
            frame.width,
            frame.height,
            frame.captured_at_ms,
            detections.len()
        );
        self.overlay.render_boxes(&LabeledBox::from_frame(&detections));
        let now_ms = self.clock.now_ms();
        self.handle_detections(&detections, now_ms)
    }

    /// Run the announcement policy on an already-detected frame.
    pub fn handle_detections(
        &mut self,
        detections: &DetectionFrame,
        now_ms: u64,
    ) -> Option<Announcement> {
        let speech = self.speech.as_ref()?;
        let announcement = self.policy.decide(detections, now_ms, &mut self.state)?;
        log::info!(
            "announce {:?} {} ({:.2}) at {}ms",
            announcement.kind,
            announcement.label,
            announcement.confidence,
            now_ms
        );
        speech.speak(&announcement.text, true);
        self.stats.announcements += 1;
        Some(announcement)
    }

    pub fn handle_tap(&mut self, at_ms: u64) -> TapOutcome {
        let outcome = self.recognizer.on_tap(&mut self.state.tap, at_ms);
        if outcome == TapOutcome::Fired {
            self.toggle_voice();
        }
        outcome
    }

    fn toggle_voice(&mut self) {
        self.state.voice_enabled = !self.state.voice_enabled;
        self.stats.toggles += 1;
        self.haptics.pulse(self.recognizer.settings().haptic_pulse);
        let enabled = self.state.voice_enabled;
        log::info!("voice announcements {}", if enabled { "on" } else { "off" });
        if let Some(speech) = &self.speech {
            speech.speak(self.policy.phrasebook().voice_toggled(enabled), true);
        }
    }

    /// Consume events until `Shutdown` or until every sender is gone.
    pub fn run(mut self, events: Receiver<SessionEvent>) -> SessionStats {
        for event in events.iter() {
            match event {
                SessionEvent::Frame(frame) => {
                    self.process_frame(&frame);
                }
                SessionEvent::Tap { at_ms } => {
                    self.handle_tap(at_ms);
                }
                SessionEvent::Shutdown => break,
            }
        }
        log::info!(
            "session finished: frames={} skipped={} announcements={} toggles={}",
            self.stats.frames,
            self.stats.skipped_frames,
            self.stats.announcements,
            self.stats.toggles
        );
        self.stats
    }
}
