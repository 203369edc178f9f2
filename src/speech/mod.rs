//! Speech output.
//!
//! Announcements are fire-and-forget: the session posts text into a single-slot
//! mailbox and a worker thread feeds it to a synthesizer. Posting with
//! `flush_pending` discards an unsent utterance and preempts the one in
//! progress, so speech never falls behind the camera.

mod mailbox;
mod synth;
mod worker;

use std::sync::{Arc, Mutex};

use anyhow::Result;

pub use mailbox::{PostOutcome, SpeechMailbox};
pub use synth::{CommandSynthesizer, LogSynthesizer, SayOutcome, Synthesizer};
pub use worker::SpeechWorker;

/// Speech boundary.
pub trait SpeechSink: Send {
    fn speak(&self, text: &str, flush_pending: bool);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpeechSettings {
    /// Start with speech disabled entirely.
    pub disabled: bool,
    /// External TTS argv template; `None` logs utterances instead.
    pub command: Option<String>,
}

/// Initialise speech output.
///
/// `Ok(None)` when speech is disabled by configuration. An error means the
/// configured synthesizer is unavailable; callers continue without speech.
pub fn init(settings: &SpeechSettings) -> Result<Option<SpeechWorker>> {
    if settings.disabled {
        log::info!("speech disabled by configuration");
        return Ok(None);
    }
    let worker = match settings.command.as_deref() {
        Some(template) => SpeechWorker::spawn(CommandSynthesizer::new(template)?)?,
        None => SpeechWorker::spawn(LogSynthesizer)?,
    };
    Ok(Some(worker))
}

/// Sink that records every call, for tests and replays.
#[derive(Clone, Default)]
pub struct MemorySpeech {
    spoken: Arc<Mutex<Vec<(String, bool)>>>,
}

impl MemorySpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts spoken so far, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(text, _)| text).collect()
    }

    /// `(text, flush_pending)` pairs, oldest first.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.spoken
            .lock()
            .map(|spoken| spoken.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.clear();
        }
    }
}

impl SpeechSink for MemorySpeech {
    fn speak(&self, text: &str, flush_pending: bool) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push((text.to_string(), flush_pending));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_settings_produce_no_worker() -> Result<()> {
        let settings = SpeechSettings {
            disabled: true,
            command: None,
        };
        assert!(init(&settings)?.is_none());
        Ok(())
    }

    #[test]
    fn missing_command_fails_initialisation() {
        let settings = SpeechSettings {
            disabled: false,
            command: Some("no-such-tts-engine-7731".into()),
        };
        assert!(init(&settings).is_err());
    }

    #[test]
    fn memory_speech_records_calls() {
        let speech = MemorySpeech::new();
        let handle = speech.clone();
        speech.speak("bir", true);
        speech.speak("iki", false);
        assert_eq!(
            handle.calls(),
            vec![("bir".to_string(), true), ("iki".to_string(), false)]
        );
        handle.clear();
        assert!(speech.texts().is_empty());
    }
}
