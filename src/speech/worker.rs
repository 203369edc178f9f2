use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

use super::mailbox::SpeechMailbox;
use super::synth::{SayOutcome, Synthesizer};
use super::SpeechSink;

/// Background thread that speaks whatever the mailbox holds.
pub struct SpeechWorker {
    mailbox: Arc<SpeechMailbox>,
    handle: Option<JoinHandle<()>>,
    engine: &'static str,
}

impl SpeechWorker {
    pub fn spawn<S: Synthesizer + 'static>(mut synth: S) -> Result<Self> {
        let mailbox = Arc::new(SpeechMailbox::new());
        let engine = synth.name();
        let worker_mailbox = mailbox.clone();
        let handle = thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                while let Some(text) = worker_mailbox.take() {
                    let interrupted = || worker_mailbox.should_interrupt();
                    match synth.say(&text, &interrupted) {
                        Ok(SayOutcome::Completed) => {}
                        Ok(SayOutcome::Interrupted) => {
                            log::debug!("utterance preempted: {}", text);
                        }
                        Err(e) => log::error!("speech failed: {:#}", e),
                    }
                }
            })
            .context("failed to spawn speech worker")?;
        log::info!("speech worker started (engine={})", engine);
        Ok(Self {
            mailbox,
            handle: Some(handle),
            engine,
        })
    }

    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// Stop the worker, abandoning any unsent utterance.
    pub fn shutdown(&mut self) {
        self.mailbox.close();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("speech worker panicked");
            }
        }
    }
}

impl SpeechSink for SpeechWorker {
    fn speak(&self, text: &str, flush_pending: bool) {
        let outcome = self.mailbox.post(text.to_string(), flush_pending);
        log::debug!("speech post {:?}: {}", outcome, text);
    }
}

impl Drop for SpeechWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
