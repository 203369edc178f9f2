use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostOutcome {
    /// Slot was empty; the utterance is now pending.
    Queued,
    /// An unsent utterance was discarded in favour of this one.
    Replaced,
    /// Slot was occupied and the post did not ask to flush; the new utterance was dropped.
    Dropped,
    /// Mailbox is closed.
    Closed,
}

#[derive(Default)]
struct Slot {
    pending: Option<String>,
    interrupt: bool,
    closed: bool,
}

/// Single-slot mailbox between the session and the speech worker.
///
/// Holds at most one unsent utterance. A flushing post replaces whatever is
/// pending and raises the interrupt flag so the utterance currently being
/// spoken is cut short.
#[derive(Default)]
pub struct SpeechMailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl SpeechMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn post(&self, text: String, flush_pending: bool) -> PostOutcome {
        let mut slot = self.lock();
        if slot.closed {
            return PostOutcome::Closed;
        }
        let outcome = match (slot.pending.is_some(), flush_pending) {
            (false, _) => PostOutcome::Queued,
            (true, true) => PostOutcome::Replaced,
            (true, false) => return PostOutcome::Dropped,
        };
        slot.pending = Some(text);
        if flush_pending {
            slot.interrupt = true;
        }
        drop(slot);
        self.ready.notify_one();
        outcome
    }

    /// Block until an utterance is pending or the mailbox is closed.
    pub fn take(&self) -> Option<String> {
        let mut slot = self.lock();
        loop {
            if let Some(text) = slot.pending.take() {
                slot.interrupt = false;
                return Some(text);
            }
            if slot.closed {
                return None;
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    #[cfg(test)]
    fn try_take(&self) -> Option<String> {
        let mut slot = self.lock();
        let text = slot.pending.take();
        if text.is_some() {
            slot.interrupt = false;
        }
        text
    }

    /// True when a flushing post arrived after the last `take`.
    pub fn should_interrupt(&self) -> bool {
        let slot = self.lock();
        slot.interrupt || slot.closed
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn newest_flush_replaces_unsent_utterance() {
        let mailbox = SpeechMailbox::new();
        assert_eq!(mailbox.post("one".into(), true), PostOutcome::Queued);
        assert_eq!(mailbox.post("two".into(), true), PostOutcome::Replaced);
        assert!(mailbox.should_interrupt());
        assert_eq!(mailbox.try_take().as_deref(), Some("two"));
        assert!(!mailbox.should_interrupt());
        assert_eq!(mailbox.try_take(), None);
    }

    #[test]
    fn non_flushing_post_never_displaces() {
        let mailbox = SpeechMailbox::new();
        mailbox.post("first".into(), false);
        assert!(!mailbox.should_interrupt());
        assert_eq!(mailbox.post("second".into(), false), PostOutcome::Dropped);
        assert_eq!(mailbox.try_take().as_deref(), Some("first"));
    }

    #[test]
    fn take_wakes_on_post_and_close() {
        let mailbox = Arc::new(SpeechMailbox::new());
        let worker = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                let mut heard = Vec::new();
                while let Some(text) = mailbox.take() {
                    heard.push(text);
                }
                heard
            })
        };
        mailbox.post("merhaba".into(), true);
        while mailbox.is_pending() {
            thread::yield_now();
        }
        mailbox.close();
        assert_eq!(mailbox.post("late".into(), true), PostOutcome::Closed);
        assert_eq!(worker.join().unwrap(), vec!["merhaba".to_string()]);
    }
}
