use crate::detect::{Detection, DetectionFrame};
use crate::policy::announcement::{
    confidence_percent, Announcement, AnnouncementKind, Phrasebook, Priority, PrioritySet,
};
use crate::policy::state::PolicyState;

pub const MIN_CONFIDENCE_SCORE: f32 = 0.7;
pub const SPEECH_COOLDOWN_MS: u64 = 3_000;
pub const DETECTION_COOLDOWN_MS: u64 = 5_000;
pub const REPEAT_BACKOFF_MS: u64 = 2_000;
pub const MAX_CONSECUTIVE_SAME_OBJECT: u32 = 3;

/// Timing and confidence knobs of the announcement policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicySettings {
    pub min_confidence: f32,
    /// Minimum gap before a different label may be announced.
    pub speech_cooldown_ms: u64,
    /// Base repeat cooldown for ordinary labels; priority labels use half.
    pub detection_cooldown_ms: u64,
    /// Added to the repeat cooldown for every repeat already announced.
    pub repeat_backoff_ms: u64,
    pub max_consecutive_same_object: u32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE_SCORE,
            speech_cooldown_ms: SPEECH_COOLDOWN_MS,
            detection_cooldown_ms: DETECTION_COOLDOWN_MS,
            repeat_backoff_ms: REPEAT_BACKOFF_MS,
            max_consecutive_same_object: MAX_CONSECUTIVE_SAME_OBJECT,
        }
    }
}

/// Decides which frames produce a spoken announcement.
///
/// Stateless itself: every decision reads and updates the caller's `PolicyState`.
#[derive(Clone, Debug, Default)]
pub struct AnnouncementPolicy {
    settings: PolicySettings,
    priority: PrioritySet,
    phrasebook: Phrasebook,
}

impl AnnouncementPolicy {
    pub fn new(settings: PolicySettings, priority: PrioritySet, phrasebook: Phrasebook) -> Self {
        Self {
            settings,
            priority,
            phrasebook,
        }
    }

    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    pub fn phrasebook(&self) -> &Phrasebook {
        &self.phrasebook
    }

    pub fn is_priority(&self, label: &str) -> bool {
        self.priority.contains(label)
    }

    /// Consider one frame. Returns at most one announcement.
    ///
    /// State is only modified when an announcement is emitted.
    pub fn decide(
        &self,
        frame: &DetectionFrame,
        now_ms: u64,
        state: &mut PolicyState,
    ) -> Option<Announcement> {
        if !state.voice_enabled {
            return None;
        }
        let best = frame.best()?;
        if !best.score.is_finite() || best.score < self.settings.min_confidence {
            return None;
        }
        let priority = if self.is_priority(&best.label) {
            Priority::Important
        } else {
            Priority::Normal
        };

        if state.last_announced_label.as_deref() != Some(best.label.as_str()) {
            if !elapsed_beyond(
                state.last_announcement_ms,
                now_ms,
                self.settings.speech_cooldown_ms,
            ) {
                log::debug!("{} dropped: speech cooldown active", best.label);
                return None;
            }
            state.last_announced_label = Some(best.label.clone());
            state.consecutive_repeat_count = 0;
            state.last_announcement_ms = Some(now_ms);
            state.last_same_object_ms = Some(now_ms);
            return Some(self.announce(best, priority, AnnouncementKind::NewObject));
        }

        let repeats = state.consecutive_repeat_count;
        if repeats >= self.settings.max_consecutive_same_object {
            return None;
        }
        if !elapsed_beyond(
            state.last_same_object_ms,
            now_ms,
            self.required_gap_ms(priority, repeats),
        ) {
            return None;
        }
        state.consecutive_repeat_count = repeats + 1;
        state.last_same_object_ms = Some(now_ms);
        Some(self.announce(
            best,
            priority,
            AnnouncementKind::Repeat {
                repeat: repeats + 1,
            },
        ))
    }

    /// Gap required before the next repeat of a label already repeated `repeats` times.
    pub fn required_gap_ms(&self, priority: Priority, repeats: u32) -> u64 {
        let base = match priority {
            Priority::Important => self.settings.detection_cooldown_ms / 2,
            Priority::Normal => self.settings.detection_cooldown_ms,
        };
        base.saturating_add(u64::from(repeats).saturating_mul(self.settings.repeat_backoff_ms))
    }

    fn announce(
        &self,
        detection: &Detection,
        priority: Priority,
        kind: AnnouncementKind,
    ) -> Announcement {
        let text = self.phrasebook.detection(
            &detection.label,
            confidence_percent(detection.score),
            priority,
        );
        Announcement {
            text,
            label: detection.label.clone(),
            confidence: detection.score,
            priority,
            kind,
        }
    }
}

fn elapsed_beyond(since_ms: Option<u64>, now_ms: u64, gap_ms: u64) -> bool {
    match since_ms {
        Some(since) => now_ms.saturating_sub(since) > gap_ms,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn frame(label: &str, score: f32) -> DetectionFrame {
        DetectionFrame::ranked(vec![Detection::new(label, score, BoundingBox::default())], 3)
    }

    fn policy() -> AnnouncementPolicy {
        AnnouncementPolicy::default()
    }

    #[test]
    fn empty_frame_and_disabled_voice_emit_nothing() {
        let policy = policy();
        let mut state = PolicyState::default();
        assert!(policy.decide(&DetectionFrame::empty(), 0, &mut state).is_none());

        state.voice_enabled = false;
        assert!(policy.decide(&frame("Araba", 0.9), 10_000, &mut state).is_none());
        assert_eq!(state, PolicyState::new(false));
    }

    #[test]
    fn low_confidence_never_announces() {
        let policy = policy();
        let mut state = PolicyState::default();
        for t in (0..60_000).step_by(700) {
            assert!(policy.decide(&frame("Kedi", 0.69), t, &mut state).is_none());
        }
        assert_eq!(state, PolicyState::default());
    }

    #[test]
    fn confidence_comes_from_best_detection() {
        let policy = policy();
        let mut state = PolicyState::default();
        let frame = DetectionFrame::ranked(
            vec![
                Detection::new("Fincan", 0.65, BoundingBox::default()),
                Detection::new("Araba", 0.62, BoundingBox::default()),
            ],
            3,
        );
        assert!(policy.decide(&frame, 0, &mut state).is_none());
    }

    #[test]
    fn minimum_confidence_is_inclusive() {
        let policy = policy();
        let mut state = PolicyState::default();
        let announcement = policy.decide(&frame("Fincan", 0.7), 0, &mut state);
        assert!(announcement.is_some());
    }

    #[test]
    fn required_gap_grows_with_repeats() {
        let policy = policy();
        assert_eq!(policy.required_gap_ms(Priority::Important, 0), 2_500);
        assert_eq!(policy.required_gap_ms(Priority::Important, 1), 4_500);
        assert_eq!(policy.required_gap_ms(Priority::Normal, 0), 5_000);
        assert_eq!(policy.required_gap_ms(Priority::Normal, 2), 9_000);
        for repeats in 0..5 {
            assert!(
                policy.required_gap_ms(Priority::Normal, repeats + 1)
                    > policy.required_gap_ms(Priority::Normal, repeats)
            );
        }
    }

    #[test]
    fn repeats_stop_at_max_until_label_changes() {
        let policy = policy();
        let mut state = PolicyState::default();
        let mut spoken = 0;
        for t in (0..120_000).step_by(500) {
            if policy.decide(&frame("Fincan", 0.8), t, &mut state).is_some() {
                spoken += 1;
            }
        }
        // One new-object announcement plus three repeats.
        assert_eq!(spoken, 4);
        assert_eq!(state.consecutive_repeat_count, 3);

        let switched = policy.decide(&frame("Kitap", 0.8), 120_500, &mut state);
        assert_eq!(switched.map(|a| a.kind), Some(AnnouncementKind::NewObject));
        assert_eq!(state.consecutive_repeat_count, 0);

        let back = policy.decide(&frame("Fincan", 0.8), 124_000, &mut state);
        assert_eq!(back.map(|a| a.kind), Some(AnnouncementKind::NewObject));
    }

    #[test]
    fn repeat_does_not_restart_speech_cooldown() {
        let policy = policy();
        let mut state = PolicyState::default();
        assert!(policy.decide(&frame("Fincan", 0.8), 0, &mut state).is_some());
        let repeat = policy.decide(&frame("Fincan", 0.8), 5_001, &mut state);
        assert_eq!(
            repeat.map(|a| a.kind),
            Some(AnnouncementKind::Repeat { repeat: 1 })
        );
        assert_eq!(state.last_announcement_ms, Some(0));

        let other = policy.decide(&frame("Kitap", 0.8), 6_000, &mut state);
        assert_eq!(other.map(|a| a.kind), Some(AnnouncementKind::NewObject));
    }

    #[test]
    fn huge_backoff_saturates() {
        let policy = AnnouncementPolicy::new(
            PolicySettings {
                repeat_backoff_ms: u64::MAX,
                ..PolicySettings::default()
            },
            PrioritySet::default(),
            Phrasebook::default(),
        );
        assert_eq!(policy.required_gap_ms(Priority::Normal, 3), u64::MAX);

        let mut state = PolicyState::default();
        assert!(policy.decide(&frame("Fincan", 0.8), 0, &mut state).is_some());
        assert!(policy.decide(&frame("Fincan", 0.8), 5_001, &mut state).is_some());
        assert!(policy.decide(&frame("Fincan", 0.8), u64::MAX, &mut state).is_none());
    }

    #[test]
    fn non_finite_best_score_is_ignored() {
        let policy = policy();
        let mut state = PolicyState::default();
        assert!(policy.decide(&frame("Araba", f32::NAN), 0, &mut state).is_none());
        assert!(policy
            .decide(&frame("Araba", f32::INFINITY), 0, &mut state)
            .is_none());
        assert_eq!(state, PolicyState::default());
    }

    #[test]
    fn normal_labels_use_plain_phrasing() {
        let policy = policy();
        let mut state = PolicyState::default();
        let announcement = policy.decide(&frame("Fincan", 0.75), 0, &mut state).unwrap();
        assert_eq!(announcement.text, "Fincan tespit edildi, güven: %75");
        assert_eq!(announcement.priority, Priority::Normal);
    }

    #[test]
    fn clock_regression_does_not_announce() {
        let policy = policy();
        let mut state = PolicyState::default();
        assert!(policy.decide(&frame("Kedi", 0.9), 10_000, &mut state).is_some());
        assert!(policy.decide(&frame("Köpek", 0.9), 5_000, &mut state).is_none());
    }
}
