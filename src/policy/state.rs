/// Session state threaded through the announcement policy and the tap recognizer.
///
/// Owned by a single writer (the session loop). Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyState {
    pub last_announced_label: Option<String>,
    /// Last new-object announcement.
    pub last_announcement_ms: Option<u64>,
    /// Last announcement of the label currently being repeated.
    pub last_same_object_ms: Option<u64>,
    /// Repeat announcements made for `last_announced_label`.
    pub consecutive_repeat_count: u32,
    pub voice_enabled: bool,
    pub tap: TapState,
}

impl PolicyState {
    pub fn new(voice_enabled: bool) -> Self {
        Self {
            last_announced_label: None,
            last_announcement_ms: None,
            last_same_object_ms: None,
            consecutive_repeat_count: 0,
            voice_enabled,
            tap: TapState::default(),
        }
    }
}

impl Default for PolicyState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Transient tap-gesture progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TapState {
    pub count: u32,
    pub last_tap_ms: Option<u64>,
}
