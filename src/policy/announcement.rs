use std::collections::HashSet;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::UNKNOWN_LABEL;

/// Labels treated as safety-relevant by default.
pub const DEFAULT_PRIORITY_LABELS: &[&str] = &[
    "Kişi",
    "Araba",
    "Motosiklet",
    "Bisiklet",
    "Kedi",
    "Köpek",
    "Trafik Işığı",
    "Dur Tabelası",
    "Merdiven",
    "Kapı",
];

/// Fixed set of labels that get shorter repeat cooldowns and emphasized phrasing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrioritySet {
    labels: HashSet<String>,
}

impl PrioritySet {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for PrioritySet {
    fn default() -> Self {
        Self::from_labels(DEFAULT_PRIORITY_LABELS.iter().copied())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Important,
    Normal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AnnouncementKind {
    /// First announcement of a label after a different one.
    NewObject,
    /// Repeat announcement; `repeat` counts from 1.
    Repeat { repeat: u32 },
}

/// One spoken notification decided by the policy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Announcement {
    pub text: String,
    pub label: String,
    pub confidence: f32,
    pub priority: Priority,
    pub kind: AnnouncementKind,
}

/// Integer percentage of a `[0,1]` score, truncated.
pub fn confidence_percent(score: f32) -> u32 {
    (score * 100.0) as u32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tr" | "tr-tr" | "turkish" => Ok(Language::Turkish),
            "en" | "en-us" | "en-gb" | "english" => Ok(Language::English),
            other => Err(anyhow!("unsupported language '{}' (expected tr or en)", other)),
        }
    }
}

/// Spoken phrases for one language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Phrasebook {
    language: Language,
}

impl Phrasebook {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn detection(&self, label: &str, percent: u32, priority: Priority) -> String {
        match (self.language, priority) {
            (Language::Turkish, Priority::Important) => {
                format!("Dikkat! {} tespit edildi, güven: %{}", label, percent)
            }
            (Language::Turkish, Priority::Normal) => {
                format!("{} tespit edildi, güven: %{}", label, percent)
            }
            (Language::English, Priority::Important) => {
                format!("Attention! {} detected, confidence: {}%", label, percent)
            }
            (Language::English, Priority::Normal) => {
                format!("{} detected, confidence: {}%", label, percent)
            }
        }
    }

    /// Label spoken for class indices missing from the label map.
    pub fn unknown_label(&self) -> &'static str {
        match self.language {
            Language::Turkish => UNKNOWN_LABEL,
            Language::English => "Unknown",
        }
    }

    pub fn voice_toggled(&self, enabled: bool) -> &'static str {
        match (self.language, enabled) {
            (Language::Turkish, true) => {
                "Sesli bildirim açıldı. Önemli nesneler için daha sık bildirim verilecek."
            }
            (Language::Turkish, false) => "Sesli bildirim kapatıldı",
            (Language::English, true) => {
                "Voice announcements on. Important objects will be announced more often."
            }
            (Language::English, false) => "Voice announcements off",
        }
    }

    pub fn startup_hint(&self, taps_to_toggle: u32) -> String {
        match self.language {
            Language::Turkish => format!(
                "Nesne tespiti uygulaması başlatıldı. Sesli bildirimi açmak veya kapatmak için ekrana {} kez dokunun.",
                taps_to_toggle
            ),
            Language::English => format!(
                "Object detection started. Tap the screen {} times to turn voice announcements on or off.",
                taps_to_toggle
            ),
        }
    }
}
