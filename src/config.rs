use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{AdapterSettings, DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K};
use crate::gesture::{GestureSettings, HAPTIC_PULSE, TAPS_TO_TOGGLE, TAP_TIMEOUT_MS};
use crate::ingest::SourceSettings;
use crate::policy::{
    Language, PolicySettings, PrioritySet, DEFAULT_PRIORITY_LABELS, DETECTION_COOLDOWN_MS,
    MAX_CONSECUTIVE_SAME_OBJECT, MIN_CONFIDENCE_SCORE, REPEAT_BACKOFF_MS, SPEECH_COOLDOWN_MS,
};
use crate::speech::SpeechSettings;

const DEFAULT_BACKEND: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct AnnouncerConfigFile {
    labels_path: Option<PathBuf>,
    language: Option<String>,
    voice_enabled: Option<bool>,
    detector: Option<DetectorConfigFile>,
    policy: Option<PolicyConfigFile>,
    gesture: Option<GestureConfigFile>,
    speech: Option<SpeechConfigFile>,
    source: Option<SourceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    score_threshold: Option<f32>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct PolicyConfigFile {
    min_confidence: Option<f32>,
    speech_cooldown_ms: Option<u64>,
    detection_cooldown_ms: Option<u64>,
    repeat_backoff_ms: Option<u64>,
    max_consecutive_same_object: Option<u32>,
    priority_labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct GestureConfigFile {
    tap_timeout_ms: Option<u64>,
    taps_to_toggle: Option<u32>,
    haptic_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SpeechConfigFile {
    enabled: Option<bool>,
    command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    /// Label map file; `None` uses the bundled map.
    pub labels_path: Option<PathBuf>,
    pub language: Language,
    pub voice_enabled: bool,
    pub detector: DetectorSettings,
    pub policy: PolicySettings,
    pub priority_labels: Vec<String>,
    pub gesture: GestureSettings,
    pub speech: SpeechSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub adapter: AdapterSettings,
}

impl AnnouncerConfig {
    /// Load defaults, the file named by `ANNOUNCER_CONFIG` and env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ANNOUNCER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit file, still honouring env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AnnouncerConfigFile) -> Result<Self> {
        let language = match file.language.as_deref() {
            Some(code) => code.parse()?,
            None => Language::default(),
        };
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: detector_file.model_path,
            adapter: AdapterSettings {
                score_threshold: detector_file
                    .score_threshold
                    .unwrap_or(DEFAULT_SCORE_THRESHOLD),
                top_k: detector_file.top_k.unwrap_or(DEFAULT_TOP_K),
            },
        };
        let policy_file = file.policy.unwrap_or_default();
        let policy = PolicySettings {
            min_confidence: policy_file.min_confidence.unwrap_or(MIN_CONFIDENCE_SCORE),
            speech_cooldown_ms: policy_file
                .speech_cooldown_ms
                .unwrap_or(SPEECH_COOLDOWN_MS),
            detection_cooldown_ms: policy_file
                .detection_cooldown_ms
                .unwrap_or(DETECTION_COOLDOWN_MS),
            repeat_backoff_ms: policy_file.repeat_backoff_ms.unwrap_or(REPEAT_BACKOFF_MS),
            max_consecutive_same_object: policy_file
                .max_consecutive_same_object
                .unwrap_or(MAX_CONSECUTIVE_SAME_OBJECT),
        };
        let priority_labels = policy_file.priority_labels.unwrap_or_else(|| {
            DEFAULT_PRIORITY_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect()
        });
        let gesture_file = file.gesture.unwrap_or_default();
        let gesture = GestureSettings {
            tap_timeout_ms: gesture_file.tap_timeout_ms.unwrap_or(TAP_TIMEOUT_MS),
            taps_to_toggle: gesture_file.taps_to_toggle.unwrap_or(TAPS_TO_TOGGLE),
            haptic_pulse: gesture_file
                .haptic_ms
                .map(Duration::from_millis)
                .unwrap_or(HAPTIC_PULSE),
        };
        let speech_file = file.speech.unwrap_or_default();
        let speech = SpeechSettings {
            disabled: !speech_file.enabled.unwrap_or(true),
            command: speech_file.command,
        };
        let defaults = SourceSettings::default();
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            url: source_file.url.unwrap_or(defaults.url),
            target_fps: source_file.target_fps.unwrap_or(defaults.target_fps),
            width: source_file.width.unwrap_or(defaults.width),
            height: source_file.height.unwrap_or(defaults.height),
        };
        Ok(Self {
            labels_path: file.labels_path,
            language,
            voice_enabled: file.voice_enabled.unwrap_or(true),
            detector,
            policy,
            priority_labels,
            gesture,
            speech,
            source,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("ANNOUNCER_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("ANNOUNCER_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("ANNOUNCER_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(language) = std::env::var("ANNOUNCER_LANGUAGE") {
            if !language.trim().is_empty() {
                self.language = language.parse()?;
            }
        }
        if let Ok(command) = std::env::var("ANNOUNCER_SPEECH_COMMAND") {
            if !command.trim().is_empty() {
                self.speech.command = Some(command);
            }
        }
        if let Ok(confidence) = std::env::var("ANNOUNCER_MIN_CONFIDENCE") {
            self.policy.min_confidence = confidence.trim().parse().map_err(|_| {
                anyhow!("ANNOUNCER_MIN_CONFIDENCE must be a number between 0 and 1")
            })?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        check_unit_interval("detector.score_threshold", self.detector.adapter.score_threshold)?;
        check_unit_interval("policy.min_confidence", self.policy.min_confidence)?;
        if self.detector.adapter.top_k == 0 {
            return Err(anyhow!("detector.top_k must be greater than zero"));
        }
        if self.gesture.taps_to_toggle == 0 {
            return Err(anyhow!("gesture.taps_to_toggle must be greater than zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source.target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        self.priority_labels = self
            .priority_labels
            .iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
        Ok(())
    }

    pub fn priority_set(&self) -> PrioritySet {
        PrioritySet::from_labels(self.priority_labels.iter().cloned())
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<AnnouncerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
