use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use detection_announcer::config::AnnouncerConfig;
use detection_announcer::Language;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ANNOUNCER_CONFIG",
        "ANNOUNCER_SOURCE_URL",
        "ANNOUNCER_BACKEND",
        "ANNOUNCER_MODEL_PATH",
        "ANNOUNCER_LANGUAGE",
        "ANNOUNCER_SPEECH_COMMAND",
        "ANNOUNCER_MIN_CONFIDENCE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "language": "en",
        "voice_enabled": false,
        "detector": { "backend": "stub", "score_threshold": 0.5, "top_k": 5 },
        "policy": {
            "min_confidence": 0.8,
            "detection_cooldown_ms": 6000,
            "priority_labels": ["Kişi", "  Araba ", ""]
        },
        "gesture": { "taps_to_toggle": 2, "haptic_ms": 150 },
        "source": { "url": "stub://hall", "target_fps": 12, "width": 800, "height": 600 }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("ANNOUNCER_CONFIG", file.path());
    std::env::set_var("ANNOUNCER_SOURCE_URL", "stub://porch");
    std::env::set_var("ANNOUNCER_MIN_CONFIDENCE", "0.75");

    let cfg = AnnouncerConfig::load().expect("load config");

    assert_eq!(cfg.language, Language::English);
    assert!(!cfg.voice_enabled);
    assert_eq!(cfg.detector.backend, "stub");
    assert_eq!(cfg.detector.adapter.score_threshold, 0.5);
    assert_eq!(cfg.detector.adapter.top_k, 5);
    assert_eq!(cfg.policy.min_confidence, 0.75);
    assert_eq!(cfg.policy.detection_cooldown_ms, 6000);
    assert_eq!(cfg.policy.speech_cooldown_ms, 3000);
    assert_eq!(cfg.priority_labels, vec!["Kişi", "Araba"]);
    assert_eq!(cfg.gesture.taps_to_toggle, 2);
    assert_eq!(cfg.gesture.haptic_pulse.as_millis(), 150);
    assert_eq!(cfg.gesture.tap_timeout_ms, 1000);
    assert_eq!(cfg.source.url, "stub://porch");
    assert_eq!(cfg.source.target_fps, 12);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);

    clear_env();
}

#[test]
fn loads_toml_config_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
language = "tr"

[policy]
repeat_backoff_ms = 1500
max_consecutive_same_object = 2

[speech]
enabled = false
"#;
    file.write_all(toml.as_bytes()).expect("write config");

    let cfg = AnnouncerConfig::load_from(file.path()).expect("load config");

    assert_eq!(cfg.language, Language::Turkish);
    assert_eq!(cfg.policy.repeat_backoff_ms, 1500);
    assert_eq!(cfg.policy.max_consecutive_same_object, 2);
    assert!(cfg.speech.disabled);
    assert!(cfg.priority_set().contains("Köpek"));

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{ "detector": { "score_threshold": 1.4 } }"#)
        .expect("write config");
    assert!(AnnouncerConfig::load_from(file.path()).is_err());

    std::env::set_var("ANNOUNCER_MIN_CONFIDENCE", "high");
    assert!(AnnouncerConfig::load().is_err());
    std::env::remove_var("ANNOUNCER_MIN_CONFIDENCE");

    std::env::set_var("ANNOUNCER_LANGUAGE", "de");
    assert!(AnnouncerConfig::load().is_err());

    clear_env();
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    std::env::set_var("ANNOUNCER_CONFIG", "/nonexistent/announcer.json");
    let err = AnnouncerConfig::load().expect_err("missing file");
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
