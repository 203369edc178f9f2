//! Replay a recorded detection script through the announcement policy.
//!
//! The script is JSON:
//!
//! ```json
//! {
//!   "voice_enabled": true,
//!   "events": [
//!     { "kind": "frame", "at_ms": 0, "detections": [{ "label": "Araba", "score": 0.9 }] },
//!     { "kind": "tap", "at_ms": 1200 }
//!   ]
//! }
//! ```
//!
//! Each frame's detections go through the same score threshold and top-K cut
//! as live inference, then through the policy. Spoken lines are printed.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use detection_announcer::{
    AnnouncerConfig, BoundingBox, Detection, DetectionFrame, ManualClock, MemorySpeech, Session,
    TapOutcome,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a detection script through the announcement policy")]
struct Args {
    /// Path to the JSON replay script.
    script: PathBuf,

    /// Config file (JSON or TOML). Defaults apply when omitted.
    #[arg(long, env = "ANNOUNCER_CONFIG")]
    config: Option<PathBuf>,

    /// Emit one JSON object per spoken line instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct Script {
    voice_enabled: Option<bool>,
    events: Vec<ScriptEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScriptEvent {
    Frame {
        at_ms: u64,
        #[serde(default)]
        detections: Vec<ScriptDetection>,
    },
    Tap {
        at_ms: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ScriptDetection {
    label: String,
    score: f32,
    #[serde(default)]
    bbox: Option<BoundingBox>,
}

#[derive(Debug, Serialize)]
struct ReplayLine<'a> {
    at_ms: u64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => AnnouncerConfig::load_from(path)?,
        None => AnnouncerConfig::load()?,
    };
    let raw = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&raw)
        .with_context(|| format!("invalid script {}", args.script.display()))?;

    let clock = ManualClock::new(0);
    let speech = MemorySpeech::new();
    let mut session = Session::from_config(&cfg, Box::new(clock.clone()))?
        .with_speech(Box::new(speech.clone()))
        .with_voice_enabled(script.voice_enabled.unwrap_or(cfg.voice_enabled));

    let adapter = cfg.detector.adapter;
    for event in script.events {
        match event {
            ScriptEvent::Frame { at_ms, detections } => {
                clock.set(at_ms);
                let detections = detections
                    .into_iter()
                    .filter(|d| d.score > adapter.score_threshold)
                    .map(|d| Detection::new(d.label, d.score, d.bbox.unwrap_or_default()))
                    .collect();
                let frame = DetectionFrame::ranked(detections, adapter.top_k);
                if let Some(announcement) = session.handle_detections(&frame, at_ms) {
                    print_line(
                        &args,
                        &ReplayLine {
                            at_ms,
                            text: &announcement.text,
                            label: Some(&announcement.label),
                            confidence: Some(announcement.confidence),
                        },
                    )?;
                }
            }
            ScriptEvent::Tap { at_ms } => {
                clock.set(at_ms);
                if session.handle_tap(at_ms) == TapOutcome::Fired {
                    // The toggle confirmation is the last thing spoken.
                    if let Some(text) = speech.texts().last() {
                        print_line(
                            &args,
                            &ReplayLine {
                                at_ms,
                                text,
                                label: None,
                                confidence: None,
                            },
                        )?;
                    }
                }
            }
        }
    }

    let stats = session.stats();
    log::info!(
        "replay finished: announcements={} toggles={}",
        stats.announcements,
        stats.toggles
    );
    Ok(())
}

fn print_line(args: &Args, line: &ReplayLine<'_>) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string(line)?);
    } else {
        println!("[{:>8}ms] {}", line.at_ms, line.text);
    }
    Ok(())
}
