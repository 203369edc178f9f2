//! announcerd - detection announcer daemon
//!
//! This daemon:
//! 1. Captures frames from the configured source (synthetic or image directory)
//! 2. Offers them to a single session loop, dropping frames while it is busy
//! 3. Runs detection, overlay and the announcement policy on each frame
//! 4. Speaks announcements through the configured synthesizer
//! 5. Treats every line on stdin as a tap for the voice toggle
//! 6. Stops on Ctrl-C

use anyhow::{anyhow, Context, Result};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use detection_announcer::session::{self, SessionEvent};
use detection_announcer::{
    speech, AnnouncerConfig, CameraSource, Clock, MonotonicClock, Session,
};

const EVENT_QUEUE: usize = 4;
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = AnnouncerConfig::load()?;
    let clock = Arc::new(MonotonicClock::new());

    // The source is opened here, before any producer thread holds a sender.
    let source = CameraSource::open(cfg.source.clone())?;
    let frame_interval = Duration::from_millis(1000 / u64::from(cfg.source.target_fps.max(1)));

    let mut session = Session::from_config(&cfg, Box::new(clock.clone()))?;
    match speech::init(&cfg.speech) {
        Ok(Some(worker)) => {
            log::info!("speech engine: {}", worker.engine());
            session = session.with_speech(Box::new(worker));
        }
        Ok(None) => {}
        Err(e) => log::warn!("speech unavailable, continuing without voice: {:#}", e),
    }
    session.announce_startup();

    let (tx, rx) = session::channel(EVENT_QUEUE);
    let running = Arc::new(AtomicBool::new(true));

    {
        let tx = tx.clone();
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            let _ = tx.send(SessionEvent::Shutdown);
        })
        .context("error setting Ctrl-C handler")?;
    }

    let capture = {
        let tx = tx.clone();
        let running = running.clone();
        let clock = clock.clone();
        thread::Builder::new()
            .name("capture".into())
            .spawn(move || capture_loop(source, frame_interval, clock, tx, running))?
    };

    {
        let tx = tx.clone();
        let clock = clock.clone();
        thread::Builder::new().name("taps".into()).spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if line.is_err() {
                    break;
                }
                if tx.send(SessionEvent::Tap { at_ms: clock.now_ms() }).is_err() {
                    break;
                }
            }
        })?;
    }
    drop(tx);

    log::info!(
        "announcerd running: source={} backend={} language={:?}",
        cfg.source.url,
        cfg.detector.backend,
        cfg.language
    );
    session.run(rx);

    running.store(false, Ordering::SeqCst);
    capture
        .join()
        .map_err(|_| anyhow!("capture thread panicked"))?;
    Ok(())
}

fn capture_loop(
    mut source: CameraSource,
    frame_interval: Duration,
    clock: Arc<MonotonicClock>,
    tx: crossbeam_channel::Sender<SessionEvent>,
    running: Arc<AtomicBool>,
) {
    let mut dropped = 0u64;
    let mut last_health_log = Instant::now();

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        match source.next_frame(clock.now_ms()) {
            Ok(frame) => {
                if !session::offer_frame(&tx, frame) {
                    dropped += 1;
                }
            }
            Err(e) => log::warn!("frame capture failed: {:#}", e),
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = source.stats();
            log::info!(
                "source frames={} dropped={} url={}",
                stats.frames_captured,
                dropped,
                stats.url
            );
            last_health_log = Instant::now();
        }

        if let Some(rest) = frame_interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
    let _ = tx.send(SessionEvent::Shutdown);
}
