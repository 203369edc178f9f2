use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const TEXT_PLACEHOLDER: &str = "{text}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SayOutcome {
    Completed,
    Interrupted,
}

/// Text-to-speech engine driven by the speech worker.
pub trait Synthesizer: Send {
    fn name(&self) -> &'static str;

    /// Speak `text`, returning early once `interrupted` reports true.
    fn say(&mut self, text: &str, interrupted: &dyn Fn() -> bool) -> Result<SayOutcome>;
}

/// Synthesizer that only logs what would be spoken.
#[derive(Default)]
pub struct LogSynthesizer;

impl Synthesizer for LogSynthesizer {
    fn name(&self) -> &'static str {
        "log"
    }

    fn say(&mut self, text: &str, _interrupted: &dyn Fn() -> bool) -> Result<SayOutcome> {
        log::info!("speak: {}", text);
        Ok(SayOutcome::Completed)
    }
}

/// Synthesizer that runs an external TTS program per utterance.
///
/// The command is an argv template such as `espeak-ng -v tr {text}`. The
/// `{text}` argument is replaced by the utterance; without a placeholder the
/// utterance is appended as the last argument. An interrupted utterance kills
/// the child process.
#[derive(Debug)]
pub struct CommandSynthesizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSynthesizer {
    /// Parse the template and resolve the program on `PATH`.
    pub fn new(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("speech command is empty"))?;
        let program = which::which(program)
            .with_context(|| format!("speech program '{}' not found", program))?;
        let mut args: Vec<String> = parts.map(str::to_string).collect();
        if !args.iter().any(|arg| arg == TEXT_PLACEHOLDER) {
            args.push(TEXT_PLACEHOLDER.to_string());
        }
        Ok(Self { program, args })
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn argv(&self, text: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                if arg == TEXT_PLACEHOLDER {
                    text.to_string()
                } else {
                    arg.clone()
                }
            })
            .collect()
    }
}

impl Synthesizer for CommandSynthesizer {
    fn name(&self) -> &'static str {
        "command"
    }

    fn say(&mut self, text: &str, interrupted: &dyn Fn() -> bool) -> Result<SayOutcome> {
        let mut child = Command::new(&self.program)
            .args(self.argv(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        loop {
            if let Some(status) = child.try_wait().context("failed to poll speech process")? {
                if !status.success() {
                    log::warn!("{} exited with {}", self.program.display(), status);
                }
                return Ok(SayOutcome::Completed);
            }
            if interrupted() {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(SayOutcome::Interrupted);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
