use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawModelOutput;

enum Scripted {
    Output(RawModelOutput),
    Failure(String),
}

/// Backend that replays queued model outputs, one per `detect` call.
///
/// An exhausted script yields empty output. Queue entries through the
/// `ScriptHandle`, which stays usable after the backend is moved into a registry.
pub struct ScriptedBackend {
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

/// Shared handle for feeding a `ScriptedBackend`.
#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            script: self.script.clone(),
        }
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHandle {
    pub fn push(&self, output: RawModelOutput) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Output(output));
        }
    }

    /// Queue a model failure for the next call.
    pub fn push_failure(&self, reason: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Failure(reason.into()));
        }
    }

    pub fn pending(&self) -> usize {
        self.script.lock().map(|script| script.len()).unwrap_or(0)
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<RawModelOutput> {
        let next = self
            .script
            .lock()
            .map_err(|_| anyhow!("script lock poisoned"))?
            .pop_front();
        match next {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Failure(reason)) => Err(anyhow!("scripted model failure: {}", reason)),
            None => Ok(RawModelOutput::default()),
        }
    }
}
