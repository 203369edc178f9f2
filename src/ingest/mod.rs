//! Frame ingestion sources.
//!
//! Camera acquisition lives outside the announcement core; these sources exist
//! so the daemon can run end to end:
//! - Synthetic scenes for `stub://` URLs (always available)
//! - A local directory of images (feature: ingest-image)
//!
//! Sources only produce frames. Pacing to `target_fps` is left to the caller.

#[cfg(feature = "ingest-image")]
mod image_dir;
mod synthetic;

use anyhow::Result;

#[cfg(feature = "ingest-image")]
use image_dir::ImageDirSource;
use synthetic::SyntheticSource;

use crate::frame::Frame;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSettings {
    /// `stub://name` for a synthetic scene, otherwise a local image directory.
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: "stub://camera".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// Camera frame source.
pub struct CameraSource {
    backend: SourceBackend,
}

enum SourceBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-image")]
    ImageDir(ImageDirSource),
}

impl CameraSource {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        if settings.url.starts_with("stub://") {
            Ok(Self {
                backend: SourceBackend::Synthetic(SyntheticSource::new(settings)),
            })
        } else {
            #[cfg(feature = "ingest-image")]
            {
                Ok(Self {
                    backend: SourceBackend::ImageDir(ImageDirSource::new(settings)?),
                })
            }
            #[cfg(not(feature = "ingest-image"))]
            {
                anyhow::bail!(
                    "source {} requires the ingest-image feature",
                    settings.url
                )
            }
        }
    }

    /// Build and connect a source in one step.
    pub fn open(settings: SourceSettings) -> Result<Self> {
        let mut source = Self::new(settings)?;
        source.connect()?;
        Ok(source)
    }

    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.connect(),
        }
    }

    /// Capture the next frame, stamped with `now_ms`.
    pub fn next_frame(&mut self, now_ms: u64) -> Result<Frame> {
        match &mut self.backend {
            SourceBackend::Synthetic(source) => source.next_frame(now_ms),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.next_frame(now_ms),
        }
    }

    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            SourceBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-image")]
            SourceBackend::ImageDir(source) => source.stats(),
        }
    }
}
