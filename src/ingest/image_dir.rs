//! Directory-of-images frame source.
//!
//! Replays the JPEG/PNG files of a local directory in name order, looping at
//! the end. Every image is decoded to RGB and resized to the configured frame
//! size so fixed-input backends accept it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use super::{SourceSettings, SourceStats};
use crate::frame::Frame;

pub(crate) struct ImageDirSource {
    settings: SourceSettings,
    files: Vec<PathBuf>,
    cursor: usize,
    frame_count: u64,
}

impl ImageDirSource {
    pub(crate) fn new(settings: SourceSettings) -> Result<Self> {
        let dir = Path::new(&settings.url);
        if !dir.is_dir() {
            return Err(anyhow!("image source {} is not a directory", dir.display()));
        }
        Ok(Self {
            settings,
            files: Vec::new(),
            cursor: 0,
            frame_count: 0,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        let dir = Path::new(&self.settings.url);
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no .jpg/.jpeg/.png files in {}", dir.display()));
        }
        log::info!(
            "camera source: {} images from {}",
            files.len(),
            dir.display()
        );
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    pub(crate) fn next_frame(&mut self, now_ms: u64) -> Result<Frame> {
        let path = self
            .files
            .get(self.cursor)
            .ok_or_else(|| anyhow!("image source not connected"))?
            .clone();
        self.cursor = (self.cursor + 1) % self.files.len();
        self.frame_count += 1;

        let decoded = image::open(&path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        let resized = image::imageops::resize(
            &decoded,
            self.settings.width,
            self.settings.height,
            FilterType::Triangle,
        );
        Frame::new(
            resized.into_raw(),
            self.settings.width,
            self.settings.height,
            now_ms,
        )
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.settings.url.clone(),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}
