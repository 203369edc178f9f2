use anyhow::Result;

use super::{SourceSettings, SourceStats};
use crate::frame::{rgb_len, Frame};

/// Frames per simulated scene.
const SCENE_LENGTH: u64 = 50;

/// Synthetic camera for `stub://` URLs.
///
/// Emits a static scene that changes every `SCENE_LENGTH` frames, so a
/// pixel-driven backend sees stable detections interrupted by occasional
/// "new object" events.
pub(crate) struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    pub(crate) fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
        }
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!("camera source: connected to {} (synthetic)", self.settings.url);
        Ok(())
    }

    pub(crate) fn next_frame(&mut self, now_ms: u64) -> Result<Frame> {
        self.frame_count += 1;
        if self.frame_count % SCENE_LENGTH == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let pixels = self.scene_pixels()?;
        Frame::new(pixels, self.settings.width, self.settings.height, now_ms)
    }

    fn scene_pixels(&self) -> Result<Vec<u8>> {
        let len = rgb_len(self.settings.width, self.settings.height)?;
        let state = self.scene_state as usize;
        Ok((0..len).map(|i| ((i + state * 31) % 256) as u8).collect())
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.settings.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SourceSettings {
        SourceSettings {
            url: "stub://test".into(),
            target_fps: 10,
            width: 4,
            height: 2,
        }
    }

    #[test]
    fn scene_is_stable_between_changes() -> Result<()> {
        let mut source = SyntheticSource::new(settings());
        source.connect()?;
        let first = source.next_frame(0)?;
        let second = source.next_frame(100)?;
        assert_eq!(first.pixels(), second.pixels());
        assert_eq!(second.captured_at_ms, 100);

        for i in 2..SCENE_LENGTH {
            source.next_frame(i * 100)?;
        }
        let changed = source.next_frame(SCENE_LENGTH * 100)?;
        assert_ne!(first.pixels(), changed.pixels());
        assert_eq!(source.stats().frames_captured, SCENE_LENGTH + 1);
        Ok(())
    }
}
