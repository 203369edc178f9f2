//! Camera frames as delivered to the session.
//!
//! A `Frame` carries tightly packed RGB24 pixels plus the monotonic time it was
//! captured. Frames are produced by an ingest source, passed once through the
//! detector and then dropped; nothing downstream keeps pixels.

use anyhow::{anyhow, Result};

pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture time in milliseconds.
    pub captured_at_ms: u64,
}

impl Frame {
    /// Wrap RGB24 pixels, validating the buffer length against the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, captured_at_ms: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            captured_at_ms,
        })
    }

    /// A uniformly coloured frame.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], captured_at_ms: u64) -> Result<Self> {
        let len = rgb_len(width, height)?;
        let data = rgb.iter().copied().cycle().take(len).collect();
        Self::new(data, width, height, captured_at_ms)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("captured_at_ms", &self.captured_at_ms)
            .field("bytes", &self.data.len())
            .finish()
    }
}

pub(crate) fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}
