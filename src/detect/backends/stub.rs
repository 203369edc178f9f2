use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawModelOutput;

const STUB_DETECTIONS: usize = 3;
const STUB_CLASSES: u8 = 90;

/// Stub backend for testing and demos.
///
/// Derives a fixed set of detections from a hash of the pixels, so identical
/// frames always yield identical output and a scene change yields new output.
pub struct StubBackend {
    frames_seen: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { frames_seen: 0 }
    }

    #[cfg(test)]
    fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], _width: u32, _height: u32) -> Result<RawModelOutput> {
        self.frames_seen += 1;
        log::trace!("stub backend frame {}", self.frames_seen);
        let digest: [u8; 32] = Sha256::digest(pixels).into();

        let mut output = RawModelOutput {
            locations: Vec::with_capacity(STUB_DETECTIONS * 4),
            classes: Vec::with_capacity(STUB_DETECTIONS),
            scores: Vec::with_capacity(STUB_DETECTIONS),
            count: STUB_DETECTIONS,
        };
        for chunk in digest.chunks_exact(4).take(STUB_DETECTIONS) {
            let ymin = chunk[2] as f32 / 255.0 * 0.5;
            let xmin = chunk[3] as f32 / 255.0 * 0.5;
            output
                .locations
                .extend_from_slice(&[ymin, xmin, ymin + 0.4, xmin + 0.4]);
            output.classes.push((1 + chunk[0] % STUB_CLASSES) as f32);
            output.scores.push(0.5 + chunk[1] as f32 / 255.0 * 0.5);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_is_deterministic_per_frame() {
        let mut backend = StubBackend::new();

        let r1 = backend.detect(b"frame1", 10, 10).unwrap();
        let r2 = backend.detect(b"frame1", 10, 10).unwrap();
        let r3 = backend.detect(b"frame2", 10, 10).unwrap();

        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
        assert_eq!(r1.usable_len().unwrap(), 3);
        assert!(r1.classes.iter().all(|c| *c >= 1.0 && *c <= 90.0));
        assert!(r1.scores.iter().all(|s| (0.5..=1.0).contains(s)));
        assert_eq!(backend.frames_seen(), 3);
    }
}
