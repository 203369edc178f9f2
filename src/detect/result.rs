use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Default number of detections kept per frame.
pub const DEFAULT_TOP_K: usize = 3;

/// Axis-aligned box in frame pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// One model output resolved to a label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// Detections of a single frame, best first.
///
/// Scores are non-increasing and the list never exceeds the `k` it was built with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionFrame {
    detections: Vec<Detection>,
}

impl DetectionFrame {
    /// Rank detections by descending score and keep the best `k`.
    pub fn ranked(mut detections: Vec<Detection>, k: usize) -> Self {
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        detections.truncate(k);
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn best(&self) -> Option<&Detection> {
        self.detections.first()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }
}

/// Raw tensors as produced by an SSD-style detection model.
///
/// `locations` holds `(ymin, xmin, ymax, xmax)` quadruples in normalized `[0,1]`
/// space; `classes` and `scores` are parallel to it. Only the first `count`
/// entries are meaningful.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawModelOutput {
    pub locations: Vec<f32>,
    pub classes: Vec<f32>,
    pub scores: Vec<f32>,
    pub count: usize,
}

impl RawModelOutput {
    /// Number of usable entries once array lengths and `count` are reconciled.
    pub fn usable_len(&self) -> Result<usize> {
        if self.classes.len() != self.scores.len() {
            return Err(anyhow!(
                "model output mismatch: {} classes, {} scores",
                self.classes.len(),
                self.scores.len()
            ));
        }
        if self.locations.len() != self.scores.len() * 4 {
            return Err(anyhow!(
                "model output mismatch: {} location values for {} scores",
                self.locations.len(),
                self.scores.len()
            ));
        }
        Ok(self.count.min(self.scores.len()))
    }

    /// Normalized `(ymin, xmin, ymax, xmax)` for entry `i`.
    pub fn location(&self, i: usize) -> [f32; 4] {
        let base = i * 4;
        [
            self.locations[base],
            self.locations[base + 1],
            self.locations[base + 2],
            self.locations[base + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, score: f32) -> Detection {
        Detection::new(label, score, BoundingBox::default())
    }

    #[test]
    fn ranked_frame_orders_and_truncates() {
        let frame = DetectionFrame::ranked(
            vec![det("a", 0.61), det("b", 0.95), det("c", 0.7), det("d", 0.8)],
            3,
        );
        let labels: Vec<&str> = frame.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "d", "c"]);
        assert!(frame
            .detections()
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn usable_len_rejects_misaligned_arrays() {
        let output = RawModelOutput {
            locations: vec![0.0; 8],
            classes: vec![1.0, 2.0],
            scores: vec![0.9],
            count: 2,
        };
        assert!(output.usable_len().is_err());
    }

    #[test]
    fn usable_len_is_capped_by_array_length() -> Result<()> {
        let output = RawModelOutput {
            locations: vec![0.0; 8],
            classes: vec![1.0, 2.0],
            scores: vec![0.9, 0.8],
            count: 10,
        };
        assert_eq!(output.usable_len()?, 2);
        Ok(())
    }
}
