use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::labels::LabelMap;
use crate::detect::result::{
    BoundingBox, Detection, DetectionFrame, RawModelOutput, DEFAULT_TOP_K,
};
use crate::frame::Frame;

/// Minimum score (exclusive) for a detection to be rendered or considered.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.6;

/// Class index reserved for the model's background class.
const BACKGROUND_CLASS: i64 = 0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdapterSettings {
    pub score_threshold: f32,
    pub top_k: usize,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Turns a backend's raw tensors into a ranked `DetectionFrame`.
pub struct DetectorAdapter {
    backend: Arc<Mutex<dyn DetectorBackend>>,
    labels: LabelMap,
    settings: AdapterSettings,
}

impl DetectorAdapter {
    pub fn new(
        backend: Arc<Mutex<dyn DetectorBackend>>,
        labels: LabelMap,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            backend,
            labels,
            settings,
        }
    }

    pub fn settings(&self) -> AdapterSettings {
        self.settings
    }

    pub fn backend_name(&self) -> Result<&'static str> {
        let guard = self
            .backend
            .lock()
            .map_err(|_| anyhow!("detector backend lock poisoned"))?;
        Ok(guard.name())
    }

    /// Run the backend on a frame and normalize its output.
    pub fn detect(&self, frame: &Frame) -> Result<DetectionFrame> {
        let raw = {
            let mut guard = self
                .backend
                .lock()
                .map_err(|_| anyhow!("detector backend lock poisoned"))?;
            guard.detect(frame.pixels(), frame.width, frame.height)?
        };
        normalize(
            &raw,
            &self.labels,
            self.settings,
            frame.width as f32,
            frame.height as f32,
        )
    }
}

/// Normalize raw model output into the top-K detection list.
///
/// Entries with a non-finite score are discarded. The best `top_k` of the rest
/// are taken first; of those, entries at or below the score threshold and
/// background-class entries are dropped. Boxes
/// are scaled from normalized `(ymin, xmin, ymax, xmax)` into pixel space.
pub fn normalize(
    raw: &RawModelOutput,
    labels: &LabelMap,
    settings: AdapterSettings,
    frame_width: f32,
    frame_height: f32,
) -> Result<DetectionFrame> {
    let usable = raw.usable_len()?;
    let mut order: Vec<usize> = (0..usable)
        .filter(|&i| raw.scores[i].is_finite())
        .collect();
    order.sort_by(|&a, &b| raw.scores[b].total_cmp(&raw.scores[a]));

    let detections: Vec<Detection> = order
        .into_iter()
        .take(settings.top_k)
        .filter_map(|i| {
            let score = raw.scores[i];
            let class_index = raw.classes[i] as i64;
            if score <= settings.score_threshold || class_index <= BACKGROUND_CLASS {
                return None;
            }
            let [ymin, xmin, ymax, xmax] = raw.location(i);
            let bbox = BoundingBox::new(
                xmin * frame_width,
                ymin * frame_height,
                xmax * frame_width,
                ymax * frame_height,
            );
            Some(Detection::new(labels.label(class_index as usize), score, bbox))
        })
        .collect();

    Ok(DetectionFrame::ranked(detections, settings.top_k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(f32, f32, [f32; 4])]) -> RawModelOutput {
        RawModelOutput {
            locations: entries.iter().flat_map(|(_, _, loc)| *loc).collect(),
            classes: entries.iter().map(|(class, _, _)| *class).collect(),
            scores: entries.iter().map(|(_, score, _)| *score).collect(),
            count: entries.len(),
        }
    }

    fn labels() -> LabelMap {
        LabelMap::parse("???\nperson\nbicycle\ncar\n").unwrap()
    }

    #[test]
    fn keeps_top_three_above_threshold_in_score_order() -> Result<()> {
        let output = raw(&[
            (1.0, 0.65, [0.0; 4]),
            (3.0, 0.92, [0.0; 4]),
            (2.0, 0.81, [0.0; 4]),
            (1.0, 0.77, [0.0; 4]),
        ]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 100.0, 100.0)?;
        let got: Vec<(&str, f32)> = frame.iter().map(|d| (d.label.as_str(), d.score)).collect();
        assert_eq!(got, vec![("car", 0.92), ("bicycle", 0.81), ("person", 0.77)]);
        Ok(())
    }

    #[test]
    fn filters_after_truncating_to_top_k() -> Result<()> {
        // The background entry occupies a top-3 slot, so only two survive.
        let output = raw(&[
            (0.0, 0.99, [0.0; 4]),
            (1.0, 0.9, [0.0; 4]),
            (2.0, 0.8, [0.0; 4]),
            (3.0, 0.7, [0.0; 4]),
        ]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 1.0, 1.0)?;
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.best().map(|d| d.label.as_str()), Some("person"));
        Ok(())
    }

    #[test]
    fn non_finite_scores_are_discarded() -> Result<()> {
        let output = raw(&[
            (3.0, f32::NAN, [0.0; 4]),
            (1.0, 0.9, [0.0; 4]),
            (2.0, f32::INFINITY, [0.0; 4]),
            (3.0, 0.8, [0.0; 4]),
        ]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 1.0, 1.0)?;
        let got: Vec<(&str, f32)> = frame.iter().map(|d| (d.label.as_str(), d.score)).collect();
        assert_eq!(got, vec![("person", 0.9), ("car", 0.8)]);
        Ok(())
    }

    #[test]
    fn threshold_is_exclusive() -> Result<()> {
        let output = raw(&[(1.0, 0.6, [0.0; 4])]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 1.0, 1.0)?;
        assert!(frame.is_empty());
        Ok(())
    }

    #[test]
    fn denormalizes_boxes_into_pixel_space() -> Result<()> {
        let output = raw(&[(3.0, 0.9, [0.25, 0.1, 0.75, 0.5])]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 640.0, 480.0)?;
        let bbox = frame.best().map(|d| d.bbox).unwrap();
        assert_eq!(bbox, BoundingBox::new(64.0, 120.0, 320.0, 360.0));
        Ok(())
    }

    #[test]
    fn unknown_class_index_maps_to_sentinel() -> Result<()> {
        let output = raw(&[(42.0, 0.9, [0.0; 4])]);
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 1.0, 1.0)?;
        assert_eq!(frame.best().map(|d| d.label.as_str()), Some("Bilinmeyen"));
        Ok(())
    }

    #[test]
    fn entries_beyond_count_are_ignored() -> Result<()> {
        let mut output = raw(&[(1.0, 0.7, [0.0; 4]), (3.0, 0.95, [0.0; 4])]);
        output.count = 1;
        let frame = normalize(&output, &labels(), AdapterSettings::default(), 1.0, 1.0)?;
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.best().map(|d| d.label.as_str()), Some("person"));
        Ok(())
    }
}
