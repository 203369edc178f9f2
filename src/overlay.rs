//! Box overlay boundary.
//!
//! Rendering is a pure mapping of the latest box list to pixels; the session
//! hands every frame's detections to an `OverlaySink` and expects nothing back.

use std::sync::{Arc, Mutex};

use crate::detect::{BoundingBox, DetectionFrame};

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledBox {
    pub rect: BoundingBox,
    pub label: String,
}

impl LabeledBox {
    pub fn from_frame(frame: &DetectionFrame) -> Vec<LabeledBox> {
        frame
            .iter()
            .map(|d| LabeledBox {
                rect: d.bbox,
                label: d.label.clone(),
            })
            .collect()
    }
}

/// Rendering boundary. Called once per frame, including with an empty list.
pub trait OverlaySink: Send {
    fn render_boxes(&self, boxes: &[LabeledBox]);
}

/// Keeps the most recently rendered box list.
#[derive(Clone, Default)]
pub struct LatestBoxes {
    boxes: Arc<Mutex<Vec<LabeledBox>>>,
}

impl LatestBoxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<LabeledBox> {
        self.boxes
            .lock()
            .map(|boxes| boxes.clone())
            .unwrap_or_default()
    }
}

impl OverlaySink for LatestBoxes {
    fn render_boxes(&self, boxes: &[LabeledBox]) {
        if let Ok(mut latest) = self.boxes.lock() {
            latest.clear();
            latest.extend_from_slice(boxes);
        }
    }
}

/// Logs box lists at debug level.
#[derive(Default)]
pub struct LogOverlay;

impl OverlaySink for LogOverlay {
    fn render_boxes(&self, boxes: &[LabeledBox]) {
        if log::log_enabled!(log::Level::Debug) {
            let labels: Vec<&str> = boxes.iter().map(|b| b.label.as_str()).collect();
            log::debug!("overlay: {} boxes {:?}", boxes.len(), labels);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Detection;

    #[test]
    fn latest_boxes_replaces_previous_render() {
        let overlay = LatestBoxes::new();
        let frame = DetectionFrame::ranked(
            vec![Detection::new("Kedi", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0))],
            3,
        );
        overlay.render_boxes(&LabeledBox::from_frame(&frame));
        assert_eq!(overlay.snapshot().len(), 1);
        assert_eq!(overlay.snapshot()[0].label, "Kedi");

        overlay.render_boxes(&[]);
        assert!(overlay.snapshot().is_empty());
    }
}
