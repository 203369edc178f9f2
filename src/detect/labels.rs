use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Label substituted for class indices outside the label table.
pub const UNKNOWN_LABEL: &str = "Bilinmeyen";

const BUNDLED_LABELMAP: &str = include_str!("../../assets/labelmap.txt");

/// Class index to label lookup table.
///
/// Index 0 is the model's background class.
#[derive(Clone, Debug)]
pub struct LabelMap {
    labels: Vec<String>,
    unknown: String,
}

impl LabelMap {
    /// Parse a label map with one label per line.
    pub fn parse(raw: &str) -> Result<Self> {
        let labels: Vec<String> = raw
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect();
        if labels.is_empty() {
            return Err(anyhow!("label map contains no labels"));
        }
        Ok(Self {
            labels,
            unknown: UNKNOWN_LABEL.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label map {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid label map {}", path.display()))
    }

    /// The Turkish COCO label map shipped with the crate.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_LABELMAP).unwrap_or_else(|_| Self {
            labels: vec!["???".to_string()],
            unknown: UNKNOWN_LABEL.to_string(),
        })
    }

    pub fn with_unknown(mut self, unknown: impl Into<String>) -> Self {
        self.unknown = unknown.into();
        self
    }

    /// Resolve a class index, falling back to the unknown sentinel.
    pub fn label(&self, class_index: usize) -> &str {
        self.labels
            .get(class_index)
            .map(String::as_str)
            .unwrap_or(&self.unknown)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_map_resolves_known_classes() {
        let labels = LabelMap::bundled();
        assert_eq!(labels.len(), 91);
        assert_eq!(labels.label(1), "Kişi");
        assert_eq!(labels.label(3), "Araba");
        assert_eq!(labels.label(17), "Kedi");
        assert_eq!(labels.label(18), "Köpek");
    }

    #[test]
    fn out_of_range_index_uses_sentinel() {
        let labels = LabelMap::parse("???\ncar\n").unwrap().with_unknown("unknown");
        assert_eq!(labels.label(1), "car");
        assert_eq!(labels.label(2), "unknown");
        assert_eq!(labels.label(999), "unknown");
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(LabelMap::parse("\n  \n").is_err());
    }
}
