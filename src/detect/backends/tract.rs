#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawModelOutput;

/// Tract-based backend for SSD-style ONNX detection models.
///
/// The model must take a `1x3xHxW` f32 input in `[0,1]` and produce four
/// outputs in SSD post-processed order: boxes `[1,N,4]` as
/// `(ymin, xmin, ymax, xmax)`, classes `[1,N]`, scores `[1,N]` and the
/// detection count `[1]`.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
        })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_output(outputs: TVec<TValue>) -> Result<RawModelOutput> {
        if outputs.len() < 4 {
            return Err(anyhow!(
                "SSD model produced {} outputs, expected 4",
                outputs.len()
            ));
        }
        let flat = |index: usize, what: &str| -> Result<Vec<f32>> {
            let view = outputs[index]
                .to_array_view::<f32>()
                .with_context(|| format!("model {} tensor was not f32", what))?;
            Ok(view.iter().copied().collect())
        };

        let locations = flat(0, "boxes")?;
        let classes = flat(1, "classes")?;
        let scores = flat(2, "scores")?;
        let count = flat(3, "count")?
            .first()
            .map(|c| c.max(0.0) as usize)
            .unwrap_or(scores.len());

        Ok(RawModelOutput {
            locations,
            classes,
            scores,
            count,
        })
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<RawModelOutput> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        Self::extract_output(outputs)
    }
}
