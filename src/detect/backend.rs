use anyhow::Result;

use crate::detect::result::RawModelOutput;

/// Detector backend trait.
///
/// A backend wraps one pre-trained model. It receives the RGB pixels of a frame
/// and returns the model's raw tensors; label resolution, filtering and ranking
/// belong to `DetectorAdapter`, not to the backend.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run the model on a frame.
    ///
    /// An error means the model is unavailable for this frame. Callers skip the
    /// frame and try again on the next one.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<RawModelOutput>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
