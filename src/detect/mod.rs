//! Detector adapter.
//!
//! Backends wrap a pre-trained model and return its raw tensors. The adapter
//! resolves class labels, drops background and low-score entries, scales boxes
//! into pixel space and hands a ranked top-K `DetectionFrame` to the session.

mod adapter;
mod backend;
pub mod backends;
mod labels;
mod registry;
mod result;

pub use adapter::{normalize, AdapterSettings, DetectorAdapter, DEFAULT_SCORE_THRESHOLD};
pub use backend::DetectorBackend;
pub use backends::{ScriptHandle, ScriptedBackend, StubBackend};
pub use labels::{LabelMap, UNKNOWN_LABEL};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, DetectionFrame, RawModelOutput, DEFAULT_TOP_K};

#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
