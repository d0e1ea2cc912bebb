use anyhow::Result;

use crate::camera::Frame;
use crate::detect::result::Detection;

/// Detector backend trait.
///
/// Implementations own everything model-specific (tensors, class maps,
/// confidence thresholds) and emit normalized [`Detection`] values only.
/// A failed `detect` call is transient from the caller's point of view;
/// the detection loop logs it and moves on to the next frame.
pub trait DetectorBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}
