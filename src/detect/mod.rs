//! Object detection boundary.
//!
//! The detector is an external collaborator: anything model-specific stays
//! inside a [`DetectorBackend`] implementation, which normalizes its output
//! into plain [`Detection`] values before they cross into the tracker.

mod backend;
mod backends;
mod result;

pub use backend::DetectorBackend;
pub use backends::{RemoteDetector, RemoteDetectorConfig, StubDetector};
pub use result::Detection;
