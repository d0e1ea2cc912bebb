mod remote;
mod stub;

pub use remote::{RemoteDetector, RemoteDetectorConfig};
pub use stub::StubDetector;
