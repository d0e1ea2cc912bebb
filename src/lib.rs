//! Sightline
//!
//! An assistive-navigation narrator. A camera feed is run through an
//! external object detector; the per-frame stream of bounding boxes is
//! folded into a small number of well-timed spoken sentences (label, coarse
//! direction, heuristic distance), optionally alongside spoken turn-by-turn
//! walking guidance.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! camera -> detector backend -> geometry/distance -> tracker/announcer ->
//! speech queue -> speech engine
//!
//! The session controller runs the detection loop and the guidance loop as
//! independent threads sharing only the speech queue, and stops both
//! cooperatively with a bounded join.
//!
//! # Module Structure
//!
//! - `geometry`: box center/area, direction partition, distance heuristic
//! - `camera`: frame sources (synthetic stub, HTTP snapshot)
//! - `detect`: detector boundary and adapters
//! - `track`: identity continuity and announcement cooldown
//! - `speech`: the multi-producer single-worker utterance queue
//! - `nav`: maps client, guidance state machine, route viewer
//! - `session`: the two-task controller
//! - `config`: file + environment configuration

pub mod camera;
pub mod config;
pub mod detect;
pub mod geometry;
pub mod nav;
pub mod session;
pub mod speech;
pub mod track;

pub use camera::{CameraConfig, CameraSource, Frame};
pub use config::{DetectorKind, SightlineConfig, SpeechKind};
pub use detect::{Detection, DetectorBackend, RemoteDetector, RemoteDetectorConfig, StubDetector};
pub use geometry::{approximate_distance, BoundingBox, Direction, DEFAULT_DISTANCE_SCALE};
pub use nav::{BrowserViewer, Lookup, MapsClient, MapsConfig, NullViewer, RouteViewer, TravelMode};
pub use session::{SessionController, SessionOptions};
pub use speech::{CommandEngine, ConsoleEngine, RecordingEngine, SpeechEngine, Voice};
pub use track::{ObjectTracker, TrackerConfig};

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Join a worker thread, giving up (and detaching it) after `timeout`.
///
/// Tasks are cooperative: an overrunning thread is never killed, it exits at
/// its next cancellation checkpoint and is reclaimed at process exit.
pub(crate) fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration, name: &str) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("{} did not exit within {:?}; detaching", name, timeout);
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    if handle.join().is_err() {
        log::error!("{} panicked", name);
    }
}
