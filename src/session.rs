//! Session controller.
//!
//! Owns the two long-running tasks of a navigation session, the guidance
//! loop and the detection loop, and stops both deterministically. The tasks
//! share nothing but the speech queue; cancellation is cooperative through
//! one `AtomicBool` checked at loop-iteration granularity, and `stop()`
//! performs a bounded join. A task that overruns the join timeout is
//! detached, not killed; it exits at its next checkpoint.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::camera::CameraSource;
use crate::detect::DetectorBackend;
use crate::join_with_timeout;
use crate::nav::{run_guidance, MapsClient, RouteViewer};
use crate::speech::Voice;
use crate::track::ObjectTracker;

const CAMERA_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub origin: String,
    pub destination: String,
    /// Request spoken turn-by-turn guidance; requires an API key, otherwise
    /// the session announces a fallback notice instead.
    pub use_api_guidance: bool,
    /// Pacing fallback for route steps that carry no duration estimate.
    pub announce_interval: Duration,
}

pub struct SessionController {
    voice: Arc<Voice>,
    maps: MapsClient,
    viewer: Box<dyn RouteViewer>,
    running: Arc<AtomicBool>,
    guidance: Option<JoinHandle<()>>,
    detection: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl SessionController {
    pub fn new(voice: Arc<Voice>, maps: MapsClient, viewer: Box<dyn RouteViewer>) -> Self {
        Self {
            voice,
            maps,
            viewer,
            running: Arc::new(AtomicBool::new(false)),
            guidance: None,
            detection: None,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    /// Start the session.
    ///
    /// Opens the visual route unconditionally (failures are logged, never
    /// fatal), spawns the guidance task when requested and credentialed,
    /// and spawns the detection task unconditionally. At most one session
    /// per controller; starting while active is an error.
    pub fn start(
        &mut self,
        opts: SessionOptions,
        camera: CameraSource,
        detector: Box<dyn DetectorBackend>,
        tracker: ObjectTracker,
    ) -> Result<()> {
        if self.is_active() {
            bail!("session already active");
        }
        self.running.store(true, Ordering::SeqCst);

        if let Err(err) = self
            .viewer
            .open(&opts.origin, &opts.destination, self.maps.travel_mode())
        {
            log::warn!("could not open route viewer: {}", err);
        }

        if opts.use_api_guidance {
            if self.maps.has_api_key() {
                let voice = self.voice.clone();
                let maps = self.maps.clone();
                let running = self.running.clone();
                let origin = opts.origin.clone();
                let destination = opts.destination.clone();
                let interval = opts.announce_interval;
                self.guidance = Some(std::thread::spawn(move || {
                    run_guidance(&voice, &maps, &origin, &destination, interval, &running);
                }));
            } else {
                self.voice
                    .speak("Map opened. Turn by turn guidance is unavailable without a maps API key.");
            }
        }

        let voice = self.voice.clone();
        let running = self.running.clone();
        self.detection = Some(std::thread::spawn(move || {
            run_detection(voice, camera, detector, tracker, running);
        }));

        Ok(())
    }

    /// True while either task is still running.
    pub fn is_active(&self) -> bool {
        let guidance_live = self
            .guidance
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false);
        let detection_live = self
            .detection
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false);
        guidance_live || detection_live
    }

    /// Whether a guidance task was spawned for the current session.
    pub fn has_guidance_task(&self) -> bool {
        self.guidance.is_some()
    }

    /// Stop both tasks.
    ///
    /// Clears the running flag, then waits up to the join timeout for each
    /// task to observe it and exit. Safe to call more than once.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.guidance.take() {
            join_with_timeout(handle, self.join_timeout, "guidance task");
        }
        if let Some(handle) = self.detection.take() {
            join_with_timeout(handle, self.join_timeout, "detection task");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the detection task.
///
/// Public so detection-only mode can run it on the calling thread; the
/// session controller spawns it on its own thread. Returns when `running`
/// clears.
pub fn run_detection(
    voice: Arc<Voice>,
    mut camera: CameraSource,
    mut detector: Box<dyn DetectorBackend>,
    mut tracker: ObjectTracker,
    running: Arc<AtomicBool>,
) {
    log::info!("detection loop started (detector: {})", detector.name());
    while running.load(Ordering::SeqCst) {
        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                // Transient: back off and retry rather than terminating.
                log::warn!("camera read failed: {}; retrying", err);
                std::thread::sleep(CAMERA_BACKOFF);
                continue;
            }
        };
        let detections = match detector.detect(&frame) {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!("detector '{}' failed: {}", detector.name(), err);
                continue;
            }
        };
        for phrase in tracker.observe(&detections, frame.width, Instant::now()) {
            voice.speak(phrase);
        }
    }
    log::info!("detection loop stopped");
}
