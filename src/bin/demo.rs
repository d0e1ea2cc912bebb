//! demo - end-to-end synthetic run of the sightline narrator
//!
//! Runs the full session pipeline against a synthetic camera and a scripted
//! detector: a person approaches on the left, then a car appears on the
//! right. Announcements go to the console engine, so the run is silent but
//! fully observable in the log.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use sightline::{
    BoundingBox, CameraConfig, CameraSource, ConsoleEngine, Detection, MapsClient, MapsConfig,
    NullViewer, ObjectTracker, SessionController, SessionOptions, StubDetector, TrackerConfig,
    Voice,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds for the synthetic session.
    #[arg(long, default_value_t = 8)]
    seconds: u64,
    /// Frames per second for the synthetic camera.
    #[arg(long, default_value_t = 4)]
    fps: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    stage("build synthetic pipeline");
    let camera = CameraSource::new(CameraConfig {
        source: "stub://demo".to_string(),
        target_fps: args.fps,
        width: 640,
        height: 480,
    })?;
    let detector = StubDetector::new(demo_script());
    let tracker = ObjectTracker::new(TrackerConfig::default());
    let voice = Arc::new(Voice::new(Box::new(ConsoleEngine)));
    let maps = MapsClient::new(MapsConfig::default());

    stage("start session");
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(NullViewer));
    controller.start(
        SessionOptions {
            origin: "demo origin".to_string(),
            destination: "demo destination".to_string(),
            use_api_guidance: false,
            announce_interval: Duration::from_secs(12),
        },
        camera,
        Box::new(detector),
        tracker,
    )?;

    stage("narrating synthetic detections");
    std::thread::sleep(Duration::from_secs(args.seconds));

    stage("stop session");
    controller.stop();
    voice.stop();
    stage("done");
    Ok(())
}

/// A person walking closer on the left, then a car pulling in on the right.
fn demo_script() -> Vec<Vec<Detection>> {
    let person_far = Detection::new("person", 0.92, BoundingBox::new(40, 200, 100, 320));
    let person_near = Detection::new("person", 0.94, BoundingBox::new(30, 160, 150, 400));
    let car = Detection::new("car", 0.88, BoundingBox::new(480, 220, 630, 380));
    vec![
        vec![person_far.clone()],
        vec![person_far],
        vec![person_near.clone()],
        vec![person_near, car.clone()],
        vec![car],
    ]
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
