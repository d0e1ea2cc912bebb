//! sightline - assistive navigation narrator
//!
//! Subcommands:
//! - `detect`: narrate nearby objects from the camera feed
//! - `navigate`: spoken walking guidance plus live object narration
//! - `speak`: render one utterance and exit (speech smoke test)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sightline::{
    session::run_detection, BrowserViewer, CameraSource, CommandEngine, ConsoleEngine,
    DetectorBackend, DetectorKind, MapsClient, ObjectTracker, RemoteDetector,
    RemoteDetectorConfig, SessionController, SessionOptions, SightlineConfig, SpeechKind,
    StubDetector, Voice,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Narrate nearby objects with spoken distance and direction.
    Detect {
        /// Camera source override: stub://name or http(s)://host/snapshot.jpg
        #[arg(long)]
        source: Option<String>,
    },
    /// Open the route, speak turn-by-turn guidance, and narrate objects.
    Navigate {
        origin: String,
        destination: String,
        /// Open the map only; skip spoken API guidance.
        #[arg(long)]
        no_api_guidance: bool,
    },
    /// Speak one utterance through the configured engine.
    Speak { text: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = SightlineConfig::load()?;

    match args.command {
        Command::Detect { source } => cmd_detect(cfg, source),
        Command::Navigate {
            origin,
            destination,
            no_api_guidance,
        } => cmd_navigate(cfg, origin, destination, !no_api_guidance),
        Command::Speak { text } => cmd_speak(cfg, text),
    }
}

fn cmd_detect(mut cfg: SightlineConfig, source: Option<String>) -> Result<()> {
    if let Some(source) = source {
        cfg.camera.source = source;
    }

    let voice = Arc::new(build_voice(&cfg));
    let camera = CameraSource::new(cfg.camera.clone())?;
    let detector = build_detector(&cfg)?;
    let tracker = ObjectTracker::new(cfg.tracker.clone());

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("install signal handler")?;

    voice.speak("Object detection started.");
    run_detection(voice.clone(), camera, detector, tracker, running);
    voice.stop();
    Ok(())
}

fn cmd_navigate(
    cfg: SightlineConfig,
    origin: String,
    destination: String,
    use_api_guidance: bool,
) -> Result<()> {
    let voice = Arc::new(build_voice(&cfg));
    let maps = MapsClient::new(cfg.maps.clone());
    let mut controller = SessionController::new(voice.clone(), maps, Box::new(BrowserViewer));

    let camera = CameraSource::new(cfg.camera.clone())?;
    let detector = build_detector(&cfg)?;
    let tracker = ObjectTracker::new(cfg.tracker.clone());

    controller.start(
        SessionOptions {
            origin,
            destination,
            use_api_guidance,
            announce_interval: cfg.announce_interval,
        },
        camera,
        detector,
        tracker,
    )?;
    voice.speak("Navigation started. Object detection running.");

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupted.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("install signal handler")?;

    while !interrupted.load(Ordering::SeqCst) && controller.is_active() {
        std::thread::sleep(Duration::from_millis(200));
    }

    controller.stop();
    voice.stop();
    log::info!("session ended");
    Ok(())
}

fn cmd_speak(cfg: SightlineConfig, text: String) -> Result<()> {
    let voice = Voice::new(build_engine(&cfg));
    voice.speak(text);
    voice.stop();
    Ok(())
}

fn build_voice(cfg: &SightlineConfig) -> Voice {
    Voice::new(build_engine(cfg))
}

fn build_engine(cfg: &SightlineConfig) -> Box<dyn sightline::SpeechEngine> {
    match cfg.speech.kind {
        SpeechKind::Console => Box::new(ConsoleEngine),
        SpeechKind::Command => Box::new(CommandEngine::new(
            cfg.speech.program.clone(),
            cfg.speech.args.clone(),
        )),
    }
}

fn build_detector(cfg: &SightlineConfig) -> Result<Box<dyn DetectorBackend>> {
    match cfg.detector.kind {
        DetectorKind::Stub => Ok(Box::new(StubDetector::empty())),
        DetectorKind::Remote => Ok(Box::new(RemoteDetector::new(RemoteDetectorConfig {
            url: cfg.detector.url.clone(),
            confidence_threshold: cfg.detector.confidence_threshold,
        })?)),
    }
}
