//! Runtime configuration.
//!
//! Loaded from an optional JSON file named by `SIGHTLINE_CONFIG`, then
//! overridden by environment variables, then validated. The maps API key is
//! environment-only (`GOOGLE_MAPS_API_KEY`); it never lives in the file.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::camera::CameraConfig;
use crate::nav::maps::{MapsConfig, TravelMode};
use crate::track::TrackerConfig;

const DEFAULT_DETECTOR_URL: &str = "http://127.0.0.1:8500/detect";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;
const DEFAULT_ANNOUNCE_INTERVAL_SECS: f64 = 12.0;
const DEFAULT_SPEECH_PROGRAM: &str = "espeak-ng";

#[derive(Debug, Deserialize, Default)]
struct SightlineConfigFile {
    camera: Option<CameraConfigFile>,
    detector: Option<DetectorConfigFile>,
    tracker: Option<TrackerConfigFile>,
    speech: Option<SpeechConfigFile>,
    maps: Option<MapsConfigFile>,
    announce_interval_secs: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    source: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    kind: Option<String>,
    url: Option<String>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    cooldown_secs: Option<f64>,
    staleness_secs: Option<f64>,
    bucket_px: Option<u32>,
    proximity_px: Option<i32>,
    distance_scale: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct SpeechConfigFile {
    engine: Option<String>,
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct MapsConfigFile {
    geocode_url: Option<String>,
    directions_url: Option<String>,
    travel_mode: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorKind {
    Stub,
    Remote,
}

#[derive(Clone, Debug)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    pub url: String,
    pub confidence_threshold: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechKind {
    Console,
    Command,
}

#[derive(Clone, Debug)]
pub struct SpeechSettings {
    pub kind: SpeechKind,
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SightlineConfig {
    pub camera: CameraConfig,
    pub detector: DetectorSettings,
    pub tracker: TrackerConfig,
    pub speech: SpeechSettings,
    pub maps: MapsConfig,
    /// Pacing fallback for route steps without a duration estimate.
    pub announce_interval: Duration,
}

impl SightlineConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGHTLINE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SightlineConfigFile) -> Result<Self> {
        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            source: file
                .camera
                .as_ref()
                .and_then(|camera| camera.source.clone())
                .unwrap_or(camera_defaults.source),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(camera_defaults.target_fps),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(camera_defaults.width),
            height: file
                .camera
                .and_then(|camera| camera.height)
                .unwrap_or(camera_defaults.height),
        };

        let detector_kind = match file.detector.as_ref().and_then(|d| d.kind.as_deref()) {
            None | Some("remote") => DetectorKind::Remote,
            Some("stub") => DetectorKind::Stub,
            Some(other) => {
                return Err(anyhow!(
                    "unknown detector kind '{}'; expected stub or remote",
                    other
                ))
            }
        };
        let detector = DetectorSettings {
            kind: detector_kind,
            url: file
                .detector
                .as_ref()
                .and_then(|d| d.url.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR_URL.to_string()),
            confidence_threshold: file
                .detector
                .and_then(|d| d.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        };

        let tracker_defaults = TrackerConfig::default();
        let tracker = TrackerConfig {
            cooldown: match file.tracker.as_ref().and_then(|t| t.cooldown_secs) {
                Some(secs) => duration_secs("tracker cooldown_secs", secs)?,
                None => tracker_defaults.cooldown,
            },
            staleness: match file.tracker.as_ref().and_then(|t| t.staleness_secs) {
                Some(secs) => duration_secs("tracker staleness_secs", secs)?,
                None => tracker_defaults.staleness,
            },
            bucket_px: file
                .tracker
                .as_ref()
                .and_then(|t| t.bucket_px)
                .unwrap_or(tracker_defaults.bucket_px),
            proximity_px: file
                .tracker
                .as_ref()
                .and_then(|t| t.proximity_px)
                .unwrap_or(tracker_defaults.proximity_px),
            distance_scale: file
                .tracker
                .and_then(|t| t.distance_scale)
                .unwrap_or(tracker_defaults.distance_scale),
        };

        let speech_kind = match file.speech.as_ref().and_then(|s| s.engine.as_deref()) {
            None | Some("command") => SpeechKind::Command,
            Some("console") => SpeechKind::Console,
            Some(other) => {
                return Err(anyhow!(
                    "unknown speech engine '{}'; expected console or command",
                    other
                ))
            }
        };
        let speech = SpeechSettings {
            kind: speech_kind,
            program: file
                .speech
                .as_ref()
                .and_then(|s| s.program.clone())
                .unwrap_or_else(|| DEFAULT_SPEECH_PROGRAM.to_string()),
            args: file
                .speech
                .and_then(|s| s.args)
                .unwrap_or_else(|| vec!["-s".to_string(), "155".to_string()]),
        };

        let maps_defaults = MapsConfig::default();
        let maps = MapsConfig {
            api_key: None,
            geocode_url: file
                .maps
                .as_ref()
                .and_then(|m| m.geocode_url.clone())
                .unwrap_or(maps_defaults.geocode_url),
            directions_url: file
                .maps
                .as_ref()
                .and_then(|m| m.directions_url.clone())
                .unwrap_or(maps_defaults.directions_url),
            travel_mode: match file.maps.and_then(|m| m.travel_mode) {
                Some(mode) => TravelMode::parse(&mode)?,
                None => maps_defaults.travel_mode,
            },
        };

        Ok(Self {
            camera,
            detector,
            tracker,
            speech,
            maps,
            announce_interval: match file.announce_interval_secs {
                Some(secs) => duration_secs("announce_interval_secs", secs)?,
                None => Duration::from_secs_f64(DEFAULT_ANNOUNCE_INTERVAL_SECS),
            },
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("SIGHTLINE_CAMERA") {
            if !source.trim().is_empty() {
                self.camera.source = source;
            }
        }
        if let Ok(mode) = std::env::var("SIGHTLINE_TRAVEL_MODE") {
            if !mode.trim().is_empty() {
                self.maps.travel_mode = TravelMode::parse(mode.trim())?;
            }
        }
        if let Ok(secs) = std::env::var("SIGHTLINE_COOLDOWN_SECS") {
            self.tracker.cooldown = parse_secs("SIGHTLINE_COOLDOWN_SECS", &secs)?;
        }
        if let Ok(secs) = std::env::var("SIGHTLINE_STALENESS_SECS") {
            self.tracker.staleness = parse_secs("SIGHTLINE_STALENESS_SECS", &secs)?;
        }
        if let Ok(scale) = std::env::var("SIGHTLINE_DISTANCE_SCALE") {
            self.tracker.distance_scale = scale.parse().map_err(|_| {
                anyhow!("SIGHTLINE_DISTANCE_SCALE must be a number of square-root pixels")
            })?;
        }
        if let Ok(key) = std::env::var("GOOGLE_MAPS_API_KEY") {
            if !key.trim().is_empty() {
                self.maps.api_key = Some(key);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tracker.cooldown.is_zero() {
            return Err(anyhow!("tracker cooldown must be greater than zero"));
        }
        if self.tracker.staleness <= self.tracker.cooldown {
            return Err(anyhow!(
                "tracker staleness window must exceed the announcement cooldown"
            ));
        }
        if self.tracker.distance_scale <= 0.0 {
            return Err(anyhow!("distance scale must be positive"));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within 0.0..=1.0"));
        }
        if self.announce_interval.is_zero() {
            return Err(anyhow!("announce interval must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    let secs: f64 = value
        .parse()
        .map_err(|_| anyhow!("{} must be a number of seconds", name))?;
    duration_secs(name, secs)
}

/// Guard against negative or non-finite values before the `Duration`
/// conversion, which panics on them.
fn duration_secs(name: &str, secs: f64) -> Result<Duration> {
    if secs < 0.0 || !secs.is_finite() {
        return Err(anyhow!("{} must be a non-negative number of seconds", name));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn read_config_file(path: &Path) -> Result<SightlineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
