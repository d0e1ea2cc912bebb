//! Remote inference-server detector.
//!
//! Posts raw RGB frames to an HTTP inference endpoint and parses its JSON
//! response. The wire format is deliberately small:
//!
//! `POST <url>?width=W&height=H` with `application/octet-stream` body, reply
//! `{ "detections": [ { "label": "person", "confidence": 0.91,
//!    "box": [x1, y1, x2, y2] } ] }`
//!
//! Anything the server sends that does not normalize into a well-formed
//! [`Detection`] (short box array, sub-threshold confidence) is dropped here
//! so the tracker never sees library- or server-specific shapes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::camera::Frame;
use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::geometry::BoundingBox;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct RemoteDetectorConfig {
    /// Inference endpoint, e.g. `http://127.0.0.1:8500/detect`.
    pub url: String,
    /// Detections below this confidence never leave the adapter.
    pub confidence_threshold: f32,
}

impl Default for RemoteDetectorConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8500/detect".to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<WireDetection>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    label: String,
    #[serde(default)]
    confidence: f32,
    /// `[x1, y1, x2, y2]` pixel coordinates.
    #[serde(default)]
    r#box: Vec<i32>,
}

pub struct RemoteDetector {
    config: RemoteDetectorConfig,
    agent: ureq::Agent,
}

impl RemoteDetector {
    pub fn new(config: RemoteDetectorConfig) -> Result<Self> {
        url::Url::parse(&config.url).context("parse detector url")?;
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Ok(Self { config, agent })
    }

    fn normalize(&self, wire: WireDetection) -> Option<Detection> {
        if wire.r#box.len() < 4 {
            return None;
        }
        if wire.confidence < self.config.confidence_threshold {
            return None;
        }
        let bbox = BoundingBox::new(wire.r#box[0], wire.r#box[1], wire.r#box[2], wire.r#box[3]);
        Some(Detection::new(wire.label, wire.confidence, bbox))
    }
}

impl DetectorBackend for RemoteDetector {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let url = format!(
            "{}?width={}&height={}",
            self.config.url, frame.width, frame.height
        );
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/octet-stream")
            .send_bytes(&frame.pixels)
            .context("post frame to detector")?;

        let parsed: DetectResponse = serde_json::from_reader(response.into_reader())
            .context("parse detector response")?;

        Ok(parsed
            .detections
            .into_iter()
            .filter_map(|wire| self.normalize(wire))
            .collect())
    }
}
