//! HTTP JPEG snapshot camera source.
//!
//! Polls an endpoint that returns one JPEG per GET (the common "snapshot"
//! endpoint on IP and microcontroller cameras) and decodes it in memory.

use anyhow::{Context, Result};
use std::io::Read;
use std::time::Duration;

use super::{CameraConfig, Frame};

const MAX_JPEG_BYTES: u64 = 5 * 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) struct HttpSnapshotSource {
    url: String,
    agent: ureq::Agent,
    frame_count: u64,
}

impl HttpSnapshotSource {
    pub(super) fn new(config: CameraConfig) -> Result<Self> {
        url::Url::parse(&config.source).context("parse camera url")?;
        let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
        log::info!("CameraSource: {} (http snapshot)", config.source);
        Ok(Self {
            url: config.source,
            agent,
            frame_count: 0,
        })
    }

    pub(super) fn next_frame(&mut self) -> Result<Frame> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .context("fetch camera snapshot")?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_JPEG_BYTES)
            .read_to_end(&mut bytes)
            .context("read camera snapshot body")?;

        let (pixels, width, height) = decode_jpeg(&bytes)?;
        self.frame_count += 1;
        Ok(Frame {
            width,
            height,
            pixels,
        })
    }

    pub(super) fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    use image::GenericImageView;

    let image = image::load_from_memory(bytes).context("decode jpeg")?;
    let (width, height) = image.dimensions();
    let rgb = image.into_rgb8();
    Ok((rgb.into_raw(), width, height))
}
