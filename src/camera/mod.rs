//! Camera frame sources.
//!
//! A source yields RGB [`Frame`]s for the detection loop:
//! - `stub://<name>` synthetic frames (testing, demo)
//! - `http(s)://` JPEG snapshot endpoints (feature: camera-http)
//!
//! Device selection beyond a URL is out of scope here; the CLI offers a thin
//! picker and hands the chosen URL to [`CameraSource::new`].

#[cfg(feature = "camera-http")]
mod http;

use anyhow::{anyhow, Result};

/// One captured RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGB bytes, `width * height * 3` long.
    pub pixels: Vec<u8>,
}

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Source URL: `stub://name` or `http(s)://host/snapshot.jpg`.
    pub source: String,
    /// Target frame rate; the synthetic source paces itself to this.
    pub target_fps: u32,
    /// Frame width for synthetic frames.
    pub width: u32,
    /// Frame height for synthetic frames.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: "stub://front".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "camera-http")]
    Http(http::HttpSnapshotSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.source.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticSource::new(config)),
            });
        }
        if config.source.starts_with("http://") || config.source.starts_with("https://") {
            #[cfg(feature = "camera-http")]
            {
                return Ok(Self {
                    backend: CameraBackend::Http(http::HttpSnapshotSource::new(config)?),
                });
            }
            #[cfg(not(feature = "camera-http"))]
            {
                anyhow::bail!("HTTP camera sources require the camera-http feature");
            }
        }
        Err(anyhow!(
            "unsupported camera source '{}'; expected stub:// or http(s)://",
            config.source
        ))
    }

    /// Capture the next frame.
    ///
    /// Errors are transient from the caller's point of view: the detection
    /// loop backs off and retries rather than terminating.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "camera-http")]
            CameraBackend::Http(source) => source.next_frame(),
        }
    }

    /// Frames captured so far.
    pub fn frames_captured(&self) -> u64 {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.frame_count,
            #[cfg(feature = "camera-http")]
            CameraBackend::Http(source) => source.frame_count(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and the demo binary
// ----------------------------------------------------------------------------

struct SyntheticSource {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticSource {
    fn new(config: CameraConfig) -> Self {
        log::info!("CameraSource: {} (synthetic)", config.source);
        Self {
            config,
            frame_count: 0,
        }
    }

    fn next_frame(&mut self) -> Result<Frame> {
        // Pace synthetic capture so the detection loop does not spin hot.
        std::thread::sleep(frame_interval(self.config.target_fps));
        self.frame_count += 1;

        // Simple moving gradient so consecutive frames differ.
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }

        Ok(Frame {
            width: self.config.width,
            height: self.config.height,
            pixels,
        })
    }
}

fn frame_interval(target_fps: u32) -> std::time::Duration {
    if target_fps == 0 {
        std::time::Duration::from_millis(0)
    } else {
        std::time::Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = CameraSource::new(CameraConfig::default())?;
        let frame = source.next_frame()?;
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.pixels.len(), 640 * 480 * 3);
        assert_eq!(source.frames_captured(), 1);
        Ok(())
    }

    #[test]
    fn consecutive_synthetic_frames_differ() -> Result<()> {
        let mut source = CameraSource::new(CameraConfig::default())?;
        let a = source.next_frame()?;
        let b = source.next_frame()?;
        assert_ne!(a.pixels, b.pixels);
        Ok(())
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let config = CameraConfig {
            source: "v4l2://0".to_string(),
            ..CameraConfig::default()
        };
        assert!(CameraSource::new(config).is_err());
    }
}
