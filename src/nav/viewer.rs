//! Visual route viewer.
//!
//! Opening the route in a browser is fire-and-forget: the session controller
//! logs failures and moves on, spoken guidance never depends on it.

use anyhow::{Context, Result};
use std::process::Command;
use url::Url;

use super::maps::TravelMode;

const MAPS_DIR_URL: &str = "https://www.google.com/maps/dir/";

pub trait RouteViewer: Send {
    fn open(&self, origin: &str, destination: &str, mode: TravelMode) -> Result<()>;
}

/// Opens the route in the platform's default browser.
pub struct BrowserViewer;

impl RouteViewer for BrowserViewer {
    fn open(&self, origin: &str, destination: &str, mode: TravelMode) -> Result<()> {
        let url = route_url(origin, destination, mode)?;
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Command::new(opener)
            .arg(url.as_str())
            .spawn()
            .with_context(|| format!("spawn '{}' for route viewer", opener))?;
        Ok(())
    }
}

/// Viewer that does nothing; used in tests and headless runs.
pub struct NullViewer;

impl RouteViewer for NullViewer {
    fn open(&self, _origin: &str, _destination: &str, _mode: TravelMode) -> Result<()> {
        Ok(())
    }
}

fn route_url(origin: &str, destination: &str, mode: TravelMode) -> Result<Url> {
    let mut url = Url::parse(MAPS_DIR_URL).context("parse maps base url")?;
    url.query_pairs_mut()
        .append_pair("api", "1")
        .append_pair("origin", origin)
        .append_pair("destination", destination)
        .append_pair("travelmode", mode.as_str());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_url_encodes_endpoints() {
        let url = route_url("1 Main St, Springfield", "Central Park", TravelMode::Walking).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://www.google.com/maps/dir/?api=1"));
        assert!(s.contains("origin=1+Main+St%2C+Springfield"));
        assert!(s.contains("destination=Central+Park"));
        assert!(s.contains("travelmode=walking"));
    }
}
