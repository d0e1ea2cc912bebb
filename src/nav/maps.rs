//! Geocoding and directions client.
//!
//! Thin wrapper over the maps web API. Query outcomes are modeled as a small
//! set of named variants rather than errors-as-control-flow: the guidance
//! loop treats `NotFound` and `TransportError` identically (one generic
//! spoken failure), which is a deliberate simplification.

use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of a maps lookup.
///
/// There is no user-facing distinction between an empty result and a
/// transport failure in the guidance path; both terminate guidance with the
/// same spoken notice.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    TransportError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelMode {
    Walking,
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Driving => "driving",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "walking" => Ok(TravelMode::Walking),
            "driving" => Ok(TravelMode::Driving),
            other => Err(anyhow!(
                "unknown travel mode '{}'; expected walking or driving",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl Display for LatLng {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// One step of a route leg, instruction markup still attached.
#[derive(Clone, Debug)]
pub struct RouteStep {
    pub instruction_html: String,
    pub distance_text: String,
    pub duration_secs: Option<u64>,
}

/// First leg of the first returned route.
#[derive(Clone, Debug)]
pub struct Route {
    pub distance_text: String,
    pub duration_text: String,
    pub steps: Vec<RouteStep>,
}

#[derive(Clone, Debug)]
pub struct MapsConfig {
    /// API credential from the environment; `None` selects the
    /// fallback-announcement path in the session controller.
    pub api_key: Option<String>,
    pub geocode_url: String,
    pub directions_url: String,
    pub travel_mode: TravelMode,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            directions_url: DEFAULT_DIRECTIONS_URL.to_string(),
            travel_mode: TravelMode::Walking,
        }
    }
}

#[derive(Clone)]
pub struct MapsClient {
    config: MapsConfig,
    agent: ureq::Agent,
}

impl MapsClient {
    pub fn new(config: MapsConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { config, agent }
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.config.travel_mode
    }

    /// Resolve an address to coordinates.
    pub fn geocode(&self, address: &str) -> Lookup<LatLng> {
        let Some(key) = self.config.api_key.as_deref() else {
            log::warn!("geocode requested without an api key");
            return Lookup::TransportError;
        };
        let response = self
            .agent
            .get(&self.config.geocode_url)
            .query("address", address)
            .query("key", key)
            .call();
        let body = match read_body(response) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("geocode transport failure: {}", err);
                return Lookup::TransportError;
            }
        };
        parse_geocode_body(&body)
    }

    /// Fetch a route between two resolved or raw endpoints.
    pub fn route(&self, origin: &str, destination: &str) -> Lookup<Route> {
        let Some(key) = self.config.api_key.as_deref() else {
            log::warn!("route requested without an api key");
            return Lookup::TransportError;
        };
        let response = self
            .agent
            .get(&self.config.directions_url)
            .query("origin", origin)
            .query("destination", destination)
            .query("mode", self.config.travel_mode.as_str())
            .query("units", "metric")
            .query("alternatives", "false")
            .query("key", key)
            .call();
        let body = match read_body(response) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("directions transport failure: {}", err);
                return Lookup::TransportError;
            }
        };
        parse_directions_body(&body)
    }
}

fn read_body(response: Result<ureq::Response, ureq::Error>) -> Result<String> {
    Ok(response?.into_string()?)
}

// ----------------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    legs: Vec<WireLeg>,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    distance: Option<WireText>,
    duration: Option<WireText>,
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
struct WireStep {
    #[serde(default)]
    html_instructions: String,
    distance: Option<WireText>,
    duration: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    #[serde(default)]
    text: String,
    value: Option<u64>,
}

fn parse_geocode_body(body: &str) -> Lookup<LatLng> {
    let parsed: GeocodeResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("malformed geocode response: {}", err);
            return Lookup::TransportError;
        }
    };
    if parsed.status != "OK" {
        return Lookup::NotFound;
    }
    match parsed.results.first() {
        Some(result) => Lookup::Found(LatLng {
            lat: result.geometry.location.lat,
            lng: result.geometry.location.lng,
        }),
        None => Lookup::NotFound,
    }
}

fn parse_directions_body(body: &str) -> Lookup<Route> {
    let parsed: DirectionsResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("malformed directions response: {}", err);
            return Lookup::TransportError;
        }
    };
    let Some(leg) = parsed
        .routes
        .into_iter()
        .next()
        .and_then(|route| route.legs.into_iter().next())
    else {
        return Lookup::NotFound;
    };

    let steps = leg
        .steps
        .into_iter()
        .map(|step| RouteStep {
            instruction_html: step.html_instructions,
            distance_text: step.distance.map(|d| d.text).unwrap_or_default(),
            duration_secs: step.duration.and_then(|d| d.value),
        })
        .collect();

    Lookup::Found(Route {
        distance_text: leg.distance.map(|d| d.text).unwrap_or_default(),
        duration_text: leg.duration.map(|d| d.text).unwrap_or_default(),
        steps,
    })
}
