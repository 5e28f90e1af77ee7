use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Http(err) => write!(f, "place search failed: {err}"),
            GeocodeError::Status(status) => write!(f, "place search returned {status}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Http(err)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// Nominatim returns coordinates as strings; some mirrors return numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Text(text) => text.trim().parse().ok(),
            Coordinate::Number(value) => Some(*value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    lat: Coordinate,
    lon: Coordinate,
    #[serde(default)]
    display_name: String,
}

fn into_candidates(raw: Vec<RawPlace>) -> Vec<PlaceCandidate> {
    raw.into_iter()
        .filter_map(|place| {
            Some(PlaceCandidate {
                lat: place.lat.value()?,
                lon: place.lon.value()?,
                display_name: place.display_name,
            })
        })
        .collect()
}

/// Free-text place search against a Nominatim-compatible endpoint.
#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let raw: Vec<RawPlace> = response.json().await?;
        Ok(into_candidates(raw))
    }
}
