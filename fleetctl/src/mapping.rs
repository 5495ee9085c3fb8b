//! Geocoding and driving distance through a Google-Maps-compatible HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;
use utoipa::ToSchema;

use crate::config::MappingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    fn as_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Mapping request failed: {0}")]
    Http(reqwest::Error),

    #[error("Mapping API returned status {status}: {message}")]
    Api { status: String, message: String },

    #[error("Invalid mapping URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for MappingError {
    // Request URLs carry the API key
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// Address lookup and route distance.
///
/// `Ok(None)` means the provider answered but found nothing usable.
#[async_trait]
pub trait MappingProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, MappingError>;

    async fn driving_distance_km(&self, origin: Coordinates, destination: Coordinates) -> Result<Option<f64>, MappingError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    status: String,
    distance: Option<Distance>,
}

#[derive(Debug, Deserialize)]
struct Distance {
    /// Metres
    value: f64,
}

/// Statuses that mean "no match" rather than failure
const EMPTY_STATUSES: &[&str] = &["ZERO_RESULTS", "NOT_FOUND"];

fn check_status(status: &str, error_message: Option<String>) -> Result<bool, MappingError> {
    match status {
        "OK" => Ok(true),
        s if EMPTY_STATUSES.contains(&s) => Ok(false),
        s => Err(MappingError::Api {
            status: s.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

/// Makes sure a url has a trailing slash so `join` appends rather than replaces.
fn ensure_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// reqwest-backed provider for the Geocoding and Distance Matrix JSON APIs.
pub struct GoogleMapsProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GoogleMapsProvider {
    pub fn new(config: &MappingConfig) -> Result<Self, MappingError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: ensure_slash(&config.base_url),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MappingProvider for GoogleMapsProvider {
    #[instrument(skip(self), err)]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, MappingError> {
        let url = self.base_url.join("maps/api/geocode/json")?;
        let response: GeocodeResponse = self
            .client
            .get(url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !check_status(&response.status, response.error_message)? {
            debug!("No geocoding match");
            return Ok(None);
        }
        Ok(response.results.into_iter().next().map(|r| Coordinates {
            latitude: r.geometry.location.lat,
            longitude: r.geometry.location.lng,
        }))
    }

    #[instrument(skip(self), err)]
    async fn driving_distance_km(&self, origin: Coordinates, destination: Coordinates) -> Result<Option<f64>, MappingError> {
        let url = self.base_url.join("maps/api/distancematrix/json")?;
        let response: DistanceMatrixResponse = self
            .client
            .get(url)
            .query(&[
                ("origins", origin.as_param()),
                ("destinations", destination.as_param()),
                ("mode", "driving".to_string()),
                ("units", "metric".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !check_status(&response.status, response.error_message)? {
            return Ok(None);
        }
        let element = response.rows.into_iter().next().and_then(|row| row.elements.into_iter().next());
        Ok(element
            .filter(|e| e.status == "OK")
            .and_then(|e| e.distance)
            .map(|d| (d.value / 10.0).round() / 100.0))
    }
}
