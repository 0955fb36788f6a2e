//! HTTP client for the Google Maps web services.
//!
//! One method per provider operation. Each call builds the query string,
//! sends it with the configured timeout, reads the whole body and classifies
//! the provider's embedded `status`. The client neither caches nor retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{MapsError, Result};
use crate::models::{
    DirectionsRequest, DirectionsResponse, DistanceMatrixRequest, DistanceMatrixResponse, GeocodeRequest, GeocodeResponse, PlacesSearchRequest,
    PlacesSearchResponse, ProviderEnvelope, ProviderStatus, ReverseGeocodeRequest,
};

/// Operations offered by the upstream mapping provider.
///
/// `Ok` always carries an `OK` or `ZERO_RESULTS` envelope; every other
/// provider status is returned as [`MapsError::Provider`].
#[async_trait]
pub trait MapsProvider: Send + Sync {
    /// Whether a credential is configured. Calls fail fast when it is not.
    fn has_credentials(&self) -> bool;

    async fn geocode(&self, req: &GeocodeRequest) -> Result<GeocodeResponse>;

    async fn reverse_geocode(&self, req: &ReverseGeocodeRequest) -> Result<GeocodeResponse>;

    async fn text_search(&self, req: &PlacesSearchRequest) -> Result<PlacesSearchResponse>;

    async fn directions(&self, req: &DirectionsRequest) -> Result<DirectionsResponse>;

    async fn distance_matrix(&self, req: &DistanceMatrixRequest) -> Result<DistanceMatrixResponse>;
}

/// Endpoint URLs of the provider.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub geocoding: String,
    /// Base of the Places API; text search appends `/textsearch/json`.
    pub places: String,
    pub directions: String,
    pub distance_matrix: String,
}

pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: String,
    endpoints: Endpoints,
}

impl GoogleMapsClient {
    pub fn new(api_key: impl Into<String>, endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MapsError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoints,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.google_maps_api_key.clone(),
            Endpoints {
                geocoding: config.geocoding_url.clone(),
                places: config.places_url.clone(),
                directions: config.directions_url.clone(),
                distance_matrix: config.distance_matrix_url.clone(),
            },
            config.request_timeout(),
        )
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(MapsError::Configuration(
                "Google Maps API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    async fn call<T>(&self, url: &str, mut params: Vec<(&'static str, String)>) -> Result<T>
    where
        T: DeserializeOwned + ProviderEnvelope,
    {
        self.ensure_credentials()?;
        params.push(("key", self.api_key.clone()));

        let response = self.http.get(url).query(&params).send().await?;
        let http_status = response.status();
        let body = response.bytes().await?;

        let envelope: T = serde_json::from_slice(&body).map_err(|e| {
            MapsError::Transport(format!(
                "malformed response from provider (HTTP {}): {}",
                http_status, e
            ))
        })?;

        let status = ProviderStatus::parse(envelope.status());
        if status.is_success() {
            debug!(url, status = envelope.status(), "Provider call succeeded");
            return Ok(envelope);
        }

        warn!(url, status = envelope.status(), http_status = %http_status, "Provider returned an error status");
        Err(MapsError::provider(
            envelope.status(),
            envelope.error_message().map(str::to_string),
        ))
    }
}

fn push_opt(params: &mut Vec<(&'static str, String)>, name: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        params.push((name, value.to_string()));
    }
}

#[async_trait]
impl MapsProvider for GoogleMapsClient {
    fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn geocode(&self, req: &GeocodeRequest) -> Result<GeocodeResponse> {
        let mut params = vec![("address", req.address.clone())];
        push_opt(&mut params, "language", &req.language);
        push_opt(&mut params, "region", &req.region);
        self.call(&self.endpoints.geocoding, params).await
    }

    async fn reverse_geocode(&self, req: &ReverseGeocodeRequest) -> Result<GeocodeResponse> {
        let mut params = vec![(
            "latlng",
            format!("{:.8},{:.8}", req.latitude, req.longitude),
        )];
        push_opt(&mut params, "language", &req.language);
        push_opt(&mut params, "result_type", &req.result_type);
        push_opt(&mut params, "location_type", &req.location_type);
        self.call(&self.endpoints.geocoding, params).await
    }

    async fn text_search(&self, req: &PlacesSearchRequest) -> Result<PlacesSearchResponse> {
        let url = format!("{}/textsearch/json", self.endpoints.places.trim_end_matches('/'));
        let mut params = Vec::new();
        push_opt(&mut params, "query", &req.query);
        push_opt(&mut params, "location", &req.location);
        if let Some(radius) = req.radius.filter(|r| *r > 0) {
            params.push(("radius", radius.to_string()));
        }
        push_opt(&mut params, "type", &req.place_type);
        push_opt(&mut params, "language", &req.language);
        push_opt(&mut params, "region", &req.region);
        self.call(&url, params).await
    }

    async fn directions(&self, req: &DirectionsRequest) -> Result<DirectionsResponse> {
        let mut params = vec![
            ("origin", req.origin.clone()),
            ("destination", req.destination.clone()),
        ];
        push_opt(&mut params, "mode", &req.mode);
        push_opt(&mut params, "language", &req.language);
        push_opt(&mut params, "region", &req.region);
        if req.alternatives {
            params.push(("alternatives", "true".to_string()));
        }
        push_opt(&mut params, "avoid", &req.avoid);
        push_opt(&mut params, "units", &req.units);
        self.call(&self.endpoints.directions, params).await
    }

    async fn distance_matrix(&self, req: &DistanceMatrixRequest) -> Result<DistanceMatrixResponse> {
        let mut params = vec![
            ("origins", req.origins.join("|")),
            ("destinations", req.destinations.join("|")),
        ];
        push_opt(&mut params, "mode", &req.mode);
        push_opt(&mut params, "language", &req.language);
        push_opt(&mut params, "region", &req.region);
        push_opt(&mut params, "units", &req.units);
        push_opt(&mut params, "traffic_model", &req.traffic_model);
        push_opt(&mut params, "departure_time", &req.departure_time);
        push_opt(&mut params, "arrival_time", &req.arrival_time);
        self.call(&self.endpoints.distance_matrix, params).await
    }
}

impl std::fmt::Debug for GoogleMapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsClient")
            .field("endpoints", &self.endpoints)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
