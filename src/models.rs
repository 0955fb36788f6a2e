//! Request and response shapes for the Google Maps web services.
//!
//! Responses mirror the provider's JSON and are passed through to callers
//! unchanged; every field defaults so that sparse payloads still parse.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Language and region codes such as `en`, `tw` or `zh-TW`.
static LOCALE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z]{2})?$").expect("valid locale regex"));

/// The provider's application-level status, distinct from the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    Other(String),
}

impl ProviderStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "OK" => ProviderStatus::Ok,
            "ZERO_RESULTS" => ProviderStatus::ZeroResults,
            other => ProviderStatus::Other(other.to_string()),
        }
    }

    /// `OK` and `ZERO_RESULTS` are both successful, cacheable answers.
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderStatus::Ok | ProviderStatus::ZeroResults)
    }
}

/// Implemented by every provider envelope.
pub trait ProviderEnvelope {
    fn status(&self) -> &str;
    fn error_message(&self) -> Option<&str>;
}

macro_rules! provider_envelope {
    ($($ty:ty),+) => {
        $(impl ProviderEnvelope for $ty {
            fn status(&self) -> &str {
                &self.status
            }

            fn error_message(&self) -> Option<&str> {
                self.error_message.as_deref()
            }
        })+
    };
}

provider_envelope!(
    GeocodeResponse,
    PlacesSearchResponse,
    DirectionsResponse,
    DistanceMatrixResponse
);

// -- Requests --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeocodeRequest {
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReverseGeocodeRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    /// e.g. `street_address`, `route`, `administrative_area_level_1`
    #[serde(default)]
    pub result_type: Option<String>,
    /// e.g. `ROOFTOP`, `APPROXIMATE`
    #[serde(default)]
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlacesSearchRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500))]
    pub query: Option<String>,
    /// `"lat,lng"`
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 50000))]
    pub radius: Option<u32>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DirectionsRequest {
    #[validate(length(min = 1, max = 500))]
    pub origin: String,
    #[validate(length(min = 1, max = 500))]
    pub destination: String,
    /// driving, walking, bicycling, transit
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub region: Option<String>,
    #[serde(default)]
    pub alternatives: bool,
    /// tolls, highways, ferries, indoor
    #[serde(default)]
    pub avoid: Option<String>,
    /// metric, imperial
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchGeocodeRequest {
    #[validate(length(min = 1))]
    pub addresses: Vec<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub region: Option<String>,
}

/// Up to 25 origins by 25 destinations, each an address or `"lat,lng"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct DistanceMatrixRequest {
    #[validate(length(min = 1, max = 25))]
    pub origins: Vec<String>,
    #[validate(length(min = 1, max = 25))]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 10), regex(path = *LOCALE_CODE))]
    pub region: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    /// `best_guess`, `pessimistic` or `optimistic`
    #[serde(default)]
    pub traffic_model: Option<String>,
    /// Unix timestamp or `now`
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NearbySearchQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    #[validate(range(min = 1, max = 50000))]
    pub radius: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub keyword: Option<String>,
}

// -- Responses --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeResult {
    pub address_components: Vec<AddressComponent>,
    pub formatted_address: String,
    pub geometry: Geometry,
    pub place_id: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub location: LatLng,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesSearchResponse {
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceResult {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<PlacePhoto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
}

impl PlaceResult {
    /// Ranking score; places without a rating rank as zero.
    pub fn score(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacePhoto {
    pub photo_reference: String,
    pub height: u32,
    pub width: u32,
    pub html_attributions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub summary: String,
    pub legs: Vec<Leg>,
    pub overview_polyline: Polyline,
    pub bounds: Bounds,
    pub copyrights: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub waypoint_order: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leg {
    pub distance: TextValue,
    pub duration: TextValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_traffic: Option<TextValue>,
    pub start_address: String,
    pub end_address: String,
    pub start_location: LatLng,
    pub end_location: LatLng,
    pub steps: Vec<Step>,
}

/// Distance in metres or duration in seconds, with display text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextValue {
    pub text: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub distance: TextValue,
    pub duration: TextValue,
    pub start_location: LatLng,
    pub end_location: LatLng,
    pub html_instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<String>,
    pub polyline: Polyline,
    pub travel_mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrixResponse {
    #[serde(default)]
    pub origin_addresses: Vec<String>,
    #[serde(default)]
    pub destination_addresses: Vec<String>,
    #[serde(default)]
    pub rows: Vec<DistanceMatrixRow>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMatrixRow {
    pub elements: Vec<DistanceMatrixElement>,
}

/// One origin/destination pair. `status` is per element, e.g. `NOT_FOUND`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMatrixElement {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<TextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<TextValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_traffic: Option<TextValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyline {
    pub points: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchGeocodeResponse {
    pub results: Vec<Arc<GeocodeResponse>>,
    pub total: usize,
    pub status: String,
}
