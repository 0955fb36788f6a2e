//! Canonical cache keys for upstream requests.
//!
//! A key is `<operation>:<part>:<part>...`. Parts are appended in a fixed
//! order by each request type, text is escaped so that a `:` inside a value
//! can never be mistaken for a separator, and coordinates are encoded as
//! integer micro-degrees so equal positions always produce equal text.

use std::fmt;

use crate::models::{DirectionsRequest, GeocodeRequest, ReverseGeocodeRequest};

/// Operation namespace of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Geocode,
    ReverseGeocode,
    PlacesSearch,
    Directions,
    DistanceMatrix,
    NearbySearch,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Geocode => "geocode",
            Operation::ReverseGeocode => "reverse_geocode",
            Operation::PlacesSearch => "places_search",
            Operation::Directions => "directions",
            Operation::DistanceMatrix => "distance_matrix",
            Operation::NearbySearch => "mental_health",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for a single canonical key.
#[derive(Debug, Clone)]
pub struct CacheKey {
    buf: String,
}

impl CacheKey {
    pub fn new(operation: Operation) -> Self {
        Self {
            buf: operation.as_str().to_string(),
        }
    }

    pub fn text(mut self, value: &str) -> Self {
        self.buf.push(':');
        for c in value.chars() {
            match c {
                '%' => self.buf.push_str("%25"),
                ':' => self.buf.push_str("%3A"),
                c => self.buf.push(c),
            }
        }
        self
    }

    /// An absent value and an empty value are the same request upstream.
    pub fn opt_text(self, value: Option<&str>) -> Self {
        self.text(value.unwrap_or(""))
    }

    /// Appends a coordinate pair rounded to six decimal places.
    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.buf.push(':');
        self.buf.push_str(&micro_degrees(latitude).to_string());
        self.buf.push(',');
        self.buf.push_str(&micro_degrees(longitude).to_string());
        self
    }

    pub fn number(mut self, value: impl Into<i64>) -> Self {
        self.buf.push(':');
        self.buf.push_str(&value.into().to_string());
        self
    }

    pub fn flag(mut self, value: bool) -> Self {
        self.buf.push_str(if value { ":1" } else { ":0" });
        self
    }

    pub fn build(self) -> String {
        self.buf
    }
}

fn micro_degrees(value: f64) -> i64 {
    // `as` saturates and maps -0.0 to 0, so the sign of zero never leaks in.
    (value * 1_000_000.0).round() as i64
}

pub fn geocode_key(req: &GeocodeRequest) -> String {
    CacheKey::new(Operation::Geocode)
        .text(&req.address)
        .opt_text(req.language.as_deref())
        .opt_text(req.region.as_deref())
        .build()
}

pub fn reverse_geocode_key(req: &ReverseGeocodeRequest) -> String {
    CacheKey::new(Operation::ReverseGeocode)
        .coordinates(req.latitude, req.longitude)
        .opt_text(req.language.as_deref())
        .opt_text(req.result_type.as_deref())
        .opt_text(req.location_type.as_deref())
        .build()
}

pub fn directions_key(req: &DirectionsRequest) -> String {
    CacheKey::new(Operation::Directions)
        .text(&req.origin)
        .text(&req.destination)
        .opt_text(req.mode.as_deref())
        .opt_text(req.language.as_deref())
        .opt_text(req.region.as_deref())
        .flag(req.alternatives)
        .opt_text(req.avoid.as_deref())
        .opt_text(req.units.as_deref())
        .build()
}

pub fn nearby_search_key(latitude: f64, longitude: f64, radius: u32, keyword: &str) -> String {
    CacheKey::new(Operation::NearbySearch)
        .coordinates(latitude, longitude)
        .number(radius)
        .text(keyword)
        .build()
}
