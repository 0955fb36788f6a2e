use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:8080")]
    pub bind_addr: SocketAddr,

    /// Log level used when RUST_LOG is unset
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Google Maps API key; an empty key makes every maps call fail fast
    #[envconfig(from = "GOOGLE_MAPS_API_KEY", default = "")]
    pub google_maps_api_key: String,

    #[envconfig(
        from = "GOOGLE_MAPS_GEOCODING_URL",
        default = "https://maps.googleapis.com/maps/api/geocode/json"
    )]
    pub geocoding_url: String,

    /// Places API base; text search lives under `/textsearch/json`
    #[envconfig(
        from = "GOOGLE_MAPS_PLACES_URL",
        default = "https://maps.googleapis.com/maps/api/place"
    )]
    pub places_url: String,

    #[envconfig(
        from = "GOOGLE_MAPS_DIRECTIONS_URL",
        default = "https://maps.googleapis.com/maps/api/directions/json"
    )]
    pub directions_url: String,

    #[envconfig(
        from = "GOOGLE_MAPS_DISTANCE_MATRIX_URL",
        default = "https://maps.googleapis.com/maps/api/distancematrix/json"
    )]
    pub distance_matrix_url: String,

    /// Upstream request timeout in seconds
    #[envconfig(from = "GOOGLE_MAPS_TIMEOUT_SECS", default = "30")]
    pub request_timeout_secs: u64,

    /// Sustained upstream requests per second
    #[envconfig(from = "MAPS_RATE_LIMIT_PER_SECOND", default = "10")]
    pub rate_limit_per_second: u32,

    /// Upstream requests that may be issued back to back
    #[envconfig(from = "MAPS_RATE_LIMIT_BURST", default = "20")]
    pub rate_limit_burst: u32,

    #[envconfig(from = "MAPS_DEFAULT_LANGUAGE", default = "zh-TW")]
    pub default_language: String,

    #[envconfig(from = "MAPS_DEFAULT_REGION", default = "tw")]
    pub default_region: String,

    #[envconfig(from = "MAPS_BATCH_MAX_ITEMS", default = "100")]
    pub batch_max_items: usize,

    /// Concurrent upstream calls per batch
    #[envconfig(from = "MAPS_BATCH_CONCURRENCY", default = "5")]
    pub batch_concurrency: usize,

    #[envconfig(from = "MAPS_NEARBY_MAX_RESULTS", default = "20")]
    pub nearby_max_results: usize,

    #[envconfig(from = "CACHE_TTL_GEOCODE_SECS", default = "3600")]
    pub geocode_ttl_secs: u64,

    #[envconfig(from = "CACHE_TTL_REVERSE_GEOCODE_SECS", default = "86400")]
    pub reverse_geocode_ttl_secs: u64,

    #[envconfig(from = "CACHE_TTL_DIRECTIONS_SECS", default = "900")]
    pub directions_ttl_secs: u64,

    #[envconfig(from = "CACHE_TTL_NEARBY_SECS", default = "1800")]
    pub nearby_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttls(&self) -> CacheTtlPolicy {
        CacheTtlPolicy {
            geocode: Duration::from_secs(self.geocode_ttl_secs),
            reverse_geocode: Duration::from_secs(self.reverse_geocode_ttl_secs),
            directions: Duration::from_secs(self.directions_ttl_secs),
            nearby_search: Duration::from_secs(self.nearby_ttl_secs),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.google_maps_api_key.trim().is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            google_maps_api_key: String::new(),
            geocoding_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            places_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            directions_url: "https://maps.googleapis.com/maps/api/directions/json".to_string(),
            distance_matrix_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            request_timeout_secs: 30,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            default_language: "zh-TW".to_string(),
            default_region: "tw".to_string(),
            batch_max_items: 100,
            batch_concurrency: 5,
            nearby_max_results: 20,
            geocode_ttl_secs: 3600,
            reverse_geocode_ttl_secs: 86400,
            directions_ttl_secs: 900,
            nearby_ttl_secs: 1800,
        }
    }
}

/// How long each operation's answers stay cached.
///
/// Geocodes rarely change, coordinates-to-place even less; directions depend
/// on traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheTtlPolicy {
    #[serde(with = "humantime_serde")]
    pub geocode: Duration,
    #[serde(with = "humantime_serde")]
    pub reverse_geocode: Duration,
    #[serde(with = "humantime_serde")]
    pub directions: Duration,
    #[serde(with = "humantime_serde")]
    pub nearby_search: Duration,
}

impl Default for CacheTtlPolicy {
    fn default() -> Self {
        Self {
            geocode: Duration::from_secs(60 * 60),
            reverse_geocode: Duration::from_secs(24 * 60 * 60),
            directions: Duration::from_secs(15 * 60),
            nearby_search: Duration::from_secs(30 * 60),
        }
    }
}
