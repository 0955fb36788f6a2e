//! Cache-aware, rate-limited access to the mapping provider.
//!
//! Every single-shot operation follows the same path: check configuration,
//! build the canonical key, consult the cache, wait for a rate-limit permit,
//! call the provider, and cache the answer when the provider reported `OK`
//! or `ZERO_RESULTS`. Errors are never cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::config::{CacheTtlPolicy, Config};
use crate::error::{MapsError, Result};
use crate::fanout::{bounded_fan_out, merge_ranked_places};
use crate::key_generator::{self, Operation};
use crate::metrics::{UsageEvent, UsageMetrics};
use crate::models::{
    DirectionsRequest, DirectionsResponse, DistanceMatrixRequest, DistanceMatrixResponse,
    GeocodeRequest, GeocodeResponse, PlacesSearchRequest, PlacesSearchResponse, ProviderEnvelope, ProviderStatus, ReverseGeocodeRequest,
};
use crate::rate_limiter::RateLimiter;
use crate::upstream::{GoogleMapsClient, MapsProvider};
use crate::validation::RequestValidator;

/// Keyword used when a nearby search does not name one.
pub const DEFAULT_NEARBY_KEYWORD: &str = "心理諮商";

/// Radius in metres used when a nearby search does not name one.
pub const DEFAULT_NEARBY_RADIUS: u32 = 5000;

/// Queries issued alongside the caller's keyword in a nearby search.
const NEARBY_SYNONYMS: [&str; 4] = [
    "精神科診所 台灣",
    "心理健康中心 台灣",
    "諮商中心 台灣",
    "心理治療 台灣",
];

const NEARBY_PLACE_TYPE: &str = "health";

/// A cached provider answer. Keys are namespaced per operation, so a variant
/// mismatch on lookup is treated as a miss.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Geocode(Arc<GeocodeResponse>),
    Places(Arc<PlacesSearchResponse>),
    Directions(Arc<DirectionsResponse>),
}

trait Cacheable: ProviderEnvelope + Sized {
    fn into_cached(value: Arc<Self>) -> CachedResponse;
    fn from_cached(cached: CachedResponse) -> Option<Arc<Self>>;
}

impl Cacheable for GeocodeResponse {
    fn into_cached(value: Arc<Self>) -> CachedResponse {
        CachedResponse::Geocode(value)
    }

    fn from_cached(cached: CachedResponse) -> Option<Arc<Self>> {
        match cached {
            CachedResponse::Geocode(value) => Some(value),
            _ => None,
        }
    }
}

impl Cacheable for PlacesSearchResponse {
    fn into_cached(value: Arc<Self>) -> CachedResponse {
        CachedResponse::Places(value)
    }

    fn from_cached(cached: CachedResponse) -> Option<Arc<Self>> {
        match cached {
            CachedResponse::Places(value) => Some(value),
            _ => None,
        }
    }
}

impl Cacheable for DirectionsResponse {
    fn into_cached(value: Arc<Self>) -> CachedResponse {
        CachedResponse::Directions(value)
    }

    fn from_cached(cached: CachedResponse) -> Option<Arc<Self>> {
        match cached {
            CachedResponse::Directions(value) => Some(value),
            _ => None,
        }
    }
}

/// Fan-out limits and request defaults.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub ttls: CacheTtlPolicy,
    pub batch_max_items: usize,
    pub batch_concurrency: usize,
    pub nearby_max_results: usize,
    pub default_language: String,
    pub default_region: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            ttls: CacheTtlPolicy::default(),
            batch_max_items: 100,
            batch_concurrency: 5,
            nearby_max_results: 20,
            default_language: "zh-TW".to_string(),
            default_region: "tw".to_string(),
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            ttls: config.cache_ttls(),
            batch_max_items: config.batch_max_items,
            batch_concurrency: config.batch_concurrency,
            nearby_max_results: config.nearby_max_results,
            default_language: config.default_language.clone(),
            default_region: config.default_region.clone(),
        }
    }
}

pub struct MapsService {
    provider: Arc<dyn MapsProvider>,
    cache: TtlCache<CachedResponse>,
    limiter: RateLimiter,
    metrics: UsageMetrics,
    settings: ServiceSettings,
}

impl MapsService {
    pub fn new(provider: Arc<dyn MapsProvider>, limiter: RateLimiter, settings: ServiceSettings) -> Self {
        Self {
            provider,
            cache: TtlCache::new(),
            limiter,
            metrics: UsageMetrics::new(),
            settings,
        }
    }

    /// Builds the service against the real Google Maps endpoints.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = GoogleMapsClient::from_config(config)?;
        let limiter = RateLimiter::new(config.rate_limit_per_second, config.rate_limit_burst);
        Ok(Self::new(Arc::new(provider), limiter, ServiceSettings::from(config)))
    }

    fn ensure_configured(&self) -> Result<()> {
        if !self.provider.has_credentials() {
            return Err(MapsError::Configuration(
                "Google Maps API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Address to coordinates, cached for the geocode TTL.
    pub async fn geocode(
        &self,
        req: &GeocodeRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<GeocodeResponse>> {
        let key = key_generator::geocode_key(req);
        self.cached_call(
            Operation::Geocode,
            key,
            self.settings.ttls.geocode,
            cancel,
            self.provider.geocode(req),
        )
        .await
    }

    /// Coordinates to address, cached for the reverse geocode TTL.
    pub async fn reverse_geocode(
        &self,
        req: &ReverseGeocodeRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<GeocodeResponse>> {
        RequestValidator::check_coordinates(req.latitude, req.longitude)?;
        let key = key_generator::reverse_geocode_key(req);
        self.cached_call(
            Operation::ReverseGeocode,
            key,
            self.settings.ttls.reverse_geocode,
            cancel,
            self.provider.reverse_geocode(req),
        )
        .await
    }

    pub async fn directions(
        &self,
        req: &DirectionsRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<DirectionsResponse>> {
        let key = key_generator::directions_key(req);
        self.cached_call(
            Operation::Directions,
            key,
            self.settings.ttls.directions,
            cancel,
            self.provider.directions(req),
        )
        .await
    }

    /// Free-text place search. Rate limited but not cached.
    pub async fn search_places(
        &self,
        req: &PlacesSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<PlacesSearchResponse> {
        self.ensure_configured()?;
        self.limited_call(Operation::PlacesSearch, cancel, self.provider.text_search(req))
            .await
    }

    /// Travel distance and time between every origin and destination.
    /// Rate limited but not cached.
    pub async fn distance_matrix(
        &self,
        req: &DistanceMatrixRequest,
        cancel: &CancellationToken,
    ) -> Result<DistanceMatrixResponse> {
        self.ensure_configured()?;
        self.limited_call(Operation::DistanceMatrix, cancel, self.provider.distance_matrix(req))
            .await
    }

    /// Geocodes up to `batch_max_items` addresses with bounded concurrency.
    ///
    /// Result `i` belongs to address `i`. If any address fails the whole
    /// batch fails.
    pub async fn batch_geocode(
        &self,
        addresses: Vec<String>,
        language: Option<String>,
        region: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<GeocodeResponse>>> {
        let total = addresses.len();
        if total > self.settings.batch_max_items {
            return Err(MapsError::BatchSizeExceeded {
                count: total,
                max: self.settings.batch_max_items,
            });
        }
        self.ensure_configured()?;

        let language = language.or_else(|| Some(self.settings.default_language.clone()));
        let region = region.or_else(|| Some(self.settings.default_region.clone()));

        let outcomes = bounded_fan_out(addresses, self.settings.batch_concurrency, |address| {
            let req = GeocodeRequest {
                address,
                language: language.clone(),
                region: region.clone(),
            };
            async move { self.geocode(&req, cancel).await }
        })
        .await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        if failed > 0 {
            if cancel.is_cancelled() {
                return Err(MapsError::Cancelled);
            }
            if let Some(Err(first)) = outcomes.iter().find(|outcome| outcome.is_err()) {
                warn!(failed, total, error = %first, "Batch geocode failed");
            }
            return Err(MapsError::BatchFailed { failed, total });
        }

        outcomes.into_iter().collect()
    }

    /// Searches for mental-health services around a point.
    ///
    /// Runs the caller's keyword and a fixed set of synonyms concurrently.
    /// A failing sub-query is skipped; the survivors are deduplicated by
    /// place id, ranked by rating and truncated before being cached as one
    /// entry.
    pub async fn search_nearby_mental_health(
        &self,
        latitude: f64,
        longitude: f64,
        radius: Option<u32>,
        keyword: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Arc<PlacesSearchResponse>> {
        RequestValidator::check_coordinates(latitude, longitude)?;
        self.ensure_configured()?;

        let radius = radius.filter(|r| *r > 0).unwrap_or(DEFAULT_NEARBY_RADIUS);
        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_NEARBY_KEYWORD);

        let key = key_generator::nearby_search_key(latitude, longitude, radius, keyword);
        if let Some(hit) = self.cache_lookup::<PlacesSearchResponse>(Operation::NearbySearch, &key).await {
            return Ok(hit);
        }

        let queries = nearby_queries(keyword);
        let location = format!("{:.8},{:.8}", latitude, longitude);
        let concurrency = queries.len();

        let outcomes = bounded_fan_out(queries, concurrency, |query| {
            let req = PlacesSearchRequest {
                query: Some(query),
                location: Some(location.clone()),
                radius: Some(radius),
                place_type: Some(NEARBY_PLACE_TYPE.to_string()),
                language: Some(self.settings.default_language.clone()),
                region: Some(self.settings.default_region.clone()),
            };
            async move {
                let result = self
                    .limited_call(Operation::NearbySearch, cancel, self.provider.text_search(&req))
                    .await;
                (req.query, result)
            }
        })
        .await;

        // A cancelled search must not be cached as an empty answer.
        if cancel.is_cancelled() {
            return Err(MapsError::Cancelled);
        }

        let mut batches = Vec::with_capacity(outcomes.len());
        for (query, outcome) in outcomes {
            match outcome {
                Ok(resp) if ProviderStatus::parse(&resp.status) == ProviderStatus::Ok => {
                    batches.push(resp.results);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(query = query.as_deref().unwrap_or(""), error = %e, "Skipping failed nearby sub-query");
                }
            }
        }

        let results = merge_ranked_places(batches, self.settings.nearby_max_results);
        info!(
            latitude,
            longitude,
            radius,
            keyword,
            results = results.len(),
            "Nearby mental health search completed"
        );

        let response = Arc::new(PlacesSearchResponse {
            results,
            status: "OK".to_string(),
            next_page_token: None,
            error_message: None,
        });
        self.cache.set(
            key,
            PlacesSearchResponse::into_cached(Arc::clone(&response)),
            self.settings.ttls.nearby_search,
        );
        Ok(response)
    }

    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(removed, "Maps cache cleared");
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn metrics(&self) -> &UsageMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn is_configured(&self) -> bool {
        self.provider.has_credentials()
    }

    async fn cache_lookup<T: Cacheable>(&self, operation: Operation, key: &str) -> Option<Arc<T>> {
        match self.cache.get(key).and_then(T::from_cached) {
            Some(hit) => {
                debug!(%operation, key, "Cache hit");
                self.metrics.record(operation, UsageEvent::CacheHit).await;
                Some(hit)
            }
            None => {
                debug!(%operation, key, "Cache miss");
                self.metrics.record(operation, UsageEvent::CacheMiss).await;
                None
            }
        }
    }

    async fn cached_call<T, F>(
        &self,
        operation: Operation,
        key: String,
        ttl: Duration,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<Arc<T>>
    where
        T: Cacheable,
        F: Future<Output = Result<T>>,
    {
        self.ensure_configured()?;

        if let Some(hit) = self.cache_lookup::<T>(operation, &key).await {
            return Ok(hit);
        }

        let response = Arc::new(self.limited_call(operation, cancel, call).await?);
        self.cache.set(key, T::into_cached(Arc::clone(&response)), ttl);
        Ok(response)
    }

    /// Waits for a permit, then runs `call` unless `cancel` fires first.
    async fn limited_call<T, F>(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T>
    where
        T: ProviderEnvelope,
        F: Future<Output = Result<T>>,
    {
        self.limiter.wait(cancel).await?;
        self.metrics.record(operation, UsageEvent::UpstreamCall).await;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MapsError::Cancelled),
            result = call => result,
        };

        // Providers are expected to surface error statuses as errors already;
        // anything else that slips through must not reach the cache.
        let result = result.and_then(|response| match ProviderStatus::parse(response.status()) {
            ProviderStatus::Other(status) => Err(MapsError::provider(
                status,
                response.error_message().map(str::to_string),
            )),
            _ => Ok(response),
        });

        if let Err(e) = &result {
            warn!(%operation, error = %e, "Upstream call failed");
            self.metrics.record(operation, UsageEvent::UpstreamError).await;
        }
        result
    }
}

fn nearby_queries(keyword: &str) -> Vec<String> {
    std::iter::once(format!("{} 台灣", keyword))
        .chain(NEARBY_SYNONYMS.iter().map(|q| q.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_queries_lead_with_keyword() {
        let queries = nearby_queries("心理諮商");
        assert_eq!(queries.len(), 5);
        assert_eq!(queries[0], "心理諮商 台灣");
        assert_eq!(queries[1], "精神科診所 台灣");
    }

    #[test]
    fn test_cached_variant_mismatch_is_a_miss() {
        let cached = GeocodeResponse::into_cached(Arc::new(GeocodeResponse {
            status: "OK".into(),
            ..Default::default()
        }));
        assert!(DirectionsResponse::from_cached(cached.clone()).is_none());
        assert!(GeocodeResponse::from_cached(cached).is_some());
    }
}
