use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::MapsError;
use crate::health::HealthChecker;
use crate::maps_service::MapsService;
use crate::models::{
    BatchGeocodeRequest, BatchGeocodeResponse, DirectionsRequest, DistanceMatrixRequest,
    GeocodeRequest, NearbySearchQuery, PlacesSearchRequest, ReverseGeocodeRequest,
};
use crate::response::{ApiInfo, ApiResponse, ClearCacheResult, UsageStats};
use crate::validation::RequestValidator;

/// Routes served under the maps prefix, reported by usage-stats
pub const MAPS_ENDPOINTS: [&str; 9] = [
    "POST /api/v1/google-maps/geocode",
    "POST /api/v1/google-maps/reverse-geocode",
    "POST /api/v1/google-maps/search-places",
    "POST /api/v1/google-maps/directions",
    "POST /api/v1/google-maps/distance-matrix",
    "GET /api/v1/google-maps/nearby-mental-health",
    "POST /api/v1/google-maps/batch-geocode",
    "GET /api/v1/google-maps/usage-stats",
    "POST /api/v1/google-maps/clear-cache",
];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MapsService>,
    pub health: Arc<HealthChecker>,
    /// Cancelled on shutdown; each request works under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(service: Arc<MapsService>, shutdown: CancellationToken) -> Self {
        let health = Arc::new(HealthChecker::new(Arc::clone(&service)));
        Self {
            service,
            health,
            shutdown,
        }
    }

    fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Convert an address to coordinates
pub async fn geocode(
    State(state): State<AppState>,
    Json(payload): Json<GeocodeRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate(&payload)?;

    let response = state
        .service
        .geocode(&payload, &state.request_token())
        .await?;

    Ok(Json(response))
}

/// Convert coordinates to an address
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Json(payload): Json<ReverseGeocodeRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate_reverse_geocode(&payload)?;

    let response = state
        .service
        .reverse_geocode(&payload, &state.request_token())
        .await?;

    Ok(Json(response))
}

pub async fn search_places(
    State(state): State<AppState>,
    Json(payload): Json<PlacesSearchRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate_places_search(&payload)?;

    let response = state
        .service
        .search_places(&payload, &state.request_token())
        .await?;

    Ok(Json(response))
}

pub async fn directions(
    State(state): State<AppState>,
    Json(payload): Json<DirectionsRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate(&payload)?;

    let response = state
        .service
        .directions(&payload, &state.request_token())
        .await?;

    Ok(Json(response))
}

pub async fn distance_matrix(
    State(state): State<AppState>,
    Json(payload): Json<DistanceMatrixRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate_distance_matrix(&payload)?;

    let response = state
        .service
        .distance_matrix(&payload, &state.request_token())
        .await?;

    Ok(Json(response))
}

/// Merged mental-health place search around a point
pub async fn nearby_mental_health(
    State(state): State<AppState>,
    Query(query): Query<NearbySearchQuery>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate_nearby(&query)?;

    let response = state
        .service
        .search_nearby_mental_health(
            query.latitude,
            query.longitude,
            query.radius,
            query.keyword.as_deref(),
            &state.request_token(),
        )
        .await?;

    Ok(Json(response))
}

/// Geocode many addresses; fails as a whole if any address fails
pub async fn batch_geocode(
    State(state): State<AppState>,
    Json(payload): Json<BatchGeocodeRequest>,
) -> Result<impl IntoResponse, MapsError> {
    RequestValidator::validate_batch(&payload)?;

    let results = state
        .service
        .batch_geocode(
            payload.addresses,
            payload.language,
            payload.region,
            &state.request_token(),
        )
        .await?;

    Ok(Json(BatchGeocodeResponse {
        total: results.len(),
        results,
        status: "OK".to_string(),
    }))
}

pub async fn usage_stats(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.service;
    let limiter = service.limiter();

    let stats = UsageStats {
        cache_stats: service.cache_stats(),
        usage: service.metrics().snapshot().await,
        totals: service.metrics().totals().await,
        api_info: ApiInfo {
            api_key_configured: service.is_configured(),
            rate_limit_per_second: limiter.rate_per_second(),
            rate_limit_burst: limiter.burst(),
            available_permits: limiter.available_permits(),
            cache_ttls: service.settings().ttls.clone(),
        },
        endpoints: MAPS_ENDPOINTS.to_vec(),
    };

    Json(ApiResponse::ok(stats, "Usage statistics"))
}

pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    let removed_entries = state.service.clear_cache();
    state.service.metrics().reset().await;

    Json(ApiResponse::ok(
        ClearCacheResult { removed_entries },
        "Cache cleared",
    ))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health.check_health())
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, Json(serde_json::json!({
            "status": "ready",
            "google_maps": "configured"
        })))
    } else {
        (StatusCode::OK, Json(serde_json::json!({
            "status": "degraded",
            "google_maps": "not configured",
            "note": "Maps endpoints will fail until GOOGLE_MAPS_API_KEY is set"
        })))
    }
}
