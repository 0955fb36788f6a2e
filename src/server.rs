use crate::config::Config;
use crate::error::Result;
use crate::handlers::{
    batch_geocode, clear_cache, directions, distance_matrix, geocode, health_check,
    nearby_mental_health, readiness_check, reverse_geocode, search_places, usage_stats, AppState,
};
use crate::maps_service::MapsService;
use crate::middleware::logging_middleware;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Builds the router with all maps, admin and health routes.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let maps = Router::new()
        .route("/geocode", post(geocode))
        .route("/reverse-geocode", post(reverse_geocode))
        .route("/search-places", post(search_places))
        .route("/directions", post(directions))
        .route("/distance-matrix", post(distance_matrix))
        .route("/nearby-mental-health", get(nearby_mental_health))
        .route("/batch-geocode", post(batch_geocode))
        .route("/usage-stats", get(usage_stats))
        .route("/clear-cache", post(clear_cache));

    Router::new()
        .nest("/api/v1/google-maps", maps)
        // Health and readiness endpoints
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware))
                .layer(TimeoutLayer::new(request_timeout))
        )
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        let service = Arc::new(MapsService::from_config(&config)?);
        let shutdown = CancellationToken::new();
        let state = AppState::new(service, shutdown.clone());

        // Batches queue behind the rate limiter, so the whole request gets
        // more room than a single upstream call.
        let app = create_app(state, config.request_timeout() * 4);

        Ok(Self {
            app,
            bind_addr: config.bind_addr,
            shutdown,
        })
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        tracing::info!("Maps cache server listening on {}", self.bind_addr);
        tracing::info!("Maps endpoints available under /api/v1/google-maps");
        tracing::info!("Health check available at /health");

        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(self.shutdown))
        .await
    }
}

/// Resolves on Ctrl+C or SIGTERM and cancels every in-flight maps call.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }

    shutdown.cancel();
}
