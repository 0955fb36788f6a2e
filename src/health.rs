use std::sync::Arc;
use std::time::SystemTime;
use serde::Serialize;
use tokio::time::Instant;

use crate::cache::CacheStats;
use crate::maps_service::MapsService;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub google_maps: ServiceStatus,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub available_permits: u32,
    pub error: Option<String>,
}

pub struct HealthChecker {
    service: Arc<MapsService>,
    started_at: Instant,
}

impl HealthChecker {
    /// Uptime is counted from construction.
    pub fn new(service: Arc<MapsService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn check_health(&self) -> HealthStatus {
        let now = SystemTime::now();
        let uptime = self.started_at.elapsed().as_secs();

        let maps_status = self.check_google_maps();

        let overall_status = if maps_status.status == "healthy" {
            "healthy"
        } else {
            "degraded" // Serving, but every maps call will fail fast
        };

        HealthStatus {
            status: overall_status.to_string(),
            timestamp: now.duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            dependencies: DependencyStatus {
                google_maps: maps_status,
                cache: self.service.cache_stats(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.service.is_configured()
    }

    fn check_google_maps(&self) -> ServiceStatus {
        let available_permits = self.service.limiter().available_permits();

        if self.service.is_configured() {
            ServiceStatus {
                status: "healthy".to_string(),
                available_permits,
                error: None,
            }
        } else {
            ServiceStatus {
                status: "unavailable".to_string(),
                available_permits,
                error: Some("Google Maps API key not configured".to_string()),
            }
        }
    }
}
