use serde::Serialize;
use std::collections::HashMap;

use crate::cache::CacheStats;
use crate::config::CacheTtlPolicy;
use crate::metrics::OperationMetrics;

/// Envelope for administrative endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub api_key_configured: bool,
    pub rate_limit_per_second: f64,
    pub rate_limit_burst: u32,
    pub available_permits: u32,
    pub cache_ttls: CacheTtlPolicy,
}

#[derive(Debug, Serialize)]
pub struct UsageStats {
    pub cache_stats: CacheStats,
    pub usage: HashMap<String, OperationMetrics>,
    pub totals: OperationMetrics,
    pub api_info: ApiInfo,
    pub endpoints: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResult {
    pub removed_entries: usize,
}
