use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::key_generator::Operation;

/// Counters for one upstream operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_calls: u64,
    pub upstream_errors: u64,
    pub last_reset: u64,
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self {
            cache_hits: 0,
            cache_misses: 0,
            upstream_calls: 0,
            upstream_errors: 0,
            last_reset: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEvent {
    CacheHit,
    CacheMiss,
    UpstreamCall,
    UpstreamError,
}

/// Per-operation usage of the upstream provider.
#[derive(Debug, Clone, Default)]
pub struct UsageMetrics {
    operations: Arc<RwLock<HashMap<Operation, OperationMetrics>>>,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, operation: Operation, event: UsageEvent) {
        let mut operations = self.operations.write().await;
        let metrics = operations.entry(operation).or_default();

        match event {
            UsageEvent::CacheHit => metrics.cache_hits += 1,
            UsageEvent::CacheMiss => metrics.cache_misses += 1,
            UsageEvent::UpstreamCall => metrics.upstream_calls += 1,
            UsageEvent::UpstreamError => metrics.upstream_errors += 1,
        }
    }

    /// Snapshot keyed by operation name.
    pub async fn snapshot(&self) -> HashMap<String, OperationMetrics> {
        let operations = self.operations.read().await;
        operations
            .iter()
            .map(|(op, metrics)| (op.as_str().to_string(), metrics.clone()))
            .collect()
    }

    pub async fn totals(&self) -> OperationMetrics {
        let operations = self.operations.read().await;
        let mut total = OperationMetrics::default();

        for metrics in operations.values() {
            total.cache_hits += metrics.cache_hits;
            total.cache_misses += metrics.cache_misses;
            total.upstream_calls += metrics.upstream_calls;
            total.upstream_errors += metrics.upstream_errors;
        }

        total
    }

    pub async fn reset(&self) {
        self.operations.write().await.clear();
    }
}
