//! TTL-bound snapshot cache.
//!
//! Maps a service name to its fetched [`OpenApiSnapshot`]. Reads go through
//! the sharded [`DashMap`] without a global lock. Misses for the same
//! service are serialized on a per-name async mutex so that at most one
//! upstream fetch per service is in flight; callers that queued behind it
//! re-check the entry and are served from the fresh snapshot.

use crate::fetcher::DocumentFetcher;
use crate::metrics::CacheMetrics;
use dashmap::DashMap;
use openapi_mcp_kernel::{FetchError, OpenApiSnapshot, ServiceDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Expiry used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One cached snapshot. Replaced wholesale on refresh.
struct CacheEntry {
    snapshot: Arc<OpenApiSnapshot>,
    expires_at: Instant,
}

pub struct SnapshotCache {
    fetcher: Arc<dyn DocumentFetcher>,
    /// `None` disables caching.
    ttl: Option<Duration>,
    entries: DashMap<String, CacheEntry>,
    flights: DashMap<String, Arc<Mutex<()>>>,
    metrics: Arc<CacheMetrics>,
}

impl SnapshotCache {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        ttl: Option<Duration>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            fetcher,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            entries: DashMap::new(),
            flights: DashMap::new(),
            metrics,
        }
    }

    /// Snapshot for `service`, fetching it when absent or expired.
    ///
    /// With caching disabled every call fetches and nothing is stored; hit
    /// and miss counters are left untouched on that path. A failed fetch is
    /// counted and returned, never cached.
    pub async fn get(&self, service: &ServiceDescriptor) -> Result<Arc<OpenApiSnapshot>, FetchError> {
        let Some(ttl) = self.ttl else {
            return self.load(service).await.map(Arc::new);
        };
        let name = service.name.as_str();

        if let Some(snapshot) = self.fresh(name) {
            return Ok(snapshot);
        }

        let flight = self.flights.entry(name.to_string()).or_default().value().clone();
        let _guard = flight.lock().await;

        // Another caller may have refreshed the entry while we waited.
        if let Some(snapshot) = self.fresh(name) {
            return Ok(snapshot);
        }

        self.metrics.record_miss(name);
        let snapshot = Arc::new(self.load(service).await?);
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                snapshot: Arc::clone(&snapshot),
                expires_at: expiry_after(ttl),
            },
        );
        self.metrics.set_cache_size(self.entries.len());
        Ok(snapshot)
    }

    /// Number of stored snapshots, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, name: &str) -> Option<Arc<OpenApiSnapshot>> {
        let entry = self.entries.get(name)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        self.metrics.record_hit(name);
        debug!(service = %name, "snapshot cache hit");
        Some(Arc::clone(&entry.snapshot))
    }

    async fn load(&self, service: &ServiceDescriptor) -> Result<OpenApiSnapshot, FetchError> {
        let started = Instant::now();
        let result = self
            .fetcher
            .fetch(service)
            .await
            .map(OpenApiSnapshot::from_document);
        let elapsed = started.elapsed();
        self.metrics.observe_fetch(&service.name, elapsed);

        match &result {
            Ok(snapshot) => info!(
                service = %service.name,
                elapsed_ms = elapsed.as_millis() as u64,
                paths = snapshot.index.api_index.len(),
                "fetched OpenAPI document"
            ),
            Err(e) => {
                self.metrics.record_fetch_error(&service.name);
                warn!(service = %service.name, error = %e, "OpenAPI document fetch failed");
            }
        }
        result
    }
}

fn expiry_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl).unwrap_or(now + FAR_FUTURE)
}
