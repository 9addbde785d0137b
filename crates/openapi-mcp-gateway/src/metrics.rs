//! Snapshot cache instrumentation.
//!
//! All series live in a private prometheus [`Registry`]. Updates are atomic
//! in-memory operations; text exposition happens only when `/metrics` is
//! scraped.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

const SERVICE_LABEL: &str = "service";

/// Counters, fetch timer and size gauge of the snapshot cache.
pub struct CacheMetrics {
    registry: Registry,
    hits: IntCounterVec,
    misses: IntCounterVec,
    fetch_errors: IntCounterVec,
    fetch_duration: HistogramVec,
    cache_size: IntGauge,
}

impl CacheMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let hits = IntCounterVec::new(
            Opts::new("openapi_cache_hit_total", "Snapshot cache hits by service"),
            &[SERVICE_LABEL],
        )?;
        let misses = IntCounterVec::new(
            Opts::new("openapi_cache_miss_total", "Snapshot cache misses by service"),
            &[SERVICE_LABEL],
        )?;
        let fetch_errors = IntCounterVec::new(
            Opts::new(
                "openapi_fetch_error_total",
                "Failed OpenAPI document fetches by service",
            ),
            &[SERVICE_LABEL],
        )?;
        let fetch_duration = HistogramVec::new(
            HistogramOpts::new(
                "openapi_fetch_duration_seconds",
                "OpenAPI document fetch and index latency by service",
            ),
            &[SERVICE_LABEL],
        )?;
        let cache_size = IntGauge::new("openapi_cache_size", "Number of cached snapshots")?;

        registry.register(Box::new(hits.clone()))?;
        registry.register(Box::new(misses.clone()))?;
        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(fetch_duration.clone()))?;
        registry.register(Box::new(cache_size.clone()))?;

        Ok(Self {
            registry,
            hits,
            misses,
            fetch_errors,
            fetch_duration,
            cache_size,
        })
    }

    pub fn record_hit(&self, service: &str) {
        self.hits.with_label_values(&[service]).inc();
    }

    pub fn record_miss(&self, service: &str) {
        self.misses.with_label_values(&[service]).inc();
    }

    pub fn record_fetch_error(&self, service: &str) {
        self.fetch_errors.with_label_values(&[service]).inc();
    }

    pub fn observe_fetch(&self, service: &str, elapsed: Duration) {
        self.fetch_duration
            .with_label_values(&[service])
            .observe(elapsed.as_secs_f64());
    }

    pub fn set_cache_size(&self, size: usize) {
        self.cache_size.set(i64::try_from(size).unwrap_or(i64::MAX));
    }

    pub fn hit_count(&self, service: &str) -> u64 {
        self.hits.with_label_values(&[service]).get()
    }

    pub fn miss_count(&self, service: &str) -> u64 {
        self.misses.with_label_values(&[service]).get()
    }

    pub fn fetch_error_count(&self, service: &str) -> u64 {
        self.fetch_errors.with_label_values(&[service]).get()
    }

    pub fn fetch_count(&self, service: &str) -> u64 {
        self.fetch_duration
            .with_label_values(&[service])
            .get_sample_count()
    }

    pub fn cache_size(&self) -> i64 {
        self.cache_size.get()
    }

    /// Render every series in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
