//! Dictionary metrics and observability.
//!
//! Counters are owned by a [`DictionaryLoader`](crate::i18n::DictionaryLoader)
//! instance rather than a process global, so tests can build isolated loaders.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for dictionary cache and lookup behaviour.
#[derive(Debug, Default)]
pub struct DictionaryMetrics {
    /// Number of `get` calls answered from the cache
    cache_hits: AtomicUsize,

    /// Number of `get` calls that had to consult the source
    cache_misses: AtomicUsize,

    /// Number of bundle loads that failed (missing file, invalid JSON, ...)
    load_failures: AtomicUsize,

    /// Number of times the default bundle was substituted for another locale
    fallbacks: AtomicUsize,

    /// Number of key lookups missing from the requested bundle
    missing_keys: AtomicUsize,
}

/// Point-in-time snapshot of [`DictionaryMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_hit_rate: f64,
    pub load_failures: usize,
    pub fallbacks: usize,
    pub missing_keys: usize,
}

impl DictionaryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_key(&self) {
        self.missing_keys.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn missing_keys(&self) -> usize {
        self.missing_keys.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total = hits + misses;
        let cache_hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            load_failures: self.load_failures(),
            fallbacks: self.fallbacks(),
            missing_keys: self.missing_keys(),
        }
    }
}
