//! Dictionary loading metrics.
//!
//! Tracks how often a language switch was served from the dictionary cache
//! versus the network, and how many dictionary fetches failed. Each
//! `LanguageManager` owns one instance.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of times a dictionary was found in the cache
    cache_hits: AtomicUsize,

    /// Number of times a dictionary had to be fetched
    cache_misses: AtomicUsize,

    /// Number of dictionary fetches that completed successfully
    fetches: AtomicUsize,

    /// Number of dictionary fetches that failed (transport or malformed)
    fetch_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures.load(Ordering::Relaxed)
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
            fetches: self.fetches(),
            fetch_failures: self.fetch_failures(),
        }
    }
}

/// A snapshot of dictionary loading metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Cache hit rate as a percentage (0.0 - 100.0)
    pub cache_hit_rate: f64,
    pub fetches: usize,
    pub fetch_failures: usize,
}

impl MetricsReport {
    /// Format the report as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "Dictionary metrics: {} hits / {} misses ({:.1}% hit rate), {} fetched, {} failed",
            self.cache_hits, self.cache_misses, self.cache_hit_rate, self.fetches, self.fetch_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_start_at_zero() {
        let report = TranslationMetrics::new().report();
        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.cache_misses, 0);
        assert_eq!(report.cache_hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_miss();
        metrics.record_fetch();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();

        let report = metrics.report();
        assert_eq!(report.cache_hits, 3);
        assert_eq!(report.cache_misses, 1);
        assert!((report.cache_hit_rate - 75.0).abs() < f64::EPSILON);
        assert_eq!(report.fetches, 1);
    }

    #[test]
    fn test_report_format() {
        let metrics = TranslationMetrics::new();
        metrics.record_cache_miss();
        metrics.record_fetch_failure();
        let text = metrics.report().format();
        assert!(text.contains("0 hits / 1 misses"));
        assert!(text.contains("1 failed"));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(TranslationMetrics::new().report()).unwrap();
        assert_eq!(json["fetch_failures"], 0);
    }
}
