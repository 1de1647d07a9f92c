//! Metrics collection.
//!
//! # Metrics
//! - `url_mappings_cache_hits_total` (counter): lookups served from a cache
//! - `url_mappings_cache_misses_total` (counter): lookups that fell through
//! - `url_mappings_cache_evictions_total` (counter): entries evicted for weight
//! - `url_mappings_cache_weight` (gauge): current weighted size
//! - `url_mappings_reloads_total` (counter): holder rebuilds by outcome
//!
//! # Design Decisions
//! - Emits through the `metrics` facade only; no exporter is installed here,
//!   so recording is a no-op unless the embedding process installs a recorder
//! - Every cache metric carries a `cache` label naming the cache

pub fn record_cache_hit(cache: &'static str) {
    metrics::counter!("url_mappings_cache_hits_total", "cache" => cache).increment(1);
}

pub fn record_cache_miss(cache: &'static str) {
    metrics::counter!("url_mappings_cache_misses_total", "cache" => cache).increment(1);
}

pub fn record_cache_eviction(cache: &'static str) {
    metrics::counter!("url_mappings_cache_evictions_total", "cache" => cache).increment(1);
}

pub fn record_cache_weight(cache: &'static str, weight: usize) {
    metrics::gauge!("url_mappings_cache_weight", "cache" => cache).set(weight as f64);
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("url_mappings_reloads_total", "outcome" => outcome).increment(1);
}
