//! Prometheus metrics for the RFQ integration.
//!
//! Covers:
//! - Polling cycles per fetcher and outcome
//! - Order-book side writes into the shared cache
//! - Firm-quote negotiation outcomes
//! - Policy rejections (blacklist, signature mismatch)
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, register_int_gauge_vec,
    Counter, CounterVec, Encoder, HistogramVec, IntGaugeVec, TextEncoder,
};

/// Polling cycles.
/// Labels: fetcher (tokens/pairs/prices/blacklist), outcome (ok/request_error/validation_error)
pub static FETCH_CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dexalot_fetch_cycles_total",
        "Total polling cycles by fetcher and outcome",
        &["fetcher", "outcome"]
    )
    .unwrap()
});

/// Request round-trip of one polling cycle in milliseconds.
pub static FETCH_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dexalot_fetch_latency_ms",
        "Polling request latency in milliseconds",
        &["fetcher"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

/// Order-book sides written to the shared cache.
pub static BOOK_WRITES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dexalot_book_writes_total",
        "Total order-book sides written to the cache",
        &["side"]
    )
    .unwrap()
});

/// Directory sizes after the latest refresh.
/// Labels: directory (tokens/pairs)
pub static DIRECTORY_SIZE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "dexalot_directory_size",
        "Entries in the in-memory token and pair directories",
        &["directory"]
    )
    .unwrap()
});

/// Firm-quote negotiations.
/// Labels: outcome (ok/request_error/invalid)
pub static FIRM_QUOTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dexalot_firm_quotes_total",
        "Total firm-quote negotiations by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Requests rejected because the trader is denylisted.
pub static BLACKLIST_REJECTIONS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "dexalot_blacklist_rejections_total",
        "Total requests rejected by the blacklist guard"
    )
    .unwrap()
});

/// Firm orders whose signature would not pass the on-chain check.
pub static SIGNATURE_MISMATCH_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "dexalot_signature_mismatch_total",
        "Total firm orders rejected by local signature verification"
    )
    .unwrap()
});

/// Metrics facade for convenient access.
pub struct Metrics;

impl Metrics {
    /// Record a completed polling cycle.
    pub fn fetch_cycle(fetcher: &str, outcome: &str) {
        FETCH_CYCLES_TOTAL
            .with_label_values(&[fetcher, outcome])
            .inc();
    }

    /// Record the request latency of a polling cycle.
    pub fn fetch_latency(fetcher: &str, latency_ms: f64) {
        FETCH_LATENCY_MS
            .with_label_values(&[fetcher])
            .observe(latency_ms);
    }

    /// Record an order-book side written to the cache.
    pub fn book_written(side: &str) {
        BOOK_WRITES_TOTAL.with_label_values(&[side]).inc();
    }

    /// Set a directory's size.
    pub fn directory_size(directory: &str, size: usize) {
        DIRECTORY_SIZE
            .with_label_values(&[directory])
            .set(i64::try_from(size).unwrap_or(i64::MAX));
    }

    /// Record a firm-quote negotiation outcome.
    pub fn firm_quote(outcome: &str) {
        FIRM_QUOTES_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a blacklist rejection.
    pub fn blacklist_rejected() {
        BLACKLIST_REJECTIONS_TOTAL.inc();
    }

    /// Record a signature mismatch.
    pub fn signature_mismatch() {
        SIGNATURE_MISMATCH_TOTAL.inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_cycle_counts_by_label() {
        let before = FETCH_CYCLES_TOTAL
            .with_label_values(&["tokens", "ok"])
            .get();
        Metrics::fetch_cycle("tokens", "ok");
        Metrics::fetch_cycle("tokens", "ok");
        let after = FETCH_CYCLES_TOTAL
            .with_label_values(&["tokens", "ok"])
            .get();
        assert_eq!(after - before, 2.0);
    }

    #[test]
    fn test_render_contains_registered_metrics() {
        Metrics::blacklist_rejected();
        Metrics::book_written("bids");
        let text = Metrics::render().unwrap();
        assert!(text.contains("dexalot_blacklist_rejections_total"));
        assert!(text.contains("dexalot_book_writes_total"));
    }
}
