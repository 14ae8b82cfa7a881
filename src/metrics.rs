//! Prometheus metrics for the sale webhook
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::sync::Once;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

static INIT: Once = Once::new();

const REQUESTS_TOTAL: &str = "sale_ingest_requests_total";
const DUPLICATES_TOTAL: &str = "sale_ingest_duplicates_total";
const LOOKUP_FAILURES_TOTAL: &str = "sale_ingest_lookup_failures_total";
const INSERT_FAILURES_TOTAL: &str = "sale_ingest_insert_failures_total";
const STORE_DURATION_SECONDS: &str = "sale_ingest_store_duration_seconds";

/// Install the Prometheus recorder with an HTTP listener on `addr`. Idempotent.
pub fn init_metrics(addr: SocketAddr) {
    INIT.call_once(|| {
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => {
                describe();
                info!("Prometheus exporter listening on http://{}/metrics", addr);
            }
            Err(e) => {
                warn!("Prometheus exporter install failed: {}", e);
            }
        }
    });
}

fn describe() {
    ::metrics::describe_counter!(REQUESTS_TOTAL, "Webhook calls by outcome");
    ::metrics::describe_counter!(DUPLICATES_TOTAL, "Sales ignored because their txn was already recorded");
    ::metrics::describe_counter!(LOOKUP_FAILURES_TOTAL, "Device registry queries that failed");
    ::metrics::describe_counter!(INSERT_FAILURES_TOTAL, "Sales inserts that failed for reasons other than duplicates");
    ::metrics::describe_histogram!(STORE_DURATION_SECONDS, "Latency of storage calls by operation");
}

/// Metric helpers for the ingest pipeline
pub struct IngestMetrics;

impl IngestMetrics {
    /// Count a finished request. `outcome` is "inserted", "duplicate" or an error kind.
    pub fn record_outcome(outcome: &'static str) {
        ::metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
    }

    pub fn record_duplicate() {
        ::metrics::counter!(DUPLICATES_TOTAL).increment(1);
    }

    pub fn record_lookup_failure() {
        ::metrics::counter!(LOOKUP_FAILURES_TOTAL).increment(1);
    }

    pub fn record_insert_failure() {
        ::metrics::counter!(INSERT_FAILURES_TOTAL).increment(1);
    }

    /// `op` is "lookup" or "insert"
    pub fn record_store_duration(op: &'static str, duration_secs: f64) {
        ::metrics::histogram!(STORE_DURATION_SECONDS, "op" => op).record(duration_secs);
    }
}
