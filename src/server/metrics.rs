use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all vgs-server metrics
const PREFIX: &str = "vgs";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_attempts_total"), "Total Basic auth attempts"),
        &["status"]
    ).expect("Failed to create auth_attempts_total metric");

    // Library Metrics
    pub static ref RANDOM_SELECTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_random_selections_total"), "Random track selections by outcome"),
        &["outcome"]
    ).expect("Failed to create random_selections_total metric");

    pub static ref PLAYS_RECORDED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_plays_recorded_total"),
        "Total plays recorded in ledgers"
    ).expect("Failed to create plays_recorded_total metric");

    pub static ref LEDGER_SAVE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_ledger_save_duration_seconds"),
            "Ledger save duration in seconds, backup rotation included"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).expect("Failed to create ledger_save_duration_seconds metric");

    // Catalog Metrics
    pub static ref CATALOG_TRACKS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_tracks_total"),
        "Total tracks in catalog"
    ).expect("Failed to create catalog_tracks_total metric");

    pub static ref CATALOG_SIZE_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_size_bytes"),
        "Catalog size in bytes, as declared by the metadata file"
    ).expect("Failed to create catalog_size_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(RANDOM_SELECTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PLAYS_RECORDED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(LEDGER_SAVE_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_TRACKS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_SIZE_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn init_catalog_metrics(num_tracks: usize, size_bytes: u64) {
    CATALOG_TRACKS_TOTAL.set(num_tracks as f64);
    CATALOG_SIZE_BYTES.set(size_bytes as f64);

    tracing::info!(
        "Catalog metrics initialized: {} tracks, {:#}",
        num_tracks,
        byte_unit::Byte::from(size_bytes)
    );
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_auth_attempt(success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_selection(found: bool) {
    let outcome = if found { "found" } else { "empty" };
    RANDOM_SELECTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_play() {
    PLAYS_RECORDED_TOTAL.inc();
}

pub fn record_ledger_save(duration: Duration) {
    LEDGER_SAVE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
