//! Observability wiring for the gatekeeper service.
//!
//! # Purpose
//! Initializes structured tracing with an `RUST_LOG`-driven filter and builds
//! the per-request span used by the HTTP trace layer.
//!
//! # Notes
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBS_INIT: OnceLock<()> = OnceLock::new();

pub const DEFAULT_FILTER: &str = "info";

pub fn init_observability(service_name: &str) {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
        let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);
        // Another subscriber may already be installed (tests); keep it.
        let _ = registry.try_init();
        tracing::info!(service = service_name, "tracing initialized");
    });
}

/// Span opened for every HTTP request by the router's trace layer.
pub fn http_request_span<B>(request: &axum::http::Request<B>) -> tracing::Span {
    tracing::info_span!(
        "http.request",
        method = %request.method(),
        uri = %request.uri().path(),
        version = ?request.version()
    )
}
