// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "glint_node=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Initialize Metrics (Prometheus)
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Store handle for /metrics endpoint
    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(
        "glint_frames_displayed_total",
        "QR frames pushed to the prover display"
    );
    metrics::describe_counter!(
        "glint_chunks_scanned_total",
        "Chunks stored by the scanner for the first time"
    );
    metrics::describe_counter!(
        "glint_duplicate_chunks_total",
        "Re-captured chunks absorbed without re-acknowledgement"
    );
    metrics::describe_counter!(
        "glint_relay_events_total",
        "Side-channel events accepted by the relay"
    );
    metrics::describe_counter!(
        "glint_artifact_fetches_total",
        "Artifact downloads, initial and refresh"
    );
    metrics::describe_histogram!(
        "glint_verify_duration_seconds",
        "Wall time of one complete verification run including retries"
    );
    metrics::describe_gauge!(
        "glint_scan_progress",
        "Fraction of the current transfer stored by the scanner"
    );

    // Ensure at least one metric exists on startup
    metrics::gauge!("glint_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
