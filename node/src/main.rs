// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use glint_node::config::NodeConfig;
use glint_node::server::{build_router, SessionHub, SharedHub};
use glint_node::telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    telemetry::init_telemetry();

    let cfg = NodeConfig::default();
    tracing::info!("Initializing glint relay with config: {:?}", cfg);

    let hub: SharedHub = Arc::new(SessionHub::new());
    let app = build_router(hub);

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
