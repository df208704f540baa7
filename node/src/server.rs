// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Side-channel relay. One WebSocket endpoint per session; every inbound
//! event is rebroadcast to all *other* participants of the same session,
//! never echoed back to its originator.
//!
//! Delivery is at-most-once, best-effort: a lagged subscriber drops events,
//! a disconnected participant loses any buffered state, and a session is
//! removed when its last participant leaves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::CorsLayer;

use glint_kernel::ChannelEvent;

/// One relayed event, tagged with the participant that sent it.
#[derive(Debug, Clone)]
struct Envelope {
    origin: u64,
    event: ChannelEvent,
}

/// Bounded per-session fan-out buffer. Acks are tiny and a scanner emits at
/// most one per chunk, so a small buffer suffices.
const SESSION_BUFFER: usize = 256;

#[derive(Default)]
pub struct SessionHub {
    sessions: Mutex<HashMap<String, broadcast::Sender<Envelope>>>,
    next_participant: AtomicU64,
}

pub type SharedHub = Arc<SessionHub>;

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    async fn join(
        &self,
        session: &str,
    ) -> (u64, broadcast::Sender<Envelope>, broadcast::Receiver<Envelope>) {
        let id = self.next_participant.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock().await;
        let tx = sessions
            .entry(session.to_string())
            .or_insert_with(|| broadcast::channel(SESSION_BUFFER).0)
            .clone();
        let rx = tx.subscribe();
        (id, tx, rx)
    }

    /// Drop the session entry once the last participant is gone. The caller
    /// must have released its own receiver first.
    async fn leave(&self, session: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(tx) = sessions.get(session) {
            if tx.receiver_count() == 0 {
                sessions.remove(session);
            }
        }
    }

    pub async fn session_counts(&self) -> HashMap<String, usize> {
        let sessions = self.sessions.lock().await;
        sessions
            .iter()
            .map(|(name, tx)| (name.clone(), tx.receiver_count()))
            .collect()
    }
}

pub fn build_router(hub: SharedHub) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/channel/:session", get(channel_ws))
        .route("/v1/sessions", get(list_sessions))
        // Observability
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(hub)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_sessions(State(hub): State<SharedHub>) -> Json<serde_json::Value> {
    let counts = hub.session_counts().await;
    Json(serde_json::json!({ "sessions": counts }))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}

async fn channel_ws(
    ws: WebSocketUpgrade,
    Path(session): Path<String>,
    State(hub): State<SharedHub>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_participant(socket, session, hub))
}

async fn relay_participant(socket: WebSocket, session: String, hub: SharedHub) {
    let (id, tx, mut rx) = hub.join(&session).await;
    tracing::info!("Relay: participant {} joined session {:?}", id, session);

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ChannelEvent>(&text) {
                            Ok(event) => {
                                metrics::counter!("glint_relay_events_total", 1);
                                if event.is_terminal() {
                                    tracing::info!("Relay: session {:?} reached a verdict", session);
                                } else {
                                    tracing::debug!("Relay: {:?} from {} in {:?}", event, id, session);
                                }
                                // Fails only with zero receivers; we hold one ourselves.
                                let _ = tx.send(Envelope { origin: id, event });
                            }
                            Err(e) => {
                                tracing::warn!("Relay: dropping malformed event from {}: {}", id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by axum
                    Some(Err(e)) => {
                        tracing::warn!("Relay: socket error from {}: {}", id, e);
                        break;
                    }
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(env) if env.origin != id => {
                        if let Ok(text) = serde_json::to_string(&env.event) {
                            if sink.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(_) => {} // own event, never echoed
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Relay: participant {} lagged, dropped {} events", id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    drop(rx);
    hub.leave(&session).await;
    tracing::info!("Relay: participant {} left session {:?}", id, session);
}
