//! Side-channel WebSocket client. An explicitly constructed, explicitly
//! owned connection object: the prover and scanner loops each hold their
//! own, there is no ambient socket state.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use glint_kernel::channel::session_path;
use glint_kernel::ChannelEvent;

use crate::errors::NodeError;

/// Cloneable sending half, safe to hand to select-arm handlers.
#[derive(Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<ChannelEvent>,
}

impl ChannelSender {
    pub async fn send(&self, event: ChannelEvent) -> Result<(), NodeError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| NodeError::Channel("side channel closed".into()))
    }
}

pub struct ChannelClient {
    tx: mpsc::Sender<ChannelEvent>,
    inbound: mpsc::Receiver<ChannelEvent>,
}

impl ChannelClient {
    /// Connect to `base_url` (e.g. `ws://127.0.0.1:3002`) and join `session`.
    pub async fn connect(base_url: &str, session: &str) -> Result<Self, NodeError> {
        let url = format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            session_path(session)
        );
        let (socket, _) = connect_async(&url)
            .await
            .map_err(|e| NodeError::Channel(format!("connect {url}: {e}")))?;
        tracing::info!("Channel: connected to {}", url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<ChannelEvent>(64);
        let (in_tx, in_rx) = mpsc::channel::<ChannelEvent>(64);

        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ChannelEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Channel: dropping malformed event: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Channel: socket error: {}", e);
                        break;
                    }
                }
            }
            // in_tx drops here, which ends the owner's recv() stream.
        });

        Ok(Self {
            tx: out_tx,
            inbound: in_rx,
        })
    }

    pub fn sender(&self) -> ChannelSender {
        ChannelSender {
            tx: self.tx.clone(),
        }
    }

    /// Next event relayed from the session peers; `None` once the relay
    /// connection is gone.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.inbound.recv().await
    }
}
