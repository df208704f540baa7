use serde::{Deserialize, Serialize};

/// Events carried on the side channel as JSON text frames. Every inbound
/// event is relayed to all *other* participants of the same session, never
/// echoed back to its originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ChannelEvent {
    /// The scanner stored this sequence id for the first time. Updates the
    /// prover's skip set.
    ChunkAcknowledged(u32),

    /// Terminal verdict for the transfer. The prover stops its carousel on
    /// receipt.
    VerificationResult(bool),
}

impl ChannelEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelEvent::VerificationResult(_))
    }
}

pub const DEFAULT_SESSION: &str = "gifscan";

/// Relay path for a session, so unrelated transfers do not cross-talk.
pub fn session_path(session: &str) -> String {
    format!("/channel/{session}")
}
