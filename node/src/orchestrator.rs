// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Verification orchestrator. Decides whether a failed verification means
//! "the proof is invalid" or "our cached artifacts are stale" by exhausting
//! the refresh space exactly once per artifact kind, then concluding.
//!
//! # States
//! `AwaitingPayload → Verifying → {Verified, Rejected, Errored}`
//!
//! # Guarantees
//! - No artifact is refreshed twice per transfer
//! - Decompression failure is terminal, never retried
//! - Transport failure during refetch surfaces as `Errored`, never loops

use serde::Serialize;
use thiserror::Error;

use glint_kernel::wire;

use crate::artifacts::{ArtifactCache, ArtifactKind};
use crate::errors::NodeError;

/// Opaque failure inside the cryptographic engine. Treated like a `false`
/// verdict by the retry policy: it may just mean a stale verifying key.
#[derive(Debug, Error)]
#[error("verification engine failure: {0}")]
pub struct EngineFailure(pub String);

/// Seam for the opaque cryptographic engine.
pub trait ProofVerifier: Send + 'static {
    fn verify(
        &self,
        proof: &[u8],
        vk: &[u8],
        settings: &[u8],
        srs: &[u8],
    ) -> Result<bool, EngineFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerifyState {
    AwaitingPayload,
    Verifying,
    Verified,
    Rejected,
    Errored,
}

/// A legitimate terminal outcome; `Rejected` is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn as_bool(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

pub struct VerificationOrchestrator<V> {
    verifier: V,
    artifacts: ArtifactCache,
    state: VerifyState,
}

impl<V: ProofVerifier> VerificationOrchestrator<V> {
    pub fn new(verifier: V, artifacts: ArtifactCache) -> Self {
        Self {
            verifier,
            artifacts,
            state: VerifyState::AwaitingPayload,
        }
    }

    pub fn state(&self) -> VerifyState {
        self.state
    }

    pub fn artifacts(&self) -> &ArtifactCache {
        &self.artifacts
    }

    /// Run one complete transfer's verification against the reassembled wire
    /// payload. Consumes this session's refresh allowance; a new transfer
    /// gets a new orchestrator, or at least a fresh session via the cache.
    pub async fn run(&mut self, wire_payload: &str) -> Result<Verdict, NodeError> {
        let started = std::time::Instant::now();
        let result = self.attempt_until_settled(wire_payload).await;
        metrics::histogram!(
            "glint_verify_duration_seconds",
            started.elapsed().as_secs_f64()
        );

        match &result {
            Ok(Verdict::Accepted) => self.state = VerifyState::Verified,
            Ok(Verdict::Rejected) => self.state = VerifyState::Rejected,
            Err(e) => {
                tracing::error!("Verification errored: {}", e);
                self.state = VerifyState::Errored;
            }
        }
        result
    }

    async fn attempt_until_settled(&mut self, wire_payload: &str) -> Result<Verdict, NodeError> {
        self.state = VerifyState::Verifying;

        // The wire payload is compressed; failure here is fatal for the
        // transfer since re-reassembling the same bytes cannot help.
        let proof = wire::unpack_payload(wire_payload)?;
        tracing::info!(
            "Verifying proof ({} bytes, digest {})",
            proof.len(),
            wire::payload_digest(&proof)
        );

        self.artifacts.begin_session();
        let srs = self.artifacts.get_or_fetch(ArtifactKind::Srs).await?;

        loop {
            let vk = self.artifacts.get_or_fetch(ArtifactKind::VerifyingKey).await?;
            let settings = self.artifacts.get_or_fetch(ArtifactKind::Settings).await?;

            match self.verifier.verify(&proof, &vk, &settings, &srs) {
                Ok(true) => {
                    tracing::info!("Proof verified");
                    return Ok(Verdict::Accepted);
                }
                outcome => {
                    if let Err(e) = &outcome {
                        tracing::warn!("Verification attempt errored: {}", e);
                    }
                    let stale: Vec<ArtifactKind> = ArtifactKind::REFRESHABLE
                        .iter()
                        .copied()
                        .filter(|kind| !self.artifacts.is_fresh(*kind))
                        .collect();
                    if stale.is_empty() {
                        // Refresh space exhausted: the proof itself is bad.
                        tracing::warn!("Proof rejected after exhausting artifact refresh");
                        return Ok(Verdict::Rejected);
                    }
                    tracing::info!(
                        "Verification failed with cached artifacts; refreshing {:?} and retrying",
                        stale
                    );
                    for kind in stale {
                        self.artifacts.refresh(kind).await?;
                    }
                }
            }
        }
    }
}
