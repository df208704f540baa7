use std::collections::HashMap;

use reqwest::Client;

use crate::errors::NodeError;

/// Cryptographic inputs required to verify a proof. Named by the files the
/// artifact server publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    VerifyingKey,
    Settings,
    Srs,
}

impl ArtifactKind {
    pub fn filename(&self) -> &'static str {
        match self {
            ArtifactKind::VerifyingKey => "test.vk",
            ArtifactKind::Settings => "settings.json",
            ArtifactKind::Srs => "kzg.srs",
        }
    }

    /// Kinds eligible for the stale-cache refresh matrix. The SRS is
    /// circuit-independent: fetched at most once, never refreshed.
    pub const REFRESHABLE: [ArtifactKind; 2] =
        [ArtifactKind::VerifyingKey, ArtifactKind::Settings];
}

#[derive(Debug, Clone)]
pub struct ArtifactClient {
    base_url: String,
    client: Client,
}

impl ArtifactClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch(&self, kind: ArtifactKind) -> Result<Vec<u8>, NodeError> {
        let url = format!("{}/{}", self.base_url, kind.filename());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NodeError::ArtifactFetch(format!("{url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(NodeError::ArtifactFetch(format!(
                "{url}: {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| NodeError::ArtifactFetch(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug)]
struct Entry {
    bytes: Vec<u8>,
    fresh: bool,
}

/// In-memory artifact cache with one bit of state per entry: whether it was
/// fetched during the current verification session ("fresh") or is a reuse
/// from a prior one. That bit alone drives the retry policy.
#[derive(Debug)]
pub struct ArtifactCache {
    client: ArtifactClient,
    entries: HashMap<ArtifactKind, Entry>,
}

impl ArtifactCache {
    pub fn new(client: ArtifactClient) -> Self {
        Self {
            client,
            entries: HashMap::new(),
        }
    }

    /// Forget freshness carried over from a previous transfer. Cached bytes
    /// stay.
    pub fn begin_session(&mut self) {
        for entry in self.entries.values_mut() {
            entry.fresh = false;
        }
    }

    pub fn is_fresh(&self, kind: ArtifactKind) -> bool {
        self.entries.get(&kind).map(|e| e.fresh).unwrap_or(false)
    }

    pub fn is_present(&self, kind: ArtifactKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Cached bytes if present, otherwise fetch. A fetch caused by absence
    /// counts as fresh for this session.
    pub async fn get_or_fetch(&mut self, kind: ArtifactKind) -> Result<Vec<u8>, NodeError> {
        if let Some(entry) = self.entries.get(&kind) {
            return Ok(entry.bytes.clone());
        }
        self.refresh(kind).await
    }

    /// Force-refetch and mark fresh.
    pub async fn refresh(&mut self, kind: ArtifactKind) -> Result<Vec<u8>, NodeError> {
        let bytes = self.client.fetch(kind).await?;
        tracing::info!(
            "Artifacts: fetched {} ({} bytes)",
            kind.filename(),
            bytes.len()
        );
        metrics::counter!("glint_artifact_fetches_total", 1);
        self.entries.insert(
            kind,
            Entry {
                bytes: bytes.clone(),
                fresh: true,
            },
        );
        Ok(bytes)
    }

    /// Drop the refreshable entries so the next session refetches them.
    pub fn clear_refreshable(&mut self) {
        for kind in ArtifactKind::REFRESHABLE {
            self.entries.remove(&kind);
        }
    }
}
