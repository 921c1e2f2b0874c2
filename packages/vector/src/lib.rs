#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Vector index adapter for per-agent semantic retrieval.
//!
//! Talks to a Qdrant-compatible REST API: one shared collection, cosine
//! distance, with every point carrying an `agent_id` payload field that
//! scopes search, deletion, and counting to a single tenant. A keyword
//! payload index on `agent_id` is created together with the collection so
//! filtered search never requires a pre-declared schema.
//!
//! Failure policy: any transport error or non-success status maps to
//! [`VectorError::Unavailable`]. Callers treat that as "retrieval
//! unavailable" and degrade; nothing here is fatal to a chat turn.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;
use tokio::sync::{OnceCell, Semaphore};

/// Errors from vector index operations.
///
/// Deliberately a single recoverable kind: every failure downstream of
/// this adapter means "proceed without the index".
#[derive(Debug, Error)]
pub enum VectorError {
    /// The index could not serve the request.
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for VectorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Unavailable(format!("response decode failed: {e}"))
    }
}

/// Payload attached to every indexed point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPayload {
    /// Owning agent; the isolation filter key.
    pub agent_id: String,
    /// Source material kind (`pdf`, `url`, `faq`, `text`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Training row that produced this point.
    pub source_id: String,
    /// Position of the chunk within its source.
    pub chunk_index: u32,
    /// The chunk text itself.
    pub text: String,
}

/// One point to upsert.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// Deterministic point id (see [`point_id`]).
    pub id: String,
    /// Embedding of fixed dimension.
    pub vector: Vec<f32>,
    /// Metadata payload.
    pub payload: VectorPayload,
}

/// One search result, descending by score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Point id.
    pub id: String,
    /// Cosine similarity score.
    pub score: f32,
    /// Stored payload.
    pub payload: VectorPayload,
}

/// Static configuration for the adapter.
#[derive(Debug, Clone)]
pub struct VectorConfig {
    /// Base URL of the index server (e.g. `http://localhost:6333`).
    pub base_url: String,
    /// Optional API key sent as the `api-key` header.
    pub api_key: Option<String>,
    /// Collection name.
    pub collection: String,
    /// Embedding dimension.
    pub dim: u32,
}

/// Deterministic point id for a `(source_id, chunk_index)` pair: the
/// first 16 bytes of a SHA-256 content hash rendered as a UUID, so
/// re-ingesting the same source overwrites rather than duplicates.
#[must_use]
pub fn point_id(source_id: &str, chunk_index: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(chunk_index.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Uuid::from_bytes(bytes).to_string()
}

/// Timeout for search calls.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for mutation and admin calls.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Ceiling on in-flight search calls across the process.
const MAX_CONCURRENT_SEARCHES: usize = 64;

/// Client for a Qdrant-compatible vector index.
pub struct VectorIndex {
    config: VectorConfig,
    client: reqwest::Client,
    /// Collection existence is established once per process; concurrent
    /// first touches race safely on this cell.
    ready: OnceCell<()>,
    search_slots: Semaphore,
}

impl VectorIndex {
    /// Creates a new adapter; no network traffic until first use.
    #[must_use]
    pub fn new(config: VectorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            ready: OnceCell::new(),
            search_slots: Semaphore::new(MAX_CONCURRENT_SEARCHES),
        }
    }

    /// Ensures the collection and its `agent_id` payload index exist.
    /// Idempotent and cached for the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the index server cannot be reached.
    pub async fn ensure_collection(&self) -> Result<(), VectorError> {
        self.ready
            .get_or_try_init(|| self.create_collection())
            .await?;
        Ok(())
    }

    async fn create_collection(&self) -> Result<(), VectorError> {
        let url = format!("{}/collections/{}", self.config.base_url, self.config.collection);

        let exists = self
            .request(reqwest::Method::GET, &url, None, WRITE_TIMEOUT)
            .await;

        if exists.is_err() {
            let body = serde_json::json!({
                "vectors": { "size": self.config.dim, "distance": "Cosine" }
            });
            self.request(reqwest::Method::PUT, &url, Some(body), WRITE_TIMEOUT)
                .await?;
            log::info!(
                "Created vector collection '{}' (dim {})",
                self.config.collection,
                self.config.dim
            );
        }

        // Keyword index on the filter field; tolerated if it already
        // exists so restarts stay idempotent.
        let index_url = format!("{url}/index");
        let body = serde_json::json!({
            "field_name": "agent_id",
            "field_schema": "keyword"
        });
        if let Err(e) = self
            .request(reqwest::Method::PUT, &index_url, Some(body), WRITE_TIMEOUT)
            .await
        {
            log::debug!("agent_id payload index request returned: {e}");
        }

        Ok(())
    }

    /// Upserts a batch of points atomically.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the write fails.
    pub async fn upsert(&self, entries: &[VectorEntry]) -> Result<(), VectorError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.ensure_collection().await?;

        let points: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                Ok(serde_json::json!({
                    "id": e.id,
                    "vector": e.vector,
                    "payload": serde_json::to_value(&e.payload)?,
                }))
            })
            .collect::<Result<_, serde_json::Error>>()?;

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.config.base_url, self.config.collection
        );
        self.request(
            reqwest::Method::PUT,
            &url,
            Some(serde_json::json!({ "points": points })),
            WRITE_TIMEOUT,
        )
        .await?;

        Ok(())
    }

    /// Searches the index, restricted to one agent's points by payload
    /// equality. Results come back in descending score order.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the search fails; callers degrade to
    /// "no grounding context".
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: u32,
        agent_id: &str,
    ) -> Result<Vec<SearchHit>, VectorError> {
        self.ensure_collection().await?;

        let _slot = self
            .search_slots
            .acquire()
            .await
            .map_err(|e| VectorError::Unavailable(e.to_string()))?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.config.base_url, self.config.collection
        );
        let body = serde_json::json!({
            "vector": query_vector,
            "limit": top_k,
            "with_payload": true,
            "filter": agent_filter(agent_id),
        });

        let response = self
            .request(reqwest::Method::POST, &url, Some(body), SEARCH_TIMEOUT)
            .await?;

        let parsed: SearchResponse = serde_json::from_str(&response)?;

        let hits = parsed
            .result
            .into_iter()
            .filter_map(|p| {
                let payload: VectorPayload = serde_json::from_value(p.payload).ok()?;
                // Point ids come back as JSON strings or integers.
                let id = p
                    .id
                    .as_str()
                    .map_or_else(|| p.id.to_string(), ToString::to_string);
                Some(SearchHit {
                    id,
                    score: p.score,
                    payload,
                })
            })
            .collect();

        Ok(hits)
    }

    /// Deletes every point belonging to an agent. Used by the agent
    /// deletion cascade.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the delete fails.
    pub async fn delete_by_agent(&self, agent_id: &str) -> Result<(), VectorError> {
        self.delete_by_filter(agent_filter(agent_id)).await
    }

    /// Deletes every point produced by one training row. Used for
    /// training-row deletion and partial-ingest cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the delete fails.
    pub async fn delete_by_source(&self, source_id: &str) -> Result<(), VectorError> {
        self.delete_by_filter(serde_json::json!({
            "must": [{ "key": "source_id", "match": { "value": source_id } }]
        }))
        .await
    }

    /// Returns the exact number of points an agent has indexed. The
    /// orchestrator uses this as its cheap zero-vector check.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError`] if the count fails.
    pub async fn count_for_agent(&self, agent_id: &str) -> Result<u64, VectorError> {
        self.ensure_collection().await?;

        let url = format!(
            "{}/collections/{}/points/count",
            self.config.base_url, self.config.collection
        );
        let body = serde_json::json!({
            "filter": agent_filter(agent_id),
            "exact": true,
        });

        let response = self
            .request(reqwest::Method::POST, &url, Some(body), SEARCH_TIMEOUT)
            .await?;

        let parsed: CountResponse = serde_json::from_str(&response)?;
        Ok(parsed.result.count)
    }

    async fn delete_by_filter(&self, filter: serde_json::Value) -> Result<(), VectorError> {
        self.ensure_collection().await?;

        let url = format!(
            "{}/collections/{}/points/delete?wait=true",
            self.config.base_url, self.config.collection
        );
        self.request(
            reqwest::Method::POST,
            &url,
            Some(serde_json::json!({ "filter": filter })),
            WRITE_TIMEOUT,
        )
        .await?;

        Ok(())
    }

    /// Sends one request and maps any non-success outcome to
    /// [`VectorError::Unavailable`].
    async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<String, VectorError> {
        let mut builder = self.client.request(method, url).timeout(timeout);

        if let Some(key) = &self.config.api_key {
            builder = builder.header("api-key", key);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(VectorError::Unavailable(format!("HTTP {status}: {text}")));
        }

        Ok(text)
    }
}

fn agent_filter(agent_id: &str) -> serde_json::Value {
    serde_json::json!({
        "must": [{ "key": "agent_id", "match": { "value": agent_id } }]
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_deterministic() {
        assert_eq!(point_id("row-1", 0), point_id("row-1", 0));
        assert_ne!(point_id("row-1", 0), point_id("row-1", 1));
        assert_ne!(point_id("row-1", 0), point_id("row-2", 0));
    }

    #[test]
    fn point_ids_are_uuids() {
        let id = point_id("row-1", 3);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn agent_filter_targets_payload_field() {
        let filter = agent_filter("a1");
        assert_eq!(filter["must"][0]["key"], "agent_id");
        assert_eq!(filter["must"][0]["match"]["value"], "a1");
    }

    #[test]
    fn transport_errors_map_to_unavailable() {
        let err = VectorError::from(serde_json::from_str::<SearchResponse>("{").unwrap_err());
        assert!(matches!(err, VectorError::Unavailable(_)));
    }
}
