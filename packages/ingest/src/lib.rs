#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Knowledge ingestion pipeline.
//!
//! Runs detached from the HTTP request that triggered it: the intake
//! handler persists a `processing` training row, enqueues a job, and
//! returns 202 immediately. A bounded worker pool picks jobs up, chunks
//! the source, embeds each chunk, upserts vectors in batches, and moves
//! the row to `completed` or `failed`. On failure, any vectors already
//! upserted for the row are deleted before the row is marked failed, so
//! a failed row never leaves stragglers in the index.
//!
//! Each job owns exactly one `training_data.id`; parallelism happens
//! across rows, never within one.

pub mod worker;

use std::sync::Arc;

use salescraft_ai::{LlmError, LlmProvider, with_retry};
use salescraft_documents::{ChunkingConfig, DocumentError, DocumentSource};
use salescraft_models::TrainingStatus;
use salescraft_store::StoreError;
use salescraft_vector::{VectorEntry, VectorError, VectorIndex, VectorPayload, point_id};
use switchy_database::Database;
use thiserror::Error;

pub use worker::{IngestQueue, IngestWorker, start_worker};

/// Maximum vectors per upsert batch.
const UPSERT_BATCH_SIZE: usize = 64;

/// Errors from the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Store read/write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Document processing failed.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Embedding generation failed.
    #[error("Embedding error: {0}")]
    Llm(#[from] LlmError),

    /// Vector upsert or cleanup failed.
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    /// The job queue has shut down and accepts no new work.
    #[error("Ingestion queue is closed")]
    QueueClosed,
}

/// One unit of ingestion work, owning a single training row.
#[derive(Debug)]
pub struct IngestJob {
    /// The `training_data` row this job owns.
    pub training_data_id: String,
    /// Agent whose index receives the vectors.
    pub agent_id: String,
    /// The agent's `index_namespace`, stamped on every vector payload as
    /// the isolation filter value.
    pub index_namespace: String,
    /// Material to process.
    pub source: DocumentSource,
}

/// Shared dependencies for running ingestions.
pub struct IngestContext {
    /// Relational store.
    pub db: Arc<dyn Database>,
    /// Vector index.
    pub vector: Arc<VectorIndex>,
    /// Embedding provider.
    pub llm: Arc<dyn LlmProvider>,
    /// Chunking parameters.
    pub chunking: ChunkingConfig,
}

/// Runs one ingestion end to end, updating the training row to its
/// terminal status. Never returns the pipeline error to the caller —
/// the HTTP response that triggered the job has already gone out — but
/// reports it through the row's `error` metadata and the log.
pub async fn run_ingestion(ctx: &IngestContext, job: &IngestJob) {
    log::info!(
        "Ingesting training row {} for agent {} ({})",
        job.training_data_id,
        job.agent_id,
        job.source.source_ref()
    );

    match ingest(ctx, job).await {
        Ok(chunks_created) => {
            let patch = serde_json::json!({ "chunks_created": chunks_created });
            if let Err(e) = salescraft_store::training::update_status(
                ctx.db.as_ref(),
                &job.training_data_id,
                TrainingStatus::Completed,
                &patch,
            )
            .await
            {
                log::error!(
                    "Failed to mark training row {} completed: {e}",
                    job.training_data_id
                );
            } else {
                log::info!(
                    "Training row {} completed with {chunks_created} chunks",
                    job.training_data_id
                );
            }
        }
        Err(e) => {
            log::warn!("Ingestion failed for row {}: {e}", job.training_data_id);
            cleanup_partial_vectors(ctx, &job.training_data_id).await;

            let patch = serde_json::json!({ "error": e.to_string() });
            if let Err(update_err) = salescraft_store::training::update_status(
                ctx.db.as_ref(),
                &job.training_data_id,
                TrainingStatus::Failed,
                &patch,
            )
            .await
            {
                log::error!(
                    "Failed to mark training row {} failed: {update_err}",
                    job.training_data_id
                );
            }
        }
    }
}

/// The fallible pipeline body: chunk, embed, upsert. Returns the number
/// of chunks indexed.
async fn ingest(ctx: &IngestContext, job: &IngestJob) -> Result<u32, IngestError> {
    let chunks = salescraft_documents::process(&job.source, &ctx.chunking).await?;

    let mut entries = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let vector = with_retry(|| ctx.llm.embed(&chunk.text)).await?;
        entries.push(VectorEntry {
            id: point_id(&job.training_data_id, chunk.metadata.chunk_index),
            vector,
            payload: VectorPayload {
                agent_id: job.index_namespace.clone(),
                kind: chunk.metadata.source_type.to_string(),
                source_id: job.training_data_id.clone(),
                chunk_index: chunk.metadata.chunk_index,
                text: chunk.text.clone(),
            },
        });
    }

    for batch in entries.chunks(UPSERT_BATCH_SIZE) {
        ctx.vector.upsert(batch).await?;
    }

    #[allow(clippy::cast_possible_truncation)]
    Ok(chunks.len() as u32)
}

/// Deletes any vectors already upserted for a failed row, keyed by the
/// row id as `source_id`. Best effort: a cleanup failure is logged and
/// the row still moves to `failed`.
async fn cleanup_partial_vectors(ctx: &IngestContext, training_data_id: &str) {
    if let Err(e) = ctx.vector.delete_by_source(training_data_id).await {
        log::error!("Failed to clean up partial vectors for row {training_data_id}: {e}");
    }
}
