//! Bounded worker pool over an in-memory job queue.
//!
//! Jobs flow through a `tokio::sync::mpsc` channel into a dispatcher
//! task that runs at most `concurrency` ingestions at once. Shutdown is
//! graceful by construction: dropping the queue closes the channel, the
//! dispatcher drains whatever was already enqueued, and
//! [`IngestWorker::join`] waits for the last job to finish.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};

use crate::{IngestContext, IngestError, IngestJob, run_ingestion};

/// Sending half of the job queue. Clone freely; the channel closes when
/// every clone is dropped.
#[derive(Clone)]
pub struct IngestQueue {
    tx: mpsc::Sender<IngestJob>,
}

impl IngestQueue {
    /// Enqueues a job for background processing.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::QueueClosed`] if the worker has shut down.
    pub async fn enqueue(&self, job: IngestJob) -> Result<(), IngestError> {
        self.tx
            .send(job)
            .await
            .map_err(|_| IngestError::QueueClosed)
    }
}

/// Handle to the running worker pool.
pub struct IngestWorker {
    handle: JoinHandle<()>,
}

impl IngestWorker {
    /// Waits for the dispatcher to drain and finish. Call after dropping
    /// every [`IngestQueue`] clone.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            log::error!("Ingest worker task panicked: {e}");
        }
    }
}

/// Starts the worker pool.
///
/// `capacity` bounds how many jobs may sit queued (enqueue waits beyond
/// that, applying backpressure to intake handlers); `concurrency` bounds
/// how many ingestions run simultaneously.
#[must_use]
pub fn start_worker(
    ctx: Arc<IngestContext>,
    capacity: usize,
    concurrency: usize,
) -> (IngestQueue, IngestWorker) {
    let (tx, mut rx) = mpsc::channel::<IngestJob>(capacity.max(1));
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handle = tokio::spawn(async move {
        let mut running = JoinSet::new();

        while let Some(job) = rx.recv().await {
            // Reap finished jobs without blocking intake.
            while running.try_join_next().is_some() {}

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            let ctx = Arc::clone(&ctx);
            running.spawn(async move {
                run_ingestion(&ctx, &job).await;
                drop(permit);
            });
        }

        // Channel closed: drain everything still in flight.
        while running.join_next().await.is_some() {}

        log::info!("Ingest worker drained and stopped");
    });

    (IngestQueue { tx }, IngestWorker { handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_fails_after_shutdown() {
        let (tx, rx) = mpsc::channel::<IngestJob>(1);
        drop(rx);
        let queue = IngestQueue { tx };

        let job = IngestJob {
            training_data_id: "t1".to_string(),
            agent_id: "a1".to_string(),
            index_namespace: "agent_a1".to_string(),
            source: salescraft_documents::DocumentSource::Text {
                label: "notes".to_string(),
                content: "hello".to_string(),
            },
        };

        assert!(matches!(
            queue.enqueue(job).await,
            Err(IngestError::QueueClosed)
        ));
    }
}
