//! Background job queue collaborator.
//!
//! Deferred delivery hands a serialized [`JobEntry`] to a [`JobQueue`]
//! backend and returns immediately; some worker process later feeds the
//! entry back through [`perform_entry`]. The queue backend is pluggable —
//! [`MemoryQueue`] covers development and tests, persistent backends
//! implement [`JobQueue`] against their own storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Error;

/// A serializable job with typed execution logic.
///
/// The job's fields become the queued payload; `perform` runs on the worker
/// side with whatever context the application wires in.
#[async_trait]
pub trait Job: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Unique identifier for this job type.
    const JOB_TYPE: &'static str;

    /// Application state provided at execution time.
    type Context: Send + Sync + 'static;

    async fn perform(self, ctx: &Self::Context) -> Result<(), Error>;
}

/// Options controlling where and when an enqueued job runs.
#[derive(Debug, Clone)]
pub struct EnqueueOpts {
    /// Queue name the entry lands on.
    pub queue: String,
    /// Delay before the entry becomes eligible for processing.
    pub delay: Option<std::time::Duration>,
}

impl Default for EnqueueOpts {
    fn default() -> Self {
        Self {
            queue: "default".to_string(),
            delay: None,
        }
    }
}

impl EnqueueOpts {
    pub fn queue(name: impl Into<String>) -> Self {
        Self {
            queue: name.into(),
            delay: None,
        }
    }
}

/// Serialized representation of a queued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: Uuid,
    pub job_type: String,
    pub queue: String,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Serialize a [`Job`] into a [`JobEntry`].
pub fn into_entry<J: Job>(job: &J, opts: &EnqueueOpts) -> Result<JobEntry, Error> {
    let now = OffsetDateTime::now_utc();
    Ok(JobEntry {
        id: Uuid::new_v4(),
        job_type: J::JOB_TYPE.to_string(),
        queue: opts.queue.clone(),
        payload: serde_json::to_value(job)?,
        run_at: opts.delay.map(|d| now + d).unwrap_or(now),
        created_at: now,
    })
}

/// Deserialize an entry's payload and execute it.
///
/// This is the worker-side entry point that closes the loop from "enqueued"
/// back to "delivered".
pub async fn perform_entry<J: Job>(entry: &JobEntry, ctx: &J::Context) -> Result<(), Error> {
    let job: J = serde_json::from_value(entry.payload.clone())?;
    job.perform(ctx).await
}

/// Backend-agnostic queue storage.
///
/// `push` is a blocking enqueue call that returns once the entry is
/// persisted; execution happens later in whatever context the backend
/// schedules.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    async fn push(&self, entry: &JobEntry) -> Result<(), Error>;
}

/// Convenience: serialize a job and push it onto the queue in one call.
pub async fn enqueue<J: Job>(
    queue: &dyn JobQueue,
    job: &J,
    opts: &EnqueueOpts,
) -> Result<Uuid, Error> {
    let entry = into_entry(job, opts)?;
    let id = entry.id;
    queue.push(&entry).await?;
    Ok(id)
}

/// In-memory [`JobQueue`] for development and testing.
///
/// Entries are stored in a `Vec` behind a mutex. Not durable.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    entries: Arc<Mutex<Vec<JobEntry>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the oldest queued entry.
    pub async fn take(&self) -> Option<JobEntry> {
        let mut entries = self.entries.lock().await;
        if entries.is_empty() {
            None
        } else {
            Some(entries.remove(0))
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn push(&self, entry: &JobEntry) -> Result<(), Error> {
        let mut entries = self.entries.lock().await;
        entries.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct ProbeJob {
        tag: String,
    }

    #[async_trait]
    impl Job for ProbeJob {
        const JOB_TYPE: &'static str = "test::probe";
        type Context = ();

        async fn perform(self, _ctx: &()) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn enqueue_serializes_job_onto_named_queue() {
        let queue = MemoryQueue::new();
        let job = ProbeJob { tag: "t1".to_string() };

        let id = enqueue(&queue, &job, &EnqueueOpts::queue("mailers"))
            .await
            .unwrap();

        let entry = queue.take().await.unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.queue, "mailers");
        assert_eq!(entry.job_type, "test::probe");
        assert_eq!(entry.payload["tag"], "t1");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn delay_pushes_run_at_forward() {
        let opts = EnqueueOpts {
            queue: "default".to_string(),
            delay: Some(std::time::Duration::from_secs(60)),
        };
        let entry = into_entry(&ProbeJob { tag: "t".to_string() }, &opts).unwrap();

        assert!(entry.run_at > entry.created_at);
    }

    #[tokio::test]
    async fn take_on_empty_queue_returns_none() {
        let queue = MemoryQueue::new();
        assert!(queue.take().await.is_none());
    }
}
