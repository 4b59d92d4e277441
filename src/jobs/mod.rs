//! Background job system.
//!
//! Side effects such as welcome emails run off the request path as
//! tracked jobs on an in-memory queue with bounded retry, processed by
//! a single worker task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Retry attempts per job before it is dropped as failed.
const MAX_ATTEMPTS: u32 = 3;
/// Base backoff between attempts; doubles per retry.
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// A unit of background work.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn run(&self) -> anyhow::Result<()>;
}

/// Handle for enqueueing jobs. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Arc<dyn Job>>,
}

impl JobQueue {
    /// Start the queue and its worker task.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker_loop(rx));
        Self { tx }
    }

    /// Enqueue a job. Returns false if the worker has shut down.
    pub fn enqueue(&self, job: Arc<dyn Job>) -> bool {
        let name = job.name();
        match self.tx.send(job) {
            Ok(()) => {
                info!("Enqueued background job: {}", name);
                true
            }
            Err(_) => {
                error!("Job queue is closed; dropping job: {}", name);
                false
            }
        }
    }
}

// Process-wide queue, started on first use from an async context.
static GLOBAL: std::sync::OnceLock<JobQueue> = std::sync::OnceLock::new();

pub fn queue() -> &'static JobQueue {
    GLOBAL.get_or_init(JobQueue::start)
}

async fn worker_loop(mut rx: mpsc::UnboundedReceiver<Arc<dyn Job>>) {
    info!("Background job worker started");
    while let Some(job) = rx.recv().await {
        run_with_retry(job).await;
    }
    info!("Background job worker stopped");
}

async fn run_with_retry(job: Arc<dyn Job>) {
    let mut backoff = RETRY_BACKOFF;
    for attempt in 1..=MAX_ATTEMPTS {
        match job.run().await {
            Ok(()) => {
                info!("Job {} completed (attempt {})", job.name(), attempt);
                return;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "Job {} failed on attempt {}: {}; retrying in {:?}",
                    job.name(),
                    attempt,
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                error!(
                    "Job {} failed after {} attempts: {}",
                    job.name(),
                    MAX_ATTEMPTS,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyJob {
        attempts: Arc<AtomicU32>,
        fail_first: u32,
        done: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl Job for FlakyJob {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self) -> anyhow::Result<()> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                anyhow::bail!("transient failure {}", n);
            }
            self.done.notify_one();
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let queue = JobQueue::start();
        let attempts = Arc::new(AtomicU32::new(0));
        let done = Arc::new(tokio::sync::Notify::new());

        assert!(queue.enqueue(Arc::new(FlakyJob {
            attempts: attempts.clone(),
            fail_first: 2,
            done: done.clone(),
        })));

        done.notified().await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let queue = JobQueue::start();
        let attempts = Arc::new(AtomicU32::new(0));
        let done = Arc::new(tokio::sync::Notify::new());

        assert!(queue.enqueue(Arc::new(FlakyJob {
            attempts: attempts.clone(),
            fail_first: u32::MAX,
            done: done.clone(),
        })));

        // Enqueue a sentinel behind it; the worker only reaches it after
        // the first job has exhausted its retries.
        let sentinel_attempts = Arc::new(AtomicU32::new(0));
        assert!(queue.enqueue(Arc::new(FlakyJob {
            attempts: sentinel_attempts.clone(),
            fail_first: 0,
            done: done.clone(),
        })));

        done.notified().await;
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(sentinel_attempts.load(Ordering::SeqCst), 1);
    }
}
