//! Background propagation of optimistic catalog writes.
//!
//! Catalog mutations are applied locally first and then handed to the
//! [`RemoteWriter`], which applies them to the remote store on a single task in
//! FIFO order. Each write is retried with exponential backoff; when it runs out
//! of attempts the failure is logged and broadcast to subscribers. The caller
//! that enqueued the write never waits and never sees the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use dorodango_core::{Product, ProductId};

use crate::remote::CatalogRemote;

const QUEUE_CAPACITY: usize = 256;
const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// A write waiting to reach the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWrite {
    Create(Product),
    Delete(ProductId),
}

impl RemoteWrite {
    /// Id of the product the write touches.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        match self {
            Self::Create(product) => &product.id,
            Self::Delete(id) => id,
        }
    }

    /// `create` or `delete`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Delete(_) => "delete",
        }
    }
}

/// A write that never reached the remote store.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub write: RemoteWrite,
    /// Attempts made; zero when the write was dropped before being tried.
    pub attempts: u32,
    pub error: String,
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `backoff * 2^(attempt - 1)`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

enum Job {
    Write(RemoteWrite),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer task.
///
/// Cloning the handle shares the same queue.
#[derive(Clone)]
pub struct RemoteWriter {
    jobs: mpsc::Sender<Job>,
    failures: broadcast::Sender<WriteFailure>,
}

impl RemoteWriter {
    /// Start the writer task on the current tokio runtime.
    #[must_use]
    pub fn spawn(remote: Arc<dyn CatalogRemote>, policy: RetryPolicy) -> Self {
        let (jobs, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);

        tokio::spawn(run(remote, policy, rx, failures.clone()));

        Self { jobs, failures }
    }

    /// Queue a write without waiting for it.
    ///
    /// A full or stopped queue drops the write and reports it as a failure.
    pub fn enqueue(&self, write: RemoteWrite) {
        debug!(kind = write.kind(), product_id = %write.product_id(), "Queueing remote write");

        if let Err(e) = self.jobs.try_send(Job::Write(write)) {
            let (reason, job) = match e {
                mpsc::error::TrySendError::Full(job) => ("write queue is full", job),
                mpsc::error::TrySendError::Closed(job) => ("writer has stopped", job),
            };
            if let Job::Write(write) = job {
                error!(
                    kind = write.kind(),
                    product_id = %write.product_id(),
                    reason,
                    "Dropping remote write"
                );
                let _ = self.failures.send(WriteFailure {
                    write,
                    attempts: 0,
                    error: reason.to_owned(),
                });
            }
        }
    }

    /// Subscribe to writes that exhausted their retries.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WriteFailure> {
        self.failures.subscribe()
    }

    /// Wait until every write queued before this call has been settled.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.jobs.send(Job::Flush(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run(
    remote: Arc<dyn CatalogRemote>,
    policy: RetryPolicy,
    mut jobs: mpsc::Receiver<Job>,
    failures: broadcast::Sender<WriteFailure>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Write(write) => {
                if let Err(failure) = apply(remote.as_ref(), policy, write).await {
                    error!(
                        kind = failure.write.kind(),
                        product_id = %failure.write.product_id(),
                        attempts = failure.attempts,
                        error = %failure.error,
                        "Remote write failed"
                    );
                    let _ = failures.send(failure);
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Remote writer stopped");
}

async fn apply(
    remote: &dyn CatalogRemote,
    policy: RetryPolicy,
    write: RemoteWrite,
) -> Result<(), WriteFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = match &write {
            RemoteWrite::Create(product) => remote.create(product).await,
            RemoteWrite::Delete(id) => remote.delete(id).await,
        };

        match result {
            Ok(()) => {
                debug!(kind = write.kind(), product_id = %write.product_id(), attempt, "Remote write applied");
                return Ok(());
            }
            Err(e) if attempt >= max_attempts => {
                return Err(WriteFailure {
                    write,
                    attempts: attempt,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    kind = write.kind(),
                    product_id = %write.product_id(),
                    attempt,
                    error = %e,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Remote write failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryCatalog;
    use dorodango_core::defaults::default_products;

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let remote = Arc::new(MemoryCatalog::new());
        remote.fail_next_writes(2);
        let writer = RemoteWriter::spawn(remote.clone(), quick_policy(3));
        let mut failures = writer.subscribe();

        let product = default_products().remove(0);
        writer.enqueue(RemoteWrite::Create(product.clone()));
        writer.flush().await;

        assert_eq!(remote.snapshot(), vec![product]);
        assert_eq!(remote.write_calls(), 3);
        assert!(failures.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_broadcast() {
        let remote = Arc::new(MemoryCatalog::new());
        remote.set_offline(true);
        let writer = RemoteWriter::spawn(remote.clone(), quick_policy(2));
        let mut failures = writer.subscribe();

        writer.enqueue(RemoteWrite::Delete(ProductId::new("3")));
        writer.flush().await;

        let failure = failures.try_recv().unwrap();
        assert_eq!(failure.write, RemoteWrite::Delete(ProductId::new("3")));
        assert_eq!(failure.attempts, 2);
        assert_eq!(remote.write_calls(), 2);
    }

    #[tokio::test]
    async fn test_writes_apply_in_order() {
        let remote = Arc::new(MemoryCatalog::new());
        let writer = RemoteWriter::spawn(remote.clone(), quick_policy(1));

        let product = default_products().remove(1);
        writer.enqueue(RemoteWrite::Create(product.clone()));
        writer.enqueue(RemoteWrite::Delete(product.id.clone()));
        writer.flush().await;

        assert!(remote.snapshot().is_empty());
    }
}
