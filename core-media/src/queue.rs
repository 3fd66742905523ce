//! # Serial Effect Queue
//!
//! A FIFO of pending jobs drained one at a time by a single background task.
//! Each job is only started after the previous one has completed, so async
//! work against a shared resource (the media element, a storage backend)
//! never interleaves.
//!
//! Closing the queue stops new jobs from being admitted. Jobs that were
//! already admitted still run to completion.

use bridge_traits::platform::PlatformSend;
use futures::channel::{mpsc, oneshot};
use futures::StreamExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::Result;

#[cfg(not(target_arch = "wasm32"))]
type JobFuture = futures::future::BoxFuture<'static, ()>;

#[cfg(target_arch = "wasm32")]
type JobFuture = futures::future::LocalBoxFuture<'static, ()>;

#[cfg(not(target_arch = "wasm32"))]
type Job = Box<dyn FnOnce() -> JobFuture + Send>;

#[cfg(target_arch = "wasm32")]
type Job = Box<dyn FnOnce() -> JobFuture>;

struct QueueInner {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    pending: AtomicUsize,
}

/// Handle to a serial queue. Clones share the same queue.
#[derive(Clone)]
pub struct SerialQueue {
    inner: Arc<QueueInner>,
}

impl SerialQueue {
    /// Create the queue and spawn its drain task.
    ///
    /// Fails when no async runtime is available to drive the task.
    pub fn start(name: impl Into<String>) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded::<Job>();
        let inner = Arc::new(QueueInner {
            name: name.into(),
            sender: Mutex::new(Some(sender)),
            pending: AtomicUsize::new(0),
        });

        core_runtime::task::spawn(drain(receiver, Arc::clone(&inner)))?;
        debug!(queue = %inner.name, "Started serial queue");

        Ok(Self { inner })
    }

    /// Append a job. The closure is only called once every earlier job has
    /// finished.
    ///
    /// Returns `false` when the queue is closed and the job was dropped.
    pub fn enqueue<F, Fut>(&self, job: F) -> bool
    where
        F: FnOnce() -> Fut + PlatformSend + 'static,
        Fut: Future<Output = ()> + PlatformSend + 'static,
    {
        let sender = self.inner.sender.lock();
        let Some(sender) = sender.as_ref() else {
            trace!(queue = %self.inner.name, "Dropping job for closed queue");
            return false;
        };

        let job: Job = Box::new(move || -> JobFuture { Box::pin(job()) });
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if sender.unbounded_send(job).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Wait until every job admitted before this call has finished.
    ///
    /// Returns immediately if the queue is closed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel::<()>();
        let admitted = self.enqueue(move || async move {
            let _ = done.send(());
        });
        if admitted {
            let _ = wait.await;
        }
    }

    /// Stop admitting jobs. Already admitted jobs keep running.
    pub fn close(&self) -> bool {
        let closed = self.inner.sender.lock().take().is_some();
        if closed {
            debug!(queue = %self.inner.name, pending = self.pending(), "Closed serial queue");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Jobs admitted but not yet finished.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("name", &self.inner.name)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<Job>, inner: Arc<QueueInner>) {
    while let Some(job) = receiver.next().await {
        job().await;
        inner.pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(queue = %inner.name, "Serial queue finished");
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_start_requires_runtime() {
        assert!(SerialQueue::start("no-runtime").is_err());
    }

    #[tokio::test]
    async fn test_jobs_finish_in_admission_order() {
        let queue = SerialQueue::start("order").unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (index, delay) in [(0u32, 30u64), (1, 1), (2, 15)] {
            let log = Arc::clone(&log);
            assert!(queue.enqueue(move || async move {
                log.lock().push(format!("start {index}"));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().push(format!("end {index}"));
            }));
        }

        queue.flush().await;
        assert_eq!(
            *log.lock(),
            vec!["start 0", "end 0", "start 1", "end 1", "start 2", "end 2"]
        );
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_close_lets_admitted_jobs_finish() {
        let queue = SerialQueue::start("close").unwrap();
        let (tx, rx) = oneshot::channel();

        queue.enqueue(move || async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send("finished");
        });
        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());
        assert!(!queue.enqueue(|| async {}));

        assert_eq!(rx.await.unwrap(), "finished");
    }

    #[tokio::test]
    async fn test_flush_on_closed_queue_returns() {
        let queue = SerialQueue::start("closed-flush").unwrap();
        queue.close();
        queue.flush().await;
    }
}
