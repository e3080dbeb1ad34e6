//! Fixed-size worker pool over a bounded job queue.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use confsearch_core::{Error, Result};
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// `workers` long-lived tasks draining a queue of at most `queue_capacity`
/// pending jobs. Created once by the composition root and shut down by it.
pub struct WorkerPool {
    name: String,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Result slot of one submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Waits for the job. Fails with `Worker` if the job panicked.
    pub async fn join(self) -> Result<T> {
        self.receiver
            .await
            .map_err(|_| Error::Worker("job panicked or was dropped before completing".to_string()))
    }
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, workers: usize, queue_capacity: usize) -> Self {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|n| {
                let receiver = Arc::clone(&receiver);
                let label = format!("{name}-{n}");
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        let Some(job) = job else { break };
                        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                            warn!("{label}: job panicked");
                        }
                    }
                    debug!("{label}: queue closed, exiting");
                })
            })
            .collect();

        info!("Started worker pool '{name}' with {} workers", workers.max(1));
        Self { name, sender: Mutex::new(Some(sender)), workers: Mutex::new(handles) }
    }

    /// Queues `job`, waiting while the queue is full. Fails once the pool
    /// has been shut down.
    pub async fn submit<F, T>(&self, job: F) -> Result<JobHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::Worker(format!("pool '{}' is shut down", self.name)))?;

        let (tx, rx) = oneshot::channel();
        let wrapped: Job = Box::pin(async move {
            // The caller may have stopped waiting; the result is then discarded.
            let _ = tx.send(job.await);
        });
        sender
            .send(wrapped)
            .await
            .map_err(|_| Error::Worker(format!("pool '{}' is shut down", self.name)))?;
        Ok(JobHandle { receiver: rx })
    }

    /// Closes the queue, lets workers finish what is already queued, and
    /// joins them. Idempotent.
    pub async fn shutdown(&self) {
        self.sender.lock().await.take();
        let handles: Vec<_> = self.workers.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Worker of pool '{}' ended abnormally: {e}", self.name);
            }
        }
        info!("Worker pool '{}' shut down", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_jobs_and_returns_results() {
        let pool = WorkerPool::new("test", 2, 4);
        let handles = futures::future::join_all((0..8).map(|i| pool.submit(async move { i * 2 }))).await;

        let mut results = Vec::new();
        for h in handles {
            results.push(h.unwrap().join().await.unwrap());
        }
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_worker_count() {
        let pool = WorkerPool::new("bounded", 3, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let (running, peak) = (running.clone(), peak.clone());
            handles.push(
                pool.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap(),
            );
        }
        for h in handles {
            h.join().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_job_fails_only_its_handle() {
        let pool = WorkerPool::new("panics", 1, 2);
        let bad: JobHandle<()> = pool.submit(async { panic!("boom") }).await.unwrap();
        let good = pool.submit(async { 7 }).await.unwrap();

        assert!(matches!(bad.join().await, Err(Error::Worker(_))));
        assert_eq!(good.join().await.unwrap(), 7);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn full_queue_makes_submit_wait_without_dropping_jobs() {
        let pool = WorkerPool::new("backpressure", 1, 1);
        let done = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let counter = done.clone();
        let first = pool
            .submit(async move {
                let _ = started_tx.send(());
                let _ = release_rx.await;
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        started_rx.await.unwrap();

        // The only worker is busy, so this one fills the queue.
        let counter = done.clone();
        let second = pool.submit(async move { counter.fetch_add(1, Ordering::SeqCst); }).await.unwrap();

        let counter = done.clone();
        let third = pool.submit(async move { counter.fetch_add(1, Ordering::SeqCst); });
        tokio::pin!(third);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut third).await.is_err(),
            "submit must wait while the queue is full"
        );
        assert_eq!(done.load(Ordering::SeqCst), 0);

        release_tx.send(()).unwrap();
        let third = third.await.unwrap();
        for h in [first, second, third] {
            h.join().await.unwrap();
        }
        assert_eq!(done.load(Ordering::SeqCst), 3);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn submit_after_shutdown_fails() {
        let pool = WorkerPool::new("closed", 1, 1);
        pool.shutdown().await;
        pool.shutdown().await;
        assert!(matches!(pool.submit(async {}).await, Err(Error::Worker(_))));
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let pool = WorkerPool::new("drain", 1, 8);
        let done = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..5 {
            let done = done.clone();
            handles.push(pool.submit(async move { done.fetch_add(1, Ordering::SeqCst); }).await.unwrap());
        }
        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }
}
