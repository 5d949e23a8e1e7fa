//! Rate-limited, single-flight route job queue.
//!
//! Jobs are keyed (by day). At most one job runs at a time across all keys,
//! at most one job per key waits, and consecutive jobs are spaced by at
//! least `min_delay`. A job that fails with [`RoutingError::RateLimited`]
//! pushes the next start back by `rate_limit_backoff` as well.
//!
//! The queue state sits behind a `std::sync::Mutex` that is never held
//! across an `.await`.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::error::{QueueError, RoutingError};

/// Default minimum gap between two jobs.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(400);

/// Default extra gap after the engine reports rate limiting.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(3000);

/// Queue pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Minimum time between one job finishing and the next starting
    pub min_delay: Duration,
    /// Added to `min_delay` after a rate-limited failure
    pub rate_limit_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

impl QueueConfig {
    /// Set the minimum gap between jobs.
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Set the rate-limit backoff.
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }
}

type Task<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, RoutingError>> + Send>;

struct Job<K, T> {
    key: K,
    task: Task<T>,
    reply: oneshot::Sender<Result<T, QueueError>>,
}

impl<K, T> Job<K, T> {
    fn reject(self, err: QueueError) {
        // The submitter may have stopped waiting.
        let _ = self.reply.send(Err(err));
    }
}

struct QueueState<K, T> {
    pending: VecDeque<Job<K, T>>,
    processing: bool,
    /// Earliest instant the next job may start.
    next_allowed: Option<Instant>,
}

struct Inner<K, T> {
    config: QueueConfig,
    state: Mutex<QueueState<K, T>>,
}

impl<K, T> Inner<K, T> {
    fn lock(&self) -> MutexGuard<'_, QueueState<K, T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the eventual result of an enqueued job.
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: oneshot::Receiver<Result<T, QueueError>>,
}

impl<T> JobHandle<T> {
    /// Wait for the job to run, or to be superseded or cancelled.
    pub async fn wait(self) -> Result<T, QueueError> {
        self.rx.await.unwrap_or(Err(QueueError::Closed))
    }
}

/// The route job queue. Cloning gives another handle to the same queue.
pub struct RouteQueue<K, T> {
    inner: Arc<Inner<K, T>>,
}

impl<K, T> Clone for RouteQueue<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T> fmt::Debug for RouteQueue<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("RouteQueue")
            .field("config", &self.inner.config)
            .field("pending", &state.pending.len())
            .field("processing", &state.processing)
            .finish()
    }
}

impl<K, T> RouteQueue<K, T>
where
    K: PartialEq + fmt::Debug + Send + 'static,
    T: Send + 'static,
{
    /// Create an idle queue.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    processing: false,
                    next_allowed: None,
                }),
            }),
        }
    }

    /// The queue's pacing.
    pub fn config(&self) -> QueueConfig {
        self.inner.config
    }

    /// Number of jobs waiting to start.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Queue `task` under `key`.
    ///
    /// A job already waiting under `key` is dropped (its handle resolves to
    /// [`QueueError::Superseded`]) and the new job goes to the back. A job
    /// for `key` that is already running is left alone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue<F, Fut>(&self, key: K, task: F) -> JobHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RoutingError>> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job = Job {
            key,
            task: Box::new(move || task().boxed()),
            reply,
        };

        let start_worker = {
            let mut state = self.inner.lock();
            if let Some(idx) = state.pending.iter().position(|j| j.key == job.key) {
                if let Some(old) = state.pending.remove(idx) {
                    trace!(key = ?old.key, "superseding pending route job");
                    old.reject(QueueError::Superseded);
                }
            }
            state.pending.push_back(job);
            !std::mem::replace(&mut state.processing, true)
        };

        if start_worker {
            tokio::spawn(run(Arc::clone(&self.inner)));
        }

        JobHandle { rx }
    }

    /// Drop the job waiting under `key`, if any. A running job is not
    /// interrupted.
    pub fn cancel(&self, key: &K) -> bool {
        let job = {
            let mut state = self.inner.lock();
            let Some(idx) = state.pending.iter().position(|j| &j.key == key) else {
                return false;
            };
            state.pending.remove(idx)
        };

        match job {
            Some(job) => {
                trace!(key = ?job.key, "cancelled pending route job");
                job.reject(QueueError::Cancelled);
                true
            }
            None => false,
        }
    }
}

/// The single worker. Exits when no job is waiting.
async fn run<K, T>(inner: Arc<Inner<K, T>>)
where
    K: fmt::Debug + Send + 'static,
    T: Send + 'static,
{
    loop {
        let next_allowed = inner.lock().next_allowed;
        if let Some(at) = next_allowed {
            tokio::time::sleep_until(at).await;
        }

        // Jobs cancelled during the wait are already gone.
        let job = {
            let mut state = inner.lock();
            match state.pending.pop_front() {
                Some(job) => job,
                None => {
                    state.processing = false;
                    return;
                }
            }
        };

        debug!(key = ?job.key, "running route job");
        let task = job.task;
        let result = match AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(QueueError::Task(e)),
            Err(_) => {
                warn!(key = ?job.key, "route job panicked");
                Err(QueueError::Panicked)
            }
        };

        let mut gap = inner.config.min_delay;
        if matches!(&result, Err(QueueError::Task(e)) if e.is_rate_limited()) {
            warn!(
                backoff_ms = inner.config.rate_limit_backoff.as_millis() as u64,
                "routing engine rate limited, backing off"
            );
            gap += inner.config.rate_limit_backoff;
        }
        inner.lock().next_allowed = Some(Instant::now() + gap);

        let _ = job.reply.send(result);
    }
}
