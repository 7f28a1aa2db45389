//! FIFO request scheduler: at most one upstream call in flight.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::classifier::ErrorClassifier;
use crate::error::{AppError, RawError};
use crate::throttling::{Lane, RateLimiter};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Deferred unit of work. The job owns the sender that settles its caller.
struct QueuedRequest {
    lane: Lane,
    job: Job,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedRequest>,
    draining: bool,
}

/// Serializes every upstream call through the shared [`RateLimiter`].
///
/// Tasks run strictly one at a time in enqueue order. The drain loop is a
/// tokio task started on demand; the `draining` flag shares a lock with the
/// FIFO so an enqueue racing the loop's exit either lands before the loop
/// observes an empty queue or starts a fresh loop.
#[derive(Clone)]
pub struct RequestQueue {
    state: Arc<Mutex<QueueState>>,
    limiter: Arc<RateLimiter>,
    classifier: ErrorClassifier,
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("pending", &self.pending_len())
            .field("draining", &self.is_draining())
            .finish()
    }
}

impl RequestQueue {
    pub fn new(limiter: Arc<RateLimiter>, classifier: ErrorClassifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            limiter,
            classifier,
        }
    }

    /// Appends `task` and waits for its outcome. Failures come back classified.
    ///
    /// The task runs even if the returned future is dropped.
    pub async fn enqueue<T, F>(&self, lane: Lane, task: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, RawError>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = sender.send(task.await);
        });

        let start_drain = {
            let mut state = self.lock_state();
            state.pending.push_back(QueuedRequest { lane, job });
            trace!(lane = lane.as_str(), pending = state.pending.len(), "request enqueued");
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_drain {
            debug!("starting request queue drain loop");
            tokio::spawn(drain(Arc::clone(&self.state), Arc::clone(&self.limiter)));
        }

        let outcome = receiver.await.unwrap_or_else(|_| {
            Err(RawError::other(
                "request queue dropped the task before it completed",
            ))
        });
        outcome.map_err(|raw| self.classifier.classify(raw))
    }

    pub fn pending_len(&self) -> usize {
        self.lock_state().pending.len()
    }

    pub fn is_draining(&self) -> bool {
        self.lock_state().draining
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .expect("request queue state should not be poisoned")
    }
}

async fn drain(state: Arc<Mutex<QueueState>>, limiter: Arc<RateLimiter>) {
    loop {
        let next = {
            let mut state = state
                .lock()
                .expect("request queue state should not be poisoned");
            match state.pending.pop_front() {
                Some(request) => request,
                None => {
                    state.draining = false;
                    debug!("request queue drained");
                    return;
                }
            }
        };

        limiter.await_turn(next.lane).await;

        // A panicking job drops its sender, which settles that caller with
        // UNKNOWN; the loop itself must outlive it.
        if let Err(error) = tokio::spawn(next.job).await {
            warn!(lane = next.lane.as_str(), %error, "queued request aborted");
        }
    }
}
