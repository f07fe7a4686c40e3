//! Serialized dispatch context for lifecycle notifications
//!
//! Capture and content-share lifecycle callbacks can be triggered from the
//! capture thread, the pacing timer task, or the transport's event task. All
//! of them are marshalled onto a single dispatcher task so observers see a
//! consistent execution context, in submission order, regardless of which
//! thread produced the event. Frame delivery to sinks never goes through
//! here; it stays synchronous on the producing context.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs one at a time on a dedicated task.
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl EventDispatcher {
    /// Create a dispatcher and spawn its drain task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
            debug!("Event dispatcher drained and closed");
        });
        Arc::new(Self { tx })
    }

    /// Enqueue a job for execution on the dispatcher context.
    ///
    /// Jobs enqueued after the dispatcher is dropped are discarded.
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.tx.send(Box::new(job));
    }

    /// Wait until every job enqueued before this call has run.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.dispatch(move || {
            let _ = done_tx.send(());
        });
        let _ = done_rx.await;
    }
}
