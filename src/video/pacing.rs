//! Frame pacing and resend scheduling
//!
//! Screen-capture facilities deliver a new sample only when on-screen content
//! changes; downstream consumers expect a frame at least once per pacing
//! interval. The pacer caps the outgoing rate at the target during bursts and
//! resends the last delivered frame on a timer during static periods, so an
//! encoder never starves and never sees two frames closer together than the
//! interval.
//!
//! The capture path (`submit`) and the timer path share one mutex guarding
//! the cached input, the last sent frame and the last send timestamp; every
//! emission happens under that mutex, so the two paths can never interleave
//! incoherently. `stop` bumps a generation counter under the same mutex,
//! which makes cancellation effective the moment it returns: a timer fire
//! already in flight observes the stale generation and exits without
//! emitting.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

use super::frame::VideoFrame;

/// Synchronous fan-out callback invoked for every emitted frame.
pub type EmitFn = Arc<dyn Fn(&VideoFrame) + Send + Sync>;

struct PacerState {
    generation: u64,
    running: bool,
    /// Newest sample that was rate-capped since the last send.
    cached_input: Option<VideoFrame>,
    last_sent: Option<VideoFrame>,
    last_send_at: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

/// Timer-driven minimum-cadence scheduler for screen-capture sources.
pub struct FramePacer {
    interval: Duration,
    emit: EmitFn,
    runtime: Handle,
    epoch: Instant,
    state: Arc<Mutex<PacerState>>,
}

impl FramePacer {
    /// Create a pacer targeting one frame per `interval`.
    ///
    /// Must be called from within a Tokio runtime; `submit` may then be
    /// invoked from any thread.
    pub fn new(interval: Duration, emit: EmitFn) -> Self {
        Self {
            interval,
            emit,
            runtime: Handle::current(),
            epoch: Instant::now(),
            state: Arc::new(Mutex::new(PacerState {
                generation: 0,
                running: false,
                cached_input: None,
                last_sent: None,
                last_send_at: None,
                timer: None,
            })),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin accepting frames. The resend timer is armed on the first send.
    pub fn start(&self) {
        let mut state = self.state.lock();
        state.running = true;
    }

    /// Stop emitting and clear cached frame state.
    ///
    /// Synchronous cancellation: once this returns, no further frame is
    /// emitted, even if a timer fire was already in flight, and a restarted
    /// pacer can never resend content from a previous run.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.running = false;
        state.generation += 1;
        state.cached_input = None;
        state.last_sent = None;
        state.last_send_at = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Offer a validated frame from the capture path.
    ///
    /// Emits it immediately unless the previous send was less than one
    /// interval ago, in which case the frame is cached as the newest input
    /// and dropped. Returns whether the frame was emitted.
    pub fn submit(&self, frame: VideoFrame) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = state.last_send_at {
            if now.duration_since(last) < self.interval {
                trace!("Rate cap: caching sample instead of sending");
                state.cached_input = Some(frame);
                return false;
            }
        }
        state.cached_input = None;
        state.last_sent = Some(frame.clone());
        state.last_send_at = Some(now);
        (self.emit)(&frame);
        if state.timer.is_none() {
            let generation = state.generation;
            state.timer = Some(self.spawn_timer(generation));
        }
        true
    }

    fn spawn_timer(&self, generation: u64) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let emit = Arc::clone(&self.emit);
        let interval = self.interval;
        let epoch = self.epoch;
        self.runtime.spawn(async move {
            let mut deadline = Instant::now() + interval;
            loop {
                tokio::time::sleep_until(deadline).await;
                deadline = {
                    let mut state = state.lock();
                    if state.generation != generation || !state.running {
                        return;
                    }
                    let last = match state.last_send_at {
                        Some(last) => last,
                        None => return,
                    };
                    let now = Instant::now();
                    if now.duration_since(last) >= interval {
                        let frame = if let Some(cached) = state.cached_input.take() {
                            // A rate-capped sample is newer than anything
                            // sent; it wins over a verbatim resend.
                            cached
                        } else if let Some(last_frame) = &state.last_sent {
                            trace!("Resending last frame to keep cadence");
                            let timestamp_ns = now.duration_since(epoch).as_nanos() as i64;
                            last_frame.with_timestamp(timestamp_ns)
                        } else {
                            return;
                        };
                        state.last_sent = Some(frame.clone());
                        state.last_send_at = Some(now);
                        (emit)(&frame);
                        now + interval
                    } else {
                        // A frame went out since this fire was scheduled;
                        // wake again at the next natural boundary.
                        last + interval
                    }
                };
            }
        })
    }
}

impl Drop for FramePacer {
    fn drop(&mut self) {
        if let Some(timer) = self.state.lock().timer.take() {
            timer.abort();
        }
    }
}
