//! Device-level screen broadcast source
//!
//! This source contains no capture facility of its own: a broadcast
//! extension running at the device level pushes samples into
//! `process_sample`. The host app is responsible for starting the broadcast;
//! start/stop here only gate ingestion and the pacing timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::format::MAX_SUPPORTED_VIDEO_FRAME_RATE;
use super::sample::RawSample;
use super::screen::ScreenCore;
use super::source::{
    CaptureSourceObserver, VideoCaptureSource, VideoContentHint, VideoSink, VideoSource,
};
use crate::dispatch::EventDispatcher;

/// Capture source fed by a device-level screen broadcast.
pub struct BroadcastScreenCaptureSource {
    core: Arc<ScreenCore>,
    running: AtomicBool,
}

impl BroadcastScreenCaptureSource {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self::with_frame_rate(dispatcher, MAX_SUPPORTED_VIDEO_FRAME_RATE)
    }

    /// Create a source pacing output at `frame_rate` frames per second.
    pub fn with_frame_rate(dispatcher: Arc<EventDispatcher>, frame_rate: u32) -> Self {
        Self {
            core: Arc::new(ScreenCore::new(
                "BroadcastScreenCaptureSource",
                dispatcher,
                frame_rate,
            )),
            running: AtomicBool::new(false),
        }
    }

    /// Ingestion entry point for the broadcast extension.
    ///
    /// Samples arriving while the source is stopped are dropped.
    pub fn process_sample(&self, sample: RawSample) {
        if !self.running.load(Ordering::SeqCst) {
            debug!("Broadcast sample received while stopped, dropping");
            return;
        }
        self.core.ingest(sample);
    }
}

impl VideoSource for BroadcastScreenCaptureSource {
    fn content_hint(&self) -> VideoContentHint {
        VideoContentHint::Text
    }

    fn add_sink(&self, sink: Arc<dyn VideoSink>) {
        self.core.sinks.add(sink);
    }

    fn remove_sink(&self, sink: &Arc<dyn VideoSink>) {
        self.core.sinks.remove(sink);
    }
}

impl VideoCaptureSource for BroadcastScreenCaptureSource {
    fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Broadcast source already started, ignoring start");
            return;
        }
        self.core.pacer.start();
        // There is no facility to wait on; the broadcast extension is
        // already feeding samples, so the start notification is immediate.
        info!("Broadcast screen capture started");
        self.core.notify_started();
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.core.pacer.stop();
        info!("Broadcast screen capture stopped");
        self.core.notify_stopped();
    }

    fn add_capture_observer(&self, observer: Arc<dyn CaptureSourceObserver>) {
        self.core.observers.add(observer);
    }

    fn remove_capture_observer(&self, observer: &Arc<dyn CaptureSourceObserver>) {
        self.core.observers.remove(observer);
    }
}
