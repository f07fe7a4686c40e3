//! Shared test doubles for capture and content-share tests

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::CaptureSourceError;
use crate::video::frame::VideoFrame;
use crate::video::source::{CaptureSourceObserver, VideoSink};

/// Sink recording every delivered frame.
pub(crate) struct RecordingSink {
    frames: Mutex<Vec<VideoFrame>>,
}

impl RecordingSink {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn count(&self) -> usize {
        self.frames.lock().len()
    }

    pub(crate) fn frames(&self) -> Vec<VideoFrame> {
        self.frames.lock().clone()
    }
}

impl VideoSink for RecordingSink {
    fn on_frame_received(&self, frame: &VideoFrame) {
        self.frames.lock().push(frame.clone());
    }
}

/// Capture observer counting lifecycle notifications.
pub(crate) struct RecordingObserver {
    starts: AtomicUsize,
    stops: AtomicUsize,
    failures: Mutex<Vec<CaptureSourceError>>,
}

impl RecordingObserver {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn failures(&self) -> Vec<CaptureSourceError> {
        self.failures.lock().clone()
    }
}

impl CaptureSourceObserver for RecordingObserver {
    fn capture_did_start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn capture_did_stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn capture_did_fail(&self, error: CaptureSourceError) {
        self.failures.lock().push(error);
    }
}
