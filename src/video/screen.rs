//! In-app screen capture source
//!
//! Screen sources differ from the camera only in pacing: the capture
//! facility delivers samples when on-screen content changes, so frames are
//! routed through the `FramePacer` to guarantee a minimum outgoing cadence
//! and cap bursts. Both screen variants share the same core of sinks,
//! observers and pacer; they differ only in where samples come from.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::format::MAX_SUPPORTED_VIDEO_FRAME_RATE;
use super::frame::VideoFrame;
use super::pacing::FramePacer;
use super::sample::{RawSample, SampleHandler};
use super::source::{
    CaptureSourceObserver, VideoCaptureSource, VideoContentHint, VideoSink, VideoSource,
};
use crate::dispatch::EventDispatcher;
use crate::error::{CaptureSourceError, Result};
use crate::registry::ObserverSet;

/// The in-app screen recording facility boundary.
pub trait ScreenRecorder: Send + Sync {
    fn is_recording(&self) -> bool;

    /// Begin delivering screen samples to `handler`.
    fn start_capture(&self, handler: SampleHandler) -> Result<()>;

    /// Halt sample delivery.
    fn stop_capture(&self) -> Result<()>;
}

/// State shared by the screen-capture variants: registries, pacer and the
/// sample ingestion path.
pub(crate) struct ScreenCore {
    label: &'static str,
    pub(crate) sinks: Arc<ObserverSet<dyn VideoSink>>,
    pub(crate) observers: Arc<ObserverSet<dyn CaptureSourceObserver>>,
    pub(crate) dispatcher: Arc<EventDispatcher>,
    pub(crate) pacer: FramePacer,
}

impl ScreenCore {
    pub(crate) fn new(
        label: &'static str,
        dispatcher: Arc<EventDispatcher>,
        frame_rate: u32,
    ) -> Self {
        let sinks: Arc<ObserverSet<dyn VideoSink>> = Arc::new(ObserverSet::new());
        let fanout = Arc::clone(&sinks);
        let interval = Duration::from_millis(1000 / frame_rate.max(1) as u64);
        let pacer = FramePacer::new(
            interval,
            Arc::new(move |frame: &VideoFrame| {
                for sink in fanout.snapshot() {
                    sink.on_frame_received(frame);
                }
            }),
        );
        Self {
            label,
            sinks,
            observers: Arc::new(ObserverSet::new()),
            dispatcher,
            pacer,
        }
    }

    /// Validate a raw sample and feed it through the pacer.
    pub(crate) fn ingest(&self, sample: RawSample) {
        match sample.into_frame() {
            Ok(frame) => {
                self.pacer.submit(frame);
            }
            Err(err) => {
                error!("{} invalid frame received", self.label);
                self.observers
                    .notify(&self.dispatcher, move |o| o.capture_did_fail(err));
            }
        }
    }

    pub(crate) fn notify_started(&self) {
        self.observers
            .notify(&self.dispatcher, |o| o.capture_did_start());
    }

    pub(crate) fn notify_stopped(&self) {
        self.observers
            .notify(&self.dispatcher, |o| o.capture_did_stop());
    }

    pub(crate) fn notify_failed(&self, err: CaptureSourceError) {
        self.observers
            .notify(&self.dispatcher, move |o| o.capture_did_fail(err));
    }
}

/// Captures the app's own screen through the in-process recording facility.
///
/// When the app is in the background the facility stops delivering samples;
/// the pacer keeps downstream consumers fed by resending the last frame.
pub struct InAppScreenCaptureSource {
    recorder: Arc<dyn ScreenRecorder>,
    core: Arc<ScreenCore>,
}

impl InAppScreenCaptureSource {
    pub fn new(recorder: Arc<dyn ScreenRecorder>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self::with_frame_rate(recorder, dispatcher, MAX_SUPPORTED_VIDEO_FRAME_RATE)
    }

    /// Create a source pacing output at `frame_rate` frames per second.
    pub fn with_frame_rate(
        recorder: Arc<dyn ScreenRecorder>,
        dispatcher: Arc<EventDispatcher>,
        frame_rate: u32,
    ) -> Self {
        Self {
            recorder,
            core: Arc::new(ScreenCore::new(
                "InAppScreenCaptureSource",
                dispatcher,
                frame_rate,
            )),
        }
    }
}

impl VideoSource for InAppScreenCaptureSource {
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

impl VideoCaptureSource for InAppScreenCaptureSource {
    fn start(&self) {
        if self.recorder.is_recording() {
            debug!("Screen recorder already recording, ignoring start");
            return;
        }
        self.core.pacer.start();
        let core = Arc::clone(&self.core);
        let handler: SampleHandler = Arc::new(move |sample| core.ingest(sample));
        match self.recorder.start_capture(handler) {
            Ok(()) => {
                info!("Screen recorder start succeeded");
                self.core.notify_started();
            }
            Err(err) => {
                error!("Screen recorder start failed: {}", err);
                self.core.pacer.stop();
                self.core.notify_failed(CaptureSourceError::SystemFailure);
            }
        }
    }

    fn stop(&self) {
        if !self.recorder.is_recording() {
            debug!("Screen recorder not recording, skipping stop");
            return;
        }
        // Cancel the resend timer before touching the recorder so nothing is
        // emitted once this call returns.
        self.core.pacer.stop();
        match self.recorder.stop_capture() {
            Ok(()) => {
                info!("Screen recorder stop succeeded");
                self.core.notify_stopped();
            }
            Err(err) => {
                error!("Screen recorder stop failed: {}", err);
                self.core.notify_failed(CaptureSourceError::SystemFailure);
            }
        }
    }

    fn add_capture_observer(&self, observer: Arc<dyn CaptureSourceObserver>) {
        self.core.observers.add(observer);
    }

    fn remove_capture_observer(&self, observer: &Arc<dyn CaptureSourceObserver>) {
        self.core.observers.remove(observer);
    }
}
