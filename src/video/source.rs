//! Capture source and sink contracts

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::frame::VideoFrame;
use crate::error::CaptureSourceError;

/// Hint about the kind of content a source produces, forwarded to the
/// transport so it can tune encoding (e.g. favor sharpness for text).
///
/// See <https://www.w3.org/TR/mst-content-hint/#video-content-hints>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoContentHint {
    None,
    Motion,
    Detail,
    Text,
}

/// A consumer of video frames.
///
/// `on_frame_received` is invoked synchronously on whichever context produced
/// the frame and must not block significantly; a sink that needs async
/// processing hands off internally. The frame is only guaranteed valid for
/// the duration of the call; retaining it means cloning it.
pub trait VideoSink: Send + Sync {
    fn on_frame_received(&self, frame: &VideoFrame);
}

/// A producer of video frames that sinks can attach to.
pub trait VideoSource: Send + Sync {
    fn content_hint(&self) -> VideoContentHint {
        VideoContentHint::None
    }

    /// Register a sink; safe to call while a delivery is in flight.
    fn add_sink(&self, sink: Arc<dyn VideoSink>);

    /// Unregister a sink; takes effect no later than the next delivery.
    fn remove_sink(&self, sink: &Arc<dyn VideoSink>);
}

/// Lifecycle listener for a capture source.
pub trait CaptureSourceObserver: Send + Sync {
    fn capture_did_start(&self);
    fn capture_did_stop(&self);
    fn capture_did_fail(&self, error: CaptureSourceError);
}

/// A `VideoSource` backed by a capture facility with an explicit lifecycle.
///
/// `start` and `stop` are idempotent: starting an already started source
/// creates no duplicate underlying capture session and no duplicate
/// `capture_did_start` notification; stopping an already stopped source
/// notifies nothing. After `stop` returns, no further frame reaches any sink.
pub trait VideoCaptureSource: VideoSource {
    fn start(&self);
    fn stop(&self);
    fn add_capture_observer(&self, observer: Arc<dyn CaptureSourceObserver>);
    fn remove_capture_observer(&self, observer: &Arc<dyn CaptureSourceObserver>);
}
