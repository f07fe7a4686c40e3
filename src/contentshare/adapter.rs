//! Adapter between the active capture source and the transport
//!
//! The adapter is a sink on whichever source is currently being shared and a
//! source for the transport's own sinks. Swapping the upstream source is a
//! synchronous barrier: once `set_source` returns, frames from the previous
//! source can no longer reach the transport side.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::registry::ObserverSet;
use crate::video::frame::VideoFrame;
use crate::video::source::{VideoContentHint, VideoSink, VideoSource};

/// Forwards frames from the bound upstream source to the transport's sinks.
pub struct VideoSourceAdapter {
    sinks: ObserverSet<dyn VideoSink>,
    current: Mutex<Option<Arc<dyn VideoSource>>>,
}

impl VideoSourceAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sinks: ObserverSet::new(),
            current: Mutex::new(None),
        })
    }

    /// Bind the adapter to `source`, detaching from the previous one.
    ///
    /// Forwarding happens under the same lock, so an in-flight delivery from
    /// the old source completes before the swap and nothing from it is
    /// forwarded afterwards.
    pub fn set_source(self: &Arc<Self>, source: Option<Arc<dyn VideoSource>>) {
        let self_sink: Arc<dyn VideoSink> = Arc::clone(self) as Arc<dyn VideoSink>;
        let mut current = self.current.lock();
        if let Some(old) = current.take() {
            old.remove_sink(&self_sink);
        }
        if let Some(new) = &source {
            new.add_sink(self_sink);
        }
        *current = source;
    }

    /// The currently bound upstream source.
    pub fn source(&self) -> Option<Arc<dyn VideoSource>> {
        self.current.lock().clone()
    }
}

impl VideoSink for VideoSourceAdapter {
    fn on_frame_received(&self, frame: &VideoFrame) {
        let current = self.current.lock();
        if current.is_none() {
            return;
        }
        for sink in self.sinks.snapshot() {
            sink.on_frame_received(frame);
        }
    }
}

impl VideoSource for VideoSourceAdapter {
    fn content_hint(&self) -> VideoContentHint {
        self.current
            .lock()
            .as_ref()
            .map(|source| source.content_hint())
            .unwrap_or(VideoContentHint::None)
    }

    fn add_sink(&self, sink: Arc<dyn VideoSink>) {
        self.sinks.add(sink);
    }

    fn remove_sink(&self, sink: &Arc<dyn VideoSink>) {
        self.sinks.remove(sink);
    }
}
