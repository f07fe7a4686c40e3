//! Content-share session state machine
//!
//! Coordinates one capture source with the external transport. States run
//! Idle -> Starting -> Sharing -> Stopping -> Idle; a transport failure
//! forces Idle from Starting or Sharing after notifying observers. All
//! transitions happen under one async mutex, so concurrent start/stop calls
//! and asynchronous transport events cannot interleave incoherently: a
//! failure arriving while a start is in progress waits for the lock and then
//! wins, never leaving the machine in Sharing.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::adapter::VideoSourceAdapter;
use super::config::SessionConfiguration;
use super::transport::{TransportEvent, VideoTransport};
use super::{ContentShareObserver, ContentShareSource, ContentShareStatus};
use crate::dispatch::EventDispatcher;
use crate::error::Result;
use crate::registry::ObserverSet;
use crate::video::source::VideoSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShareState {
    Idle,
    Starting,
    Sharing,
    Stopping,
}

/// Arbitrates which capture source is shared through the transport.
///
/// At most one source is active at any time: starting a new share first
/// performs the full stop sequence for the previous one.
pub struct ContentShareSession {
    transport: Arc<dyn VideoTransport>,
    /// Content-leg configuration derived from the session configuration.
    config: SessionConfiguration,
    observers: Arc<ObserverSet<dyn ContentShareObserver>>,
    dispatcher: Arc<EventDispatcher>,
    adapter: Arc<VideoSourceAdapter>,
    state: tokio::sync::Mutex<ShareState>,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl ContentShareSession {
    pub fn new(
        configuration: SessionConfiguration,
        transport: Arc<dyn VideoTransport>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            config: configuration.content_share_configuration(),
            observers: Arc::new(ObserverSet::new()),
            dispatcher,
            adapter: VideoSourceAdapter::new(),
            state: tokio::sync::Mutex::new(ShareState::Idle),
            event_task: Mutex::new(None),
        })
    }

    /// Whether a share is currently established.
    pub async fn is_sharing(&self) -> bool {
        *self.state.lock().await == ShareState::Sharing
    }

    /// Start sharing `source`, superseding any active share.
    ///
    /// By the time the previous share's teardown begins, no frame from its
    /// source reaches the transport. Observers hear
    /// `content_share_did_start` once the transport confirms the connection.
    pub async fn start_content_share(
        self: &Arc<Self>,
        source: ContentShareSource,
    ) -> Result<()> {
        let video_source = match source.video_source {
            Some(video_source) => video_source,
            None => {
                warn!("Content share source carries no video source, nothing to start");
                return Ok(());
            }
        };

        let mut state = self.state.lock().await;
        if *state != ShareState::Idle {
            info!("Superseding active content share");
            self.stop_locked(&mut state, ContentShareStatus::ok()).await;
        }

        *state = ShareState::Starting;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.spawn_event_task(events_rx);

        if let Err(err) = self.transport.start(&self.config, events_tx).await {
            *state = ShareState::Idle;
            return Err(err);
        }

        self.adapter.set_source(Some(video_source));
        self.transport
            .set_external_video_source(Some(Arc::clone(&self.adapter) as Arc<dyn VideoSource>));
        self.transport.set_sending(true);
        info!("Content share starting for meeting {}", self.config.meeting_id);
        Ok(())
    }

    /// Stop the active share, notifying observers with an ok status.
    ///
    /// A no-op when nothing is being shared.
    pub async fn stop_content_share(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        if *state == ShareState::Idle {
            debug!("No active content share to stop");
            return;
        }
        self.stop_locked(&mut state, ContentShareStatus::ok()).await;
    }

    pub fn add_content_share_observer(&self, observer: Arc<dyn ContentShareObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_content_share_observer(&self, observer: &Arc<dyn ContentShareObserver>) {
        self.observers.remove(observer);
    }

    async fn stop_locked(&self, state: &mut ShareState, status: ContentShareStatus) {
        *state = ShareState::Stopping;
        // Detach the source first: past this point no frame reaches the
        // transport.
        self.adapter.set_source(None);
        self.transport.set_sending(false);
        self.transport.set_external_video_source(None);
        self.transport.stop().await;
        *state = ShareState::Idle;
        info!("Content share stopped");
        self.observers
            .notify(&self.dispatcher, move |o| o.content_share_did_stop(status));
    }

    fn spawn_event_task(self: &Arc<Self>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                session.handle_transport_event(event).await;
            }
        });
        // Events from a superseded transport run must not bleed into this
        // one.
        if let Some(stale) = self.event_task.lock().replace(task) {
            stale.abort();
        }
    }

    async fn handle_transport_event(self: &Arc<Self>, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                let mut state = self.state.lock().await;
                if *state == ShareState::Starting {
                    *state = ShareState::Sharing;
                    info!("Content share connected");
                    self.observers
                        .notify(&self.dispatcher, |o| o.content_share_did_start());
                }
            }
            TransportEvent::Stopped => {
                let mut state = self.state.lock().await;
                if *state != ShareState::Idle {
                    info!("Content share stopped by transport");
                    self.adapter.set_source(None);
                    self.transport.set_external_video_source(None);
                    *state = ShareState::Idle;
                    self.observers.notify(&self.dispatcher, |o| {
                        o.content_share_did_stop(ContentShareStatus::ok())
                    });
                }
            }
            TransportEvent::Failed => {
                let mut state = self.state.lock().await;
                if *state != ShareState::Idle {
                    warn!("Content share transport failed");
                    self.adapter.set_source(None);
                    self.transport.set_sending(false);
                    self.transport.set_external_video_source(None);
                    *state = ShareState::Idle;
                    self.observers.notify(&self.dispatcher, |o| {
                        o.content_share_did_stop(ContentShareStatus::video_service_failed())
                    });
                }
            }
        }
    }
}

impl Drop for ContentShareSession {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.lock().take() {
            task.abort();
        }
    }
}
