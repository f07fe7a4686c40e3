//! External transport boundary
//!
//! The transport client that encodes and transmits frames is out of scope;
//! this trait specifies the seam the session drives. Implementations report
//! asynchronous lifecycle changes on the event channel handed to `start`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::config::SessionConfiguration;
use crate::error::Result;
use crate::video::source::VideoSource;

/// Asynchronous lifecycle events reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The sending path is established; frames handed to the transport will
    /// reach remote participants.
    Connected,
    /// The transport stopped on its own.
    Stopped,
    /// The transport entered an unrecoverable failed state.
    Failed,
}

/// The network/media transport collaborator.
#[async_trait]
pub trait VideoTransport: Send + Sync {
    /// Begin a transport session for `config`, reporting lifecycle changes
    /// on `events`.
    ///
    /// A transport with no separate connection-confirmation step (device
    /// broadcast flows) must emit `TransportEvent::Connected` before
    /// returning, so the session can synthesize the start notification.
    async fn start(
        &self,
        config: &SessionConfiguration,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()>;

    /// Tear the transport session down.
    async fn stop(&self);

    /// Install or clear the source the transport pulls frames from. The
    /// transport registers its own sink on the given source.
    fn set_external_video_source(&self, source: Option<Arc<dyn VideoSource>>);

    /// Enable or disable frame transmission.
    fn set_sending(&self, sending: bool);
}
