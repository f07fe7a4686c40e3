//! Content sharing
//!
//! A content share designates one capture source as the one currently
//! transmitted to remote participants through the external transport. The
//! session enforces single-flight semantics: starting a new share cleanly
//! tears down the active one first.

pub mod adapter;
pub mod config;
pub mod session;
pub mod transport;

pub use adapter::VideoSourceAdapter;
pub use config::{Modality, ModalityType, SessionConfiguration, SessionCredentials};
pub use session::ContentShareSession;
pub use transport::{TransportEvent, VideoTransport};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::video::source::VideoSource;

/// Indicates the reason a content share event occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentShareStatusCode {
    /// Everything is OK so far.
    Ok,
    /// The content share video connection is in an unrecoverable failed
    /// state.
    VideoServiceFailed,
}

/// Status delivered with a `content_share_did_stop` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentShareStatus {
    pub status_code: ContentShareStatusCode,
}

impl ContentShareStatus {
    pub fn ok() -> Self {
        Self {
            status_code: ContentShareStatusCode::Ok,
        }
    }

    pub fn video_service_failed() -> Self {
        Self {
            status_code: ContentShareStatusCode::VideoServiceFailed,
        }
    }
}

/// Lifecycle listener for content share.
///
/// Callbacks are delivered on the session's dispatcher context regardless of
/// which thread produced the triggering event.
pub trait ContentShareObserver: Send + Sync {
    fn content_share_did_start(&self);
    fn content_share_did_stop(&self, status: ContentShareStatus);
}

/// The source bundle handed to `start_content_share`.
#[derive(Default, Clone)]
pub struct ContentShareSource {
    pub video_source: Option<Arc<dyn VideoSource>>,
}

impl ContentShareSource {
    pub fn with_video_source(source: Arc<dyn VideoSource>) -> Self {
        Self {
            video_source: Some(source),
        }
    }
}
