//! Session configuration and content modality
//!
//! Content share joins the meeting as a second participant derived from the
//! primary attendee: the attendee id and join token carry a `#content`
//! suffix so the service can pair the two legs.

use serde::{Deserialize, Serialize};

/// Separator between the base id and the modality suffix.
pub const MODALITY_SEPARATOR: char = '#';

/// Known participant modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModalityType {
    Content,
}

impl ModalityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityType::Content => "content",
        }
    }
}

/// A participant id of the form `base` or `base#modality`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modality {
    pub id: String,
    pub base: String,
    pub modality: Option<String>,
}

impl Modality {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut parts = id.splitn(2, MODALITY_SEPARATOR);
        let base = parts.next().unwrap_or_default().to_string();
        let modality = parts.next().map(str::to_string);
        Self { id, base, modality }
    }

    pub fn has_modality(&self, kind: ModalityType) -> bool {
        self.modality.as_deref() == Some(kind.as_str())
    }
}

/// Credentials identifying one attendee of a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub attendee_id: String,
    pub external_user_id: String,
    pub join_token: String,
}

/// Configuration for one meeting session, consumed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfiguration {
    pub meeting_id: String,
    pub credentials: SessionCredentials,
}

impl SessionConfiguration {
    pub fn new(meeting_id: impl Into<String>, credentials: SessionCredentials) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            credentials,
        }
    }

    /// Derive the configuration for the content-share leg of this session.
    pub fn content_share_configuration(&self) -> Self {
        let suffix = format!("{}{}", MODALITY_SEPARATOR, ModalityType::Content.as_str());
        Self {
            meeting_id: self.meeting_id.clone(),
            credentials: SessionCredentials {
                attendee_id: format!("{}{}", self.credentials.attendee_id, suffix),
                external_user_id: self.credentials.external_user_id.clone(),
                join_token: format!("{}{}", self.credentials.join_token, suffix),
            },
        }
    }
}
