//! Capture device identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaDeviceType {
    VideoFrontCamera,
    VideoBackCamera,
    Other,
}

/// Identifies a capture device.
///
/// Devices are enumerated on demand through the camera backend and are not
/// cached beyond a single listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDevice {
    /// Human-readable device label from the backend.
    pub label: String,
    /// Device kind.
    pub device_type: MediaDeviceType,
}

impl MediaDevice {
    pub fn new(label: impl Into<String>, device_type: MediaDeviceType) -> Self {
        Self {
            label: label.into(),
            device_type,
        }
    }
}

impl fmt::Display for MediaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.device_type {
            MediaDeviceType::VideoFrontCamera => "front camera",
            MediaDeviceType::VideoBackCamera => "back camera",
            MediaDeviceType::Other => "other",
        };
        write!(f, "{} ({})", self.label, kind)
    }
}
