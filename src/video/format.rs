//! Capture format definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum supported capture height in pixels.
pub const MAX_SUPPORTED_VIDEO_HEIGHT: u32 = 720;
/// Maximum supported capture frame rate.
pub const MAX_SUPPORTED_VIDEO_FRAME_RATE: u32 = 15;

/// Describes a capture configuration that may be applied to a capture source.
///
/// Equality is field-wise; formats are produced by enumerating device
/// capability and consumed to select or report the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureFormat {
    /// Capture width in pixels.
    pub width: u32,
    /// Capture height in pixels.
    pub height: u32,
    /// Max frame rate. When used as input this implies the desired frame
    /// rate as well.
    pub max_frame_rate: u32,
}

impl CaptureFormat {
    pub fn new(width: u32, height: u32, max_frame_rate: u32) -> Self {
        Self {
            width,
            height,
            max_frame_rate,
        }
    }

    /// The pacing interval implied by `max_frame_rate`.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.max_frame_rate.max(1) as u64)
    }

    /// Check if the format describes a usable configuration
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.max_frame_rate > 0
    }
}

impl Default for CaptureFormat {
    /// 16:9 at the maximum supported height and frame rate.
    fn default() -> Self {
        Self {
            width: (MAX_SUPPORTED_VIDEO_HEIGHT / 9) * 16,
            height: MAX_SUPPORTED_VIDEO_HEIGHT,
            max_frame_rate: MAX_SUPPORTED_VIDEO_FRAME_RATE,
        }
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{}",
            self.width, self.height, self.max_frame_rate
        )
    }
}

/// Pick the supported format closest to `desired` by resolution distance
/// (|dw| + |dh|). Returns `None` when `supported` is empty.
pub fn closest_format(supported: &[CaptureFormat], desired: &CaptureFormat) -> Option<CaptureFormat> {
    supported
        .iter()
        .min_by_key(|f| {
            f.width.abs_diff(desired.width) as u64 + f.height.abs_diff(desired.height) as u64
        })
        .copied()
}
