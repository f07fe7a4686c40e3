//! Raw samples arriving from the capture boundary
//!
//! The OS capture facility delivers timestamped image samples with optional
//! orientation metadata. Sources validate each sample before wrapping it as a
//! `VideoFrame`; a malformed sample is reported to observers and dropped
//! without interrupting capture.

use std::sync::Arc;

use super::frame::{FrameBuffer, VideoFrame, VideoRotation};
use crate::error::CaptureSourceError;

/// Callback a capture facility invokes for every raw sample, on its own
/// capture thread.
pub type SampleHandler = Arc<dyn Fn(RawSample) + Send + Sync>;

/// Orientation metadata attached to a screen sample by the capture facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrientation {
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    Left,
    LeftMirrored,
    Right,
    RightMirrored,
}

impl SampleOrientation {
    /// Fixed lookup from orientation metadata to the canonical rotation.
    pub fn to_rotation(self) -> VideoRotation {
        match self {
            SampleOrientation::Left | SampleOrientation::LeftMirrored => VideoRotation::Rotation90,
            SampleOrientation::Down | SampleOrientation::DownMirrored => VideoRotation::Rotation180,
            SampleOrientation::Right | SampleOrientation::RightMirrored => {
                VideoRotation::Rotation270
            }
            _ => VideoRotation::Rotation0,
        }
    }
}

/// A raw sample as delivered by the capture boundary.
#[derive(Clone)]
pub struct RawSample {
    /// The image payload; absent when the facility delivered a sample with
    /// no image attached.
    pub buffer: Option<Arc<dyn FrameBuffer>>,
    /// Presentation timestamp in nanoseconds on the capture clock.
    pub timestamp_ns: i64,
    /// Orientation metadata, when the facility provides it.
    pub orientation: Option<SampleOrientation>,
    /// Number of images carried by the sample. Exactly one is valid.
    pub image_count: u32,
    /// Whether the payload data is ready for reading.
    pub ready: bool,
}

impl RawSample {
    /// A well-formed single-image sample.
    pub fn new(buffer: Arc<dyn FrameBuffer>, timestamp_ns: i64) -> Self {
        Self {
            buffer: Some(buffer),
            timestamp_ns,
            orientation: None,
            image_count: 1,
            ready: true,
        }
    }

    pub fn with_orientation(mut self, orientation: SampleOrientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Check the sample is a single, ready, non-empty, timestamped image.
    pub fn validate(&self) -> Result<(), CaptureSourceError> {
        if self.image_count != 1 || !self.ready || self.timestamp_ns < 0 {
            return Err(CaptureSourceError::InvalidFrame);
        }
        match &self.buffer {
            Some(buffer) if buffer.width() > 0 && buffer.height() > 0 => Ok(()),
            _ => Err(CaptureSourceError::InvalidFrame),
        }
    }

    /// The rotation implied by the orientation metadata.
    pub fn rotation(&self) -> VideoRotation {
        self.orientation
            .map(SampleOrientation::to_rotation)
            .unwrap_or(VideoRotation::Rotation0)
    }

    /// Wrap a validated sample as a frame carrying the mapped rotation.
    pub fn into_frame(self) -> Result<VideoFrame, CaptureSourceError> {
        self.validate()?;
        let rotation = self.rotation();
        match self.buffer {
            Some(buffer) => Ok(VideoFrame::new(self.timestamp_ns, rotation, buffer)),
            None => Err(CaptureSourceError::InvalidFrame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::frame::PixelBuffer;

    fn buffer() -> Arc<dyn FrameBuffer> {
        Arc::new(PixelBuffer::from_vec(vec![0u8; 64], 4, 4, 16))
    }

    #[test]
    fn test_orientation_rotation_lookup() {
        let cases = [
            (SampleOrientation::Left, VideoRotation::Rotation90),
            (SampleOrientation::LeftMirrored, VideoRotation::Rotation90),
            (SampleOrientation::Down, VideoRotation::Rotation180),
            (SampleOrientation::DownMirrored, VideoRotation::Rotation180),
            (SampleOrientation::Right, VideoRotation::Rotation270),
            (SampleOrientation::RightMirrored, VideoRotation::Rotation270),
            (SampleOrientation::Up, VideoRotation::Rotation0),
            (SampleOrientation::UpMirrored, VideoRotation::Rotation0),
        ];
        for (orientation, rotation) in cases {
            assert_eq!(orientation.to_rotation(), rotation);
        }
    }

    #[test]
    fn test_valid_sample_becomes_frame() {
        let sample = RawSample::new(buffer(), 1_000).with_orientation(SampleOrientation::Right);
        let frame = sample.into_frame().unwrap();
        assert_eq!(frame.timestamp_ns, 1_000);
        assert_eq!(frame.rotation, VideoRotation::Rotation270);
        assert_eq!(frame.width(), 4);
    }

    #[test]
    fn test_zero_images_rejected() {
        let mut sample = RawSample::new(buffer(), 1_000);
        sample.image_count = 0;
        assert_eq!(sample.validate(), Err(CaptureSourceError::InvalidFrame));
    }

    #[test]
    fn test_unready_sample_rejected() {
        let mut sample = RawSample::new(buffer(), 1_000);
        sample.ready = false;
        assert_eq!(sample.validate(), Err(CaptureSourceError::InvalidFrame));
    }

    #[test]
    fn test_missing_or_empty_buffer_rejected() {
        let mut sample = RawSample::new(buffer(), 1_000);
        sample.buffer = None;
        assert_eq!(sample.validate(), Err(CaptureSourceError::InvalidFrame));

        let degenerate: Arc<dyn FrameBuffer> =
            Arc::new(PixelBuffer::from_vec(Vec::new(), 0, 0, 0));
        let sample = RawSample::new(degenerate, 1_000);
        assert_eq!(sample.validate(), Err(CaptureSourceError::InvalidFrame));
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let sample = RawSample::new(buffer(), -1);
        assert_eq!(sample.validate(), Err(CaptureSourceError::InvalidFrame));
    }
}
