//! Video capture and frame distribution
//!
//! Capture sources produce frames from a camera or the screen and fan them
//! out to registered sinks; screen variants pace their output to a minimum
//! cadence.

pub mod broadcast;
pub mod camera;
pub mod device;
pub mod format;
pub mod frame;
pub mod pacing;
pub mod sample;
pub mod screen;
pub mod source;

pub use broadcast::BroadcastScreenCaptureSource;
pub use camera::{CameraBackend, CameraCaptureSource, CameraSession};
pub use device::{MediaDevice, MediaDeviceType};
pub use format::{closest_format, CaptureFormat};
pub use frame::{FrameBuffer, PixelBuffer, VideoFrame, VideoRotation};
pub use pacing::FramePacer;
pub use sample::{RawSample, SampleHandler, SampleOrientation};
pub use screen::{InAppScreenCaptureSource, ScreenRecorder};
pub use source::{
    CaptureSourceObserver, VideoCaptureSource, VideoContentHint, VideoSink, VideoSource,
};
