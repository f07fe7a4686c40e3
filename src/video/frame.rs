//! Video frame data structures

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::sync::OnceLock;

/// Clockwise rotation to apply to a frame to compensate for sensor or
/// device orientation. Only the four canonical values are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoRotation {
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl VideoRotation {
    /// Rotation in clockwise degrees.
    pub fn degrees(&self) -> u32 {
        match self {
            VideoRotation::Rotation0 => 0,
            VideoRotation::Rotation90 => 90,
            VideoRotation::Rotation180 => 180,
            VideoRotation::Rotation270 => 270,
        }
    }
}

/// Opaque pixel payload handle.
///
/// Any type exposing dimensions and (via `as_any`) a system-specific image
/// representation can back a frame. Implementations must be safely shareable
/// across threads; a sink that needs a frame beyond one delivery call clones
/// the frame, which shares this handle.
pub trait FrameBuffer: Send + Sync {
    /// Frame width in pixels.
    fn width(&self) -> u32;
    /// Frame height in pixels.
    fn height(&self) -> u32;
    /// Downcast access to the concrete buffer type.
    fn as_any(&self) -> &dyn Any;
}

/// A frame buffer backed by raw pixel bytes.
pub struct PixelBuffer {
    data: Bytes,
    /// Cached xxHash64 of the pixel data (lazy computed for deduplication)
    hash: OnceLock<u64>,
    width: u32,
    height: u32,
    /// Stride (bytes per line)
    pub stride: u32,
}

impl PixelBuffer {
    pub fn new(data: Bytes, width: u32, height: u32, stride: u32) -> Self {
        Self {
            data,
            hash: OnceLock::new(),
            width,
            height,
            stride,
        }
    }

    /// Create a buffer from a `Vec<u8>`
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32, stride: u32) -> Self {
        Self::new(Bytes::from(data), width, height, stride)
    }

    /// Get pixel data as a byte slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get hash of the pixel data (computed once, cached).
    /// Used for fast payload-identity comparison.
    pub fn get_hash(&self) -> u64 {
        *self
            .hash
            .get_or_init(|| xxhash_rust::xxh64::xxh64(self.data.as_ref(), 0))
    }
}

impl FrameBuffer for PixelBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An immutable video frame.
///
/// Produced by a capture source and shared read-only with every sink for the
/// duration of one delivery call. Cloning is cheap; the pixel payload is
/// shared, not copied.
#[derive(Clone)]
pub struct VideoFrame {
    /// Capture timestamp in nanoseconds on a monotonic clock.
    pub timestamp_ns: i64,
    /// Rotation to apply when rendering or encoding.
    pub rotation: VideoRotation,
    buffer: Arc<dyn FrameBuffer>,
}

impl VideoFrame {
    pub fn new(timestamp_ns: i64, rotation: VideoRotation, buffer: Arc<dyn FrameBuffer>) -> Self {
        Self {
            timestamp_ns,
            rotation,
            buffer,
        }
    }

    /// Frame width in pixels, derived from the payload.
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Frame height in pixels, derived from the payload.
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// The shared pixel payload handle.
    pub fn buffer(&self) -> &Arc<dyn FrameBuffer> {
        &self.buffer
    }

    /// The same payload with a recomputed timestamp. Used when a frame is
    /// resent to keep the outgoing cadence.
    pub fn with_timestamp(&self, timestamp_ns: i64) -> Self {
        Self {
            timestamp_ns,
            rotation: self.rotation,
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("timestamp_ns", &self.timestamp_ns)
            .field("rotation", &self.rotation)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
