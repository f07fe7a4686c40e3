//! framecast - video frame pipeline for conferencing clients
//!
//! This crate provides the frame production and distribution core of a
//! conferencing client: capture sources (camera, in-app screen, device-level
//! screen broadcast) fan frames out to sinks, screen sources pace their
//! output to a guaranteed minimum cadence, and a content-share session
//! arbitrates which single source is transmitted through the external
//! transport at any time.

pub mod contentshare;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod video;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CaptureSourceError, PipelineError, Result};
