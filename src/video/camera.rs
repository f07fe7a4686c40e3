//! Camera capture source
//!
//! The actual pixel capture lives behind the `CameraBackend` seam; this
//! module owns device/format selection, lifecycle, torch state and the
//! fan-out of validated frames to sinks.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::device::{MediaDevice, MediaDeviceType};
use super::format::{closest_format, CaptureFormat};
use super::frame::{VideoFrame, VideoRotation};
use super::sample::{RawSample, SampleHandler};
use super::source::{
    CaptureSourceObserver, VideoCaptureSource, VideoContentHint, VideoSink, VideoSource,
};
use crate::dispatch::EventDispatcher;
use crate::error::CaptureSourceError;
use crate::registry::ObserverSet;

/// A running camera capture session handle.
pub trait CameraSession: Send + Sync {
    /// Halt sample delivery. After this returns the handler is not invoked
    /// again.
    fn stop(&self);

    /// Best-effort torch control; returns whether the requested state was
    /// applied (false when the device has no light or the attempt failed).
    fn set_torch(&self, enabled: bool) -> bool;
}

/// The system camera facility boundary.
pub trait CameraBackend: Send + Sync {
    /// Enumerate capture devices. Called on demand, never cached here.
    fn list_devices(&self) -> Vec<MediaDevice>;

    /// Formats the device can capture.
    fn supported_formats(&self, device: &MediaDevice) -> Vec<CaptureFormat>;

    /// Open a capture session delivering samples to `handler`.
    fn open(
        &self,
        device: &MediaDevice,
        format: &CaptureFormat,
        handler: SampleHandler,
    ) -> Result<Box<dyn CameraSession>, CaptureSourceError>;
}

struct CameraInner {
    device: Option<MediaDevice>,
    format: CaptureFormat,
    torch_enabled: bool,
    session: Option<Box<dyn CameraSession>>,
}

/// Capture source producing frames from a camera device.
///
/// Device and format changes while running restart the underlying session
/// synchronously, preserving the torch state across the restart.
pub struct CameraCaptureSource {
    backend: Arc<dyn CameraBackend>,
    dispatcher: Arc<EventDispatcher>,
    sinks: Arc<ObserverSet<dyn VideoSink>>,
    observers: Arc<ObserverSet<dyn CaptureSourceObserver>>,
    inner: Mutex<CameraInner>,
}

impl CameraCaptureSource {
    /// Create a camera source preselecting the front camera when available.
    pub fn new(backend: Arc<dyn CameraBackend>, dispatcher: Arc<EventDispatcher>) -> Self {
        let devices = backend.list_devices();
        let device = devices
            .iter()
            .find(|d| d.device_type == MediaDeviceType::VideoFrontCamera)
            .or_else(|| devices.first())
            .cloned();

        Self {
            backend,
            dispatcher,
            sinks: Arc::new(ObserverSet::new()),
            observers: Arc::new(ObserverSet::new()),
            inner: Mutex::new(CameraInner {
                device,
                format: CaptureFormat::default(),
                torch_enabled: false,
                session: None,
            }),
        }
    }

    pub fn device(&self) -> Option<MediaDevice> {
        self.inner.lock().device.clone()
    }

    /// Select the capture device. When running, the session is restarted
    /// with the new device.
    pub fn set_device(&self, device: MediaDevice) {
        let mut inner = self.inner.lock();
        inner.device = Some(device);
        if inner.session.is_some() {
            self.restart_locked(&mut inner);
        }
    }

    pub fn format(&self) -> CaptureFormat {
        self.inner.lock().format
    }

    /// Select the capture format. When running, the session is restarted
    /// with the new format.
    pub fn set_format(&self, format: CaptureFormat) {
        let mut inner = self.inner.lock();
        inner.format = format;
        if inner.session.is_some() {
            self.restart_locked(&mut inner);
        }
    }

    pub fn torch_enabled(&self) -> bool {
        self.inner.lock().torch_enabled
    }

    /// Best-effort torch control; the state reverts to false when the
    /// current device has no light or the attempt fails.
    pub fn set_torch_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        self.apply_torch_locked(&mut inner, enabled);
    }

    /// Toggle between the front and back camera.
    pub fn switch_camera(&self) {
        let target = {
            let inner = self.inner.lock();
            match inner.device.as_ref().map(|d| d.device_type) {
                Some(MediaDeviceType::VideoFrontCamera) => MediaDeviceType::VideoBackCamera,
                _ => MediaDeviceType::VideoFrontCamera,
            }
        };
        match self
            .backend
            .list_devices()
            .into_iter()
            .find(|d| d.device_type == target)
        {
            Some(device) => self.set_device(device),
            None => warn!("No {:?} device available to switch to", target),
        }
    }

    fn start_locked(&self, inner: &mut CameraInner) {
        let device = match inner.device.clone() {
            Some(device) => device,
            None => {
                error!("Cannot start camera capture: no device selected");
                self.observers.notify(&self.dispatcher, |o| {
                    o.capture_did_fail(CaptureSourceError::ConfigurationFailure)
                });
                return;
            }
        };

        // Snap the requested format to the closest one the device supports.
        let supported = self.backend.supported_formats(&device);
        let format = closest_format(&supported, &inner.format).unwrap_or(inner.format);

        match self.backend.open(&device, &format, self.sample_handler()) {
            Ok(session) => {
                inner.session = Some(session);
                // Opening a session can reset the light; reapply the
                // requested torch state.
                let wanted = inner.torch_enabled;
                self.apply_torch_locked(inner, wanted);
                info!("Camera capture started on {} at {}", device, format);
                self.observers
                    .notify(&self.dispatcher, |o| o.capture_did_start());
            }
            Err(err) => {
                error!("Camera capture failed to start: {}", err);
                self.observers
                    .notify(&self.dispatcher, move |o| o.capture_did_fail(err));
            }
        }
    }

    fn stop_locked(&self, inner: &mut CameraInner) {
        if let Some(session) = inner.session.take() {
            session.stop();
        }
        info!("Camera capture stopped");
        self.observers
            .notify(&self.dispatcher, |o| o.capture_did_stop());
    }

    fn restart_locked(&self, inner: &mut CameraInner) {
        // Torch state read before teardown is reapplied by start_locked once
        // the new session runs.
        self.stop_locked(inner);
        self.start_locked(inner);
    }

    fn apply_torch_locked(&self, inner: &mut CameraInner, enabled: bool) {
        let applied = match inner.session.as_ref() {
            Some(session) => session.set_torch(enabled),
            None => false,
        };
        inner.torch_enabled = enabled && applied;
        if enabled && !applied {
            warn!("Torch not available on the current device");
        }
    }

    fn sample_handler(&self) -> SampleHandler {
        let sinks = Arc::clone(&self.sinks);
        let observers = Arc::clone(&self.observers);
        let dispatcher = Arc::clone(&self.dispatcher);
        Arc::new(move |sample: RawSample| {
            if let Err(err) = sample.validate() {
                warn!("Camera capture received an invalid sample");
                observers.notify(&dispatcher, move |o| o.capture_did_fail(err));
                return;
            }
            let timestamp_ns = sample.timestamp_ns;
            let buffer = match sample.buffer {
                Some(buffer) => buffer,
                None => return,
            };
            // The capture connection compensates for device orientation, so
            // camera frames always carry the identity rotation.
            let frame = VideoFrame::new(timestamp_ns, VideoRotation::Rotation0, buffer);
            for sink in sinks.snapshot() {
                sink.on_frame_received(&frame);
            }
        })
    }
}

impl VideoSource for CameraCaptureSource {
    fn content_hint(&self) -> VideoContentHint {
        VideoContentHint::None
    }

    fn add_sink(&self, sink: Arc<dyn VideoSink>) {
        self.sinks.add(sink);
    }

    fn remove_sink(&self, sink: &Arc<dyn VideoSink>) {
        self.sinks.remove(sink);
    }
}

impl VideoCaptureSource for CameraCaptureSource {
    fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.session.is_some() {
            debug!("Camera capture already running, ignoring start");
            return;
        }
        self.start_locked(&mut inner);
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.session.is_none() {
            return;
        }
        self.stop_locked(&mut inner);
    }

    fn add_capture_observer(&self, observer: Arc<dyn CaptureSourceObserver>) {
        self.observers.add(observer);
    }

    fn remove_capture_observer(&self, observer: &Arc<dyn CaptureSourceObserver>) {
        self.observers.remove(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::frame::PixelBuffer;
    use crate::testing::{RecordingObserver, RecordingSink};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeSession {
        stopped: Arc<AtomicBool>,
        torch_supported: bool,
    }

    impl CameraSession for FakeSession {
        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }

        fn set_torch(&self, _enabled: bool) -> bool {
            self.torch_supported
        }
    }

    struct FakeBackend {
        devices: Vec<MediaDevice>,
        torch_supported: bool,
        fail_open: AtomicBool,
        open_count: AtomicUsize,
        handler: Mutex<Option<SampleHandler>>,
        last_format: Mutex<Option<CaptureFormat>>,
        last_stopped: Mutex<Option<Arc<AtomicBool>>>,
    }

    impl FakeBackend {
        fn new(torch_supported: bool) -> Arc<Self> {
            Arc::new(Self {
                devices: vec![
                    MediaDevice::new("front", MediaDeviceType::VideoFrontCamera),
                    MediaDevice::new("back", MediaDeviceType::VideoBackCamera),
                ],
                torch_supported,
                fail_open: AtomicBool::new(false),
                open_count: AtomicUsize::new(0),
                handler: Mutex::new(None),
                last_format: Mutex::new(None),
                last_stopped: Mutex::new(None),
            })
        }

        fn push_sample(&self, sample: RawSample) {
            let handler = self.handler.lock().clone().expect("no open session");
            handler(sample);
        }
    }

    impl CameraBackend for FakeBackend {
        fn list_devices(&self) -> Vec<MediaDevice> {
            self.devices.clone()
        }

        fn supported_formats(&self, _device: &MediaDevice) -> Vec<CaptureFormat> {
            vec![
                CaptureFormat::new(640, 480, 30),
                CaptureFormat::new(1280, 720, 30),
            ]
        }

        fn open(
            &self,
            _device: &MediaDevice,
            format: &CaptureFormat,
            handler: SampleHandler,
        ) -> Result<Box<dyn CameraSession>, CaptureSourceError> {
            if self.fail_open.load(Ordering::SeqCst) {
                return Err(CaptureSourceError::ConfigurationFailure);
            }
            self.open_count.fetch_add(1, Ordering::SeqCst);
            *self.handler.lock() = Some(handler);
            *self.last_format.lock() = Some(*format);
            let stopped = Arc::new(AtomicBool::new(false));
            *self.last_stopped.lock() = Some(Arc::clone(&stopped));
            Ok(Box::new(FakeSession {
                stopped,
                torch_supported: self.torch_supported,
            }))
        }
    }

    fn sample(tag: u8) -> RawSample {
        RawSample::new(
            Arc::new(PixelBuffer::from_vec(vec![tag; 32], 4, 2, 16)),
            1_000,
        )
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), Arc::clone(&dispatcher));
        let observer = RecordingObserver::shared();
        source.add_capture_observer(observer.clone());

        source.start();
        source.start();
        dispatcher.flush().await;

        assert_eq!(backend.open_count.load(Ordering::SeqCst), 1);
        assert_eq!(observer.starts(), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), Arc::clone(&dispatcher));
        let observer = RecordingObserver::shared();
        source.add_capture_observer(observer.clone());

        source.start();
        source.stop();
        source.stop();
        dispatcher.flush().await;

        assert_eq!(observer.stops(), 1);
        let stopped = backend.last_stopped.lock().clone().unwrap();
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_frames_fan_out_to_sinks() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), dispatcher);
        let sink = RecordingSink::shared();
        let other = RecordingSink::shared();
        source.add_sink(sink.clone());
        source.add_sink(other.clone());

        source.start();
        backend.push_sample(sample(1));
        assert_eq!(sink.count(), 1);
        assert_eq!(other.count(), 1);

        let removable: Arc<dyn VideoSink> = other;
        source.remove_sink(&removable);
        backend.push_sample(sample(2));
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_sample_reports_and_capture_continues() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), Arc::clone(&dispatcher));
        let observer = RecordingObserver::shared();
        let sink = RecordingSink::shared();
        source.add_capture_observer(observer.clone());
        source.add_sink(sink.clone());

        source.start();
        let mut bad = sample(1);
        bad.image_count = 0;
        backend.push_sample(bad);
        dispatcher.flush().await;

        assert_eq!(sink.count(), 0);
        assert_eq!(observer.failures(), vec![CaptureSourceError::InvalidFrame]);

        // Still running: the next valid sample is processed normally.
        backend.push_sample(sample(2));
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn test_device_change_restarts_and_preserves_torch() {
        let backend = FakeBackend::new(true);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), dispatcher);

        source.start();
        source.set_torch_enabled(true);
        assert!(source.torch_enabled());

        source.set_device(MediaDevice::new("back", MediaDeviceType::VideoBackCamera));
        assert_eq!(backend.open_count.load(Ordering::SeqCst), 2);
        assert!(source.torch_enabled(), "torch survives the restart");
    }

    #[tokio::test]
    async fn test_torch_reverts_without_light() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend, dispatcher);

        source.start();
        source.set_torch_enabled(true);
        assert!(!source.torch_enabled());
    }

    #[tokio::test]
    async fn test_switch_camera_toggles_device() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend, dispatcher);
        assert_eq!(
            source.device().unwrap().device_type,
            MediaDeviceType::VideoFrontCamera
        );

        source.switch_camera();
        assert_eq!(
            source.device().unwrap().device_type,
            MediaDeviceType::VideoBackCamera
        );

        source.switch_camera();
        assert_eq!(
            source.device().unwrap().device_type,
            MediaDeviceType::VideoFrontCamera
        );
    }

    #[tokio::test]
    async fn test_open_failure_notifies_configuration_failure() {
        let backend = FakeBackend::new(false);
        backend.fail_open.store(true, Ordering::SeqCst);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), Arc::clone(&dispatcher));
        let observer = RecordingObserver::shared();
        source.add_capture_observer(observer.clone());

        source.start();
        dispatcher.flush().await;

        assert_eq!(observer.starts(), 0);
        assert_eq!(
            observer.failures(),
            vec![CaptureSourceError::ConfigurationFailure]
        );
    }

    #[tokio::test]
    async fn test_format_snaps_to_closest_supported() {
        let backend = FakeBackend::new(false);
        let dispatcher = EventDispatcher::new();
        let source = CameraCaptureSource::new(backend.clone(), dispatcher);

        source.set_format(CaptureFormat::new(600, 500, 15));
        source.start();
        assert_eq!(
            backend.last_format.lock().unwrap(),
            CaptureFormat::new(640, 480, 30)
        );
    }
}
