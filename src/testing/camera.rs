//! In-memory camera backend

use super::synthetic_data::{synthetic_video_frame, WebcamProfile};
use crate::errors::CaptureError;
use crate::session::{CameraBackend, CameraStream};
use async_trait::async_trait;
use image::RgbImage;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How the mock camera behaves when acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCameraMode {
    /// Streams deliver frames immediately
    Available,
    /// Acquisition fails as if permission was denied
    Unavailable,
    /// Streams never report a frame geometry
    ZeroGeometry,
    /// Streams report 0x0 for the first `polls` geometry queries
    WarmUp { polls: u32 },
}

/// Event recorded by the mock camera, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    Acquired(u32),
    Stopped(u32),
}

#[derive(Debug, Default)]
struct Counters {
    acquires: AtomicU32,
    stops: AtomicU32,
    frames: AtomicU64,
}

#[derive(Debug)]
struct Inner {
    mode: Mutex<MockCameraMode>,
    profile: WebcamProfile,
    acquire_delay: Duration,
    counters: Counters,
    events: Mutex<Vec<CameraEvent>>,
}

/// Camera backend handing out synthetic streams. Clones share state.
#[derive(Debug, Clone)]
pub struct MockCamera {
    inner: Arc<Inner>,
}

impl MockCamera {
    pub fn new(mode: MockCameraMode) -> Self {
        Self::with_profile(mode, WebcamProfile::default())
    }

    pub fn with_profile(mode: MockCameraMode, profile: WebcamProfile) -> Self {
        Self {
            inner: Arc::new(Inner {
                mode: Mutex::new(mode),
                profile,
                acquire_delay: Duration::ZERO,
                counters: Counters::default(),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Delay every acquisition, simulating a permission prompt
    pub fn with_acquire_delay(self, delay: Duration) -> Self {
        let inner = Inner {
            mode: Mutex::new(self.mode()),
            profile: self.inner.profile,
            acquire_delay: delay,
            counters: Counters::default(),
            events: Mutex::new(Vec::new()),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn mode(&self) -> MockCameraMode {
        *self.inner.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the behavior for subsequent acquisitions
    pub fn set_mode(&self, mode: MockCameraMode) {
        *self.inner.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn stats(&self) -> MockCameraStats {
        let counters = &self.inner.counters;
        MockCameraStats {
            acquires: counters.acquires.load(Ordering::SeqCst),
            stops: counters.stops.load(Ordering::SeqCst),
            frames: counters.frames.load(Ordering::SeqCst),
        }
    }

    pub fn events(&self) -> Vec<CameraEvent> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: CameraEvent) {
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Snapshot of the camera counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockCameraStats {
    acquires: u32,
    stops: u32,
    frames: u64,
}

impl MockCameraStats {
    pub fn acquires(&self) -> u32 {
        self.acquires
    }

    /// Streams explicitly stopped
    pub fn stops(&self) -> u32 {
        self.stops
    }

    /// Streams acquired and not yet stopped
    pub fn live_streams(&self) -> u32 {
        self.acquires - self.stops
    }

    /// Frames handed out across all streams
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[async_trait]
impl CameraBackend for MockCamera {
    async fn acquire(&self) -> Result<Box<dyn CameraStream>, CaptureError> {
        if !self.inner.acquire_delay.is_zero() {
            tokio::time::sleep(self.inner.acquire_delay).await;
        }

        let mode = self.mode();
        if mode == MockCameraMode::Unavailable {
            return Err(CaptureError::DeviceUnavailable(
                "Permission denied".to_string(),
            ));
        }

        let id = self.inner.counters.acquires.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(CameraEvent::Acquired(id));
        let warm_up = match mode {
            MockCameraMode::WarmUp { polls } => polls,
            _ => 0,
        };

        Ok(Box::new(MockStream {
            camera: self.clone(),
            id,
            mode,
            warm_up: AtomicU32::new(warm_up),
            playing: false,
            stopped: false,
        }))
    }
}

struct MockStream {
    camera: MockCamera,
    id: u32,
    mode: MockCameraMode,
    warm_up: AtomicU32,
    playing: bool,
    stopped: bool,
}

impl CameraStream for MockStream {
    fn play(&mut self) -> Result<(), CaptureError> {
        self.playing = true;
        Ok(())
    }

    fn video_size(&self) -> (u32, u32) {
        if !self.playing || self.stopped || self.mode == MockCameraMode::ZeroGeometry {
            return (0, 0);
        }
        let pending = self
            .warm_up
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending {
            return (0, 0);
        }
        self.camera.inner.profile.resolution
    }

    fn current_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        if !self.playing || self.stopped {
            return Ok(None);
        }
        let n = self
            .camera
            .inner
            .counters
            .frames
            .fetch_add(1, Ordering::SeqCst);
        let (width, height) = self.camera.inner.profile.resolution;
        Ok(Some(synthetic_video_frame(n, width, height)))
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.camera
            .inner
            .counters
            .stops
            .fetch_add(1, Ordering::SeqCst);
        self.camera.record(CameraEvent::Stopped(self.id));
    }
}
