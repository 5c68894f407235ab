//! Media sessions: exclusive ownership of one camera stream bound to a surface

use crate::assert_invariant;
use crate::errors::CaptureError;
use crate::sampler::FrameSource;
use crate::surface::{Surface, SurfaceIndicator};
use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of camera streams (platform camera, mock camera, ...)
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Request a video capture stream. Fails with `DeviceUnavailable` when the
    /// platform denies access or has no camera.
    async fn acquire(&self) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// A live device stream. Dropping a stream without calling `stop` leaks the device
/// on some platforms, so sessions always stop streams explicitly.
pub trait CameraStream: Send {
    /// Start playback
    fn play(&mut self) -> Result<(), CaptureError>;

    /// Native frame geometry; `(0, 0)` until the first frame arrives
    fn video_size(&self) -> (u32, u32);

    /// Most recent decoded frame, if any
    fn current_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;

    /// Stop all tracks of the stream
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Acquiring,
    Active,
    Stopped,
}

pub struct MediaSession {
    camera: Arc<dyn CameraBackend>,
    surface: Option<Surface>,
    stream: Option<Box<dyn CameraStream>>,
    state: SessionState,
}

impl MediaSession {
    pub fn new(camera: Arc<dyn CameraBackend>) -> Self {
        Self {
            camera,
            surface: None,
            stream: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Acquire a stream and bind it to `surface`. Any stream already held is
    /// released first.
    pub async fn start(&mut self, surface: &Surface) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            log::debug!("Releasing previous stream before starting a new one");
            self.stop();
        }

        self.state = SessionState::Acquiring;
        surface.set_indicator(SurfaceIndicator::Waiting);
        self.surface = Some(surface.clone());

        let mut stream = match self.camera.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Failed to acquire camera for {}: {}", surface.id(), e);
                self.mark_stopped();
                return Err(e);
            }
        };

        if let Err(e) = stream.play() {
            log::error!("Failed to start playback on {}: {}", surface.id(), e);
            stream.stop();
            self.mark_stopped();
            return Err(e);
        }

        assert_invariant!(
            self.stream.is_none(),
            "Session holds at most one live stream",
            "MediaSession::start"
        );
        self.stream = Some(stream);
        self.state = SessionState::Active;
        surface.set_indicator(SurfaceIndicator::Live);
        log::info!("Camera session active on {}", surface.id());
        Ok(())
    }

    /// Release the stream. Safe to call repeatedly and when nothing was started.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            if let Some(surface) = &self.surface {
                log::info!("Camera session stopped on {}", surface.id());
            }
        }
        if self.state != SessionState::Idle || self.surface.is_some() {
            self.mark_stopped();
        }
    }

    fn mark_stopped(&mut self) {
        self.state = SessionState::Stopped;
        if let Some(surface) = self.surface.take() {
            surface.set_indicator(SurfaceIndicator::Off);
        }
    }
}

impl FrameSource for MediaSession {
    fn video_size(&self) -> (u32, u32) {
        self.stream
            .as_ref()
            .map(|stream| stream.video_size())
            .unwrap_or((0, 0))
    }

    fn current_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        match self.stream.as_mut() {
            Some(stream) => stream.current_frame(),
            None => Ok(None),
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.stop();
    }
}
