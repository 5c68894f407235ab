use crate::errors::CaptureError;
use crate::session::{CameraBackend, CameraStream};
use async_trait::async_trait;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Buffer, CallbackCamera,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// A capture device known to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub index: String,
    pub name: String,
    pub description: String,
}

/// List available cameras
pub fn list_cameras() -> Result<Vec<CameraDevice>, CaptureError> {
    let cameras = query(ApiBackend::Auto).map_err(|e| {
        CaptureError::DeviceUnavailable(format!("Failed to query cameras: {}", e))
    })?;

    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().to_string(),
            name: info.human_name(),
            description: info.description().to_string(),
        })
        .collect())
}

/// Camera backend opening a platform device by index
#[derive(Debug, Clone)]
pub struct NativeCamera {
    device_index: u32,
}

impl NativeCamera {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

#[async_trait]
impl CameraBackend for NativeCamera {
    async fn acquire(&self) -> Result<Box<dyn CameraStream>, CaptureError> {
        let device_index = self.device_index;
        // Opening a device blocks on the OS permission prompt
        let stream = tokio::task::spawn_blocking(move || NativeStream::open(device_index))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable(format!("Camera open task failed: {}", e)))??;
        Ok(Box::new(stream))
    }
}

/// Stream from a callback camera; the callback keeps only the latest buffer
struct NativeStream {
    camera: Arc<Mutex<CallbackCamera>>,
    latest: Arc<Mutex<Option<Buffer>>>,
    device_index: u32,
    open: bool,
}

// SAFETY: nokhwa's capture backend is not marked Send, but the camera is only
// reached through `camera`'s mutex and the stream is owned by one session.
unsafe impl Send for NativeStream {}

impl NativeStream {
    fn open(device_index: u32) -> Result<Self, CaptureError> {
        let latest: Arc<Mutex<Option<Buffer>>> = Arc::new(Mutex::new(None));
        let sink = latest.clone();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);

        let camera = CallbackCamera::new(CameraIndex::Index(device_index), requested, move |buffer| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(buffer);
        })
        .map_err(|e| {
            CaptureError::DeviceUnavailable(format!("Failed to open camera {}: {}", device_index, e))
        })?;

        log::info!("Opened camera {}", device_index);
        Ok(Self {
            camera: Arc::new(Mutex::new(camera)),
            latest,
            device_index,
            open: false,
        })
    }
}

impl CameraStream for NativeStream {
    fn play(&mut self) -> Result<(), CaptureError> {
        let mut camera = self.camera.lock().unwrap_or_else(PoisonError::into_inner);
        camera.open_stream().map_err(|e| {
            CaptureError::DeviceUnavailable(format!("Failed to start stream: {}", e))
        })?;
        self.open = true;
        Ok(())
    }

    fn video_size(&self) -> (u32, u32) {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|buffer| {
                let resolution = buffer.resolution();
                (resolution.width_x, resolution.height_y)
            })
            .unwrap_or((0, 0))
    }

    fn current_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let buffer = match self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(buffer) => buffer,
            None => return Ok(None),
        };

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Encoding(format!("Failed to decode frame: {}", e)))?;
        let (width, height) = (decoded.width(), decoded.height());
        Ok(RgbImage::from_raw(width, height, decoded.into_raw()))
    }

    fn stop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut camera = self.camera.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = camera.stop_stream() {
            log::warn!("Failed to stop camera {}: {}", self.device_index, e);
        } else {
            log::debug!("Stopped camera {}", self.device_index);
        }
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop();
    }
}
