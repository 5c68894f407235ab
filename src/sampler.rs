//! Still-frame sampling from a live source
//!
//! The sampler copies the current frame into a buffer sized to the source's
//! native resolution and encodes it as JPEG. A source without geometry yields
//! `None`, which callers treat as a skipped tick.

use crate::errors::CaptureError;
use crate::timing::JobClock;
use crate::types::FramePayload;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};

/// Anything a frame can be grabbed from
pub trait FrameSource {
    /// Native geometry; a zero dimension means no frame is available yet
    fn video_size(&self) -> (u32, u32);

    fn current_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;
}

/// Default JPEG quality (0.9 in canvas terms)
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone)]
pub struct FrameSampler {
    quality: u8,
    clock: JobClock,
}

impl FrameSampler {
    pub fn new(quality: u8, clock: JobClock) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            clock,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Grab and encode the current frame of `source`
    pub fn capture<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Option<FramePayload>, CaptureError> {
        let (width, height) = source.video_size();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let Some(frame) = source.current_frame()? else {
            return Ok(None);
        };

        let offset_ms = self.clock.elapsed_ms();
        let canvas = if frame.dimensions() == (width, height) {
            frame
        } else {
            imageops::resize(&frame, width, height, imageops::FilterType::Triangle)
        };

        let jpeg = encode_jpeg(&canvas, self.quality)?;
        Ok(Some(FramePayload::new(jpeg, width, height, offset_ms)))
    }
}

/// Encode an RGB buffer as JPEG at the given quality
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::with_capacity((image.width() * image.height() / 4) as usize);
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image.write_with_encoder(encoder)?;
    Ok(buffer)
}
