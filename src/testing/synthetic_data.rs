//! Synthetic camera frames
//!
//! Deterministic RGB content so sampler and workflow tests run without a
//! capture device. Frames differ per frame number, which keeps encoded
//! payloads distinguishable when checking capture order.

use image::RgbImage;

/// Create a synthetic RGB frame
///
/// A gradient that shifts with `frame_number`, with a bright centered ellipse
/// standing in for a face.
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> RgbImage {
    let base = (frame_number % 256) as u8;
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (rx, ry) = ((width as f32 / 5.0).max(1.0), (height as f32 / 3.0).max(1.0));

    RgbImage::from_fn(width, height, |x, y| {
        let dx = (x as f32 - cx) / rx;
        let dy = (y as f32 - cy) / ry;
        if dx * dx + dy * dy <= 1.0 {
            image::Rgb([224, 172u8.wrapping_add(base / 8), 140])
        } else {
            image::Rgb([
                base.wrapping_add((x % 256) as u8),
                base.wrapping_add((y % 256) as u8),
                base.wrapping_add(((x + y) % 256) as u8),
            ])
        }
    })
}

/// Typical webcam profile used by the mock camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebcamProfile {
    /// Resolution reported once the stream delivers frames
    pub resolution: (u32, u32),
    pub frame_rate: u32,
    pub device_name: &'static str,
}

impl WebcamProfile {
    /// Small 4:3 profile that keeps test encoding fast
    pub fn small() -> Self {
        Self {
            resolution: (64, 48),
            frame_rate: 30,
            device_name: "Synthetic Webcam",
        }
    }

    pub fn hd() -> Self {
        Self {
            resolution: (1280, 720),
            frame_rate: 30,
            device_name: "Synthetic HD Webcam",
        }
    }
}

impl Default for WebcamProfile {
    fn default() -> Self {
        Self::small()
    }
}
