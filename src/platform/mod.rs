//! Platform camera access
//!
//! Native capture goes through nokhwa, which picks V4L2, AVFoundation or
//! MediaFoundation for the host.

pub mod native;

pub use native::{list_cameras, CameraDevice, NativeCamera};
