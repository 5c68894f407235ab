//! Testing utilities for CrabFace
//!
//! Hardware-free doubles for the camera, the face backend and the UI reporter,
//! plus synthetic frame data.

pub mod backend;
pub mod camera;
pub mod reporter;
pub mod synthetic_data;

pub use backend::MockBackend;
pub use camera::{CameraEvent, MockCamera, MockCameraMode, MockCameraStats};
pub use reporter::{RecordingReporter, ReportEvent};
pub use synthetic_data::{synthetic_video_frame, WebcamProfile};
