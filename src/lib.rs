//! CrabFace: camera capture sessions for face enrollment and recognition clients
//!
//! This crate drives the camera side of a face-recognition client. It acquires
//! camera streams, samples still frames on a schedule, encodes them as JPEG and
//! submits them to a recognition backend, reporting status to the UI as it goes.
//!
//! # Workflows
//! - Enrollment stream: one frame every 300 ms, each submitted on its own,
//!   until 30 frames are accepted
//! - Recognition burst: frames every 180 ms for 3 seconds, submitted as one batch
//! - Detection: one frame after a short settle delay
//! - Training finalization once enough frames were enrolled
//!
//! # Usage
//! As a Tauri plugin (feature `tauri`):
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabface::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Or directly, with any [`session::CameraBackend`] and [`backend::FaceBackend`]:
//! ```rust,ignore
//! let controller = CaptureController::new(camera, backend, Arc::new(LogReporter), config);
//! let outcome = controller.run_recognition().await?;
//! ```
pub mod backend;
pub mod config;
pub mod errors;
pub mod invariant_ppt;
pub mod reporter;
pub mod sampler;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod timing;
pub mod types;

#[cfg(feature = "native")]
pub mod platform;

#[cfg(feature = "tauri")]
pub mod commands;

// Testing utilities - mock camera, mock backend, synthetic frames
pub mod testing;

// Re-exports for convenience
pub use backend::{FaceBackend, HttpBackend};
pub use config::CrabFaceConfig;
pub use errors::CaptureError;
pub use reporter::{LogReporter, StatusReporter};
pub use sampler::FrameSampler;
pub use scheduler::{
    CaptureController, DetectionOutcome, EnrollHandle, EnrollSummary, RecognitionOutcome,
};
pub use session::{CameraBackend, CameraStream, MediaSession};
pub use surface::{Surface, SurfaceIndicator};
pub use types::{EnrollProgress, FramePayload, JobKind, JobStatus};

#[cfg(feature = "native")]
pub use platform::NativeCamera;

#[cfg(feature = "tauri")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Initialize the CrabFace plugin with configuration from `crabface.toml`
/// and `CRABFACE__*` environment overrides
#[cfg(feature = "tauri")]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    init_with_config(CrabFaceConfig::load_or_default())
}

/// Initialize the CrabFace plugin with an explicit configuration
#[cfg(feature = "tauri")]
pub fn init_with_config<R: Runtime>(config: CrabFaceConfig) -> TauriPlugin<R> {
    Builder::new("crabface")
        .invoke_handler(tauri::generate_handler![
            // Capture workflows
            commands::capture::start_enrollment,
            commands::capture::stop_enrollment,
            commands::capture::get_enrollment_progress,
            commands::capture::finalize_training,
            commands::capture::recognize_face,
            commands::capture::detect_face,
            commands::capture::cancel_capture,
            // Configuration
            commands::config::get_config,
            commands::config::save_config,
            commands::config::reset_config,
            // Devices and info
            commands::init::get_available_cameras,
            commands::init::get_crate_info,
        ])
        .setup(move |app, _api| {
            let camera = std::sync::Arc::new(NativeCamera::new(config.camera.device_index));
            let backend = std::sync::Arc::new(HttpBackend::new(&config.backend)?);
            let reporter = std::sync::Arc::new(commands::TauriReporter::new(app.clone()));
            log::info!("CrabFace plugin using backend {}", config.backend.base_url);
            app.manage(commands::CrabFaceState::new(CaptureController::new(
                camera, backend, reporter, config,
            )));
            Ok(())
        })
        .build()
}

/// Initialize logging for the capture system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabface=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        native_camera: cfg!(feature = "native"),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Whether the crate was built with platform camera access
    pub native_camera: bool,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabface");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging();
        init_logging();
    }
}
