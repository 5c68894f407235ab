use crate::scheduler::{CaptureController, DetectionOutcome, EnrollHandle, RecognitionOutcome};
use crate::types::{EnrollProgress, JobKind};
use std::sync::Arc;
use tauri::{command, State};
use tokio::sync::Mutex;

/// Managed plugin state
pub struct CrabFaceState {
    pub controller: Arc<CaptureController>,
    enrollment: Mutex<Option<EnrollHandle>>,
}

impl CrabFaceState {
    pub fn new(controller: CaptureController) -> Self {
        Self {
            controller: Arc::new(controller),
            enrollment: Mutex::new(None),
        }
    }
}

/// Start streaming enrollment frames for `name`. Returns the job id.
#[command]
pub async fn start_enrollment(
    name: String,
    state: State<'_, CrabFaceState>,
) -> Result<String, String> {
    log::info!("Enrollment requested for '{}'", name);
    let handle = state
        .controller
        .start_enrollment(&name)
        .await
        .map_err(|e| e.to_string())?;
    let job_id = handle.job_id().to_string();
    *state.enrollment.lock().await = Some(handle);
    Ok(job_id)
}

/// Stop the running enrollment
#[command]
pub async fn stop_enrollment(state: State<'_, CrabFaceState>) -> Result<bool, String> {
    Ok(state.controller.stop_enrollment())
}

/// Progress of the current (or last) enrollment
#[command]
pub async fn get_enrollment_progress(
    state: State<'_, CrabFaceState>,
) -> Result<Option<EnrollProgress>, String> {
    let enrollment = state.enrollment.lock().await;
    Ok(enrollment.as_ref().map(|handle| handle.progress()))
}

/// Rebuild the recognition model ("Finalize User & Train Model")
#[command]
pub async fn finalize_training(state: State<'_, CrabFaceState>) -> Result<Vec<String>, String> {
    state
        .controller
        .finalize_training()
        .await
        .map_err(|e| e.to_string())
}

/// Capture a frame burst and recognize the person in front of the camera
#[command]
pub async fn recognize_face(state: State<'_, CrabFaceState>) -> Result<RecognitionOutcome, String> {
    state
        .controller
        .run_recognition()
        .await
        .map_err(|e| e.to_string())
}

/// Capture one frame and check it for a face
#[command]
pub async fn detect_face(state: State<'_, CrabFaceState>) -> Result<DetectionOutcome, String> {
    state
        .controller
        .run_detection()
        .await
        .map_err(|e| e.to_string())
}

/// Cancel whatever runs for a workflow ("enroll", "recognize" or "detect")
#[command]
pub async fn cancel_capture(kind: String, state: State<'_, CrabFaceState>) -> Result<bool, String> {
    let kind = JobKind::ALL
        .into_iter()
        .find(|k| k.as_str() == kind)
        .ok_or_else(|| format!("Unknown capture kind: {}", kind))?;
    Ok(state.controller.cancel(kind))
}
