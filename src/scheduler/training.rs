//! Training finalization after enrollment

use crate::backend::{FaceBackend, TrainingResponse};
use crate::errors::CaptureError;
use crate::reporter::StatusReporter;

/// Ask the backend to rebuild its model. Returns the enrolled users on success.
pub(crate) async fn finalize(
    backend: &dyn FaceBackend,
    reporter: &dyn StatusReporter,
) -> Result<Vec<String>, CaptureError> {
    log::info!("Finalizing training");
    reporter.report_status("Training model... please wait");

    match backend.finalize_training().await {
        Ok(TrainingResponse::Success { users }) => {
            log::info!("Model rebuilt for {} users", users.len());
            reporter.report_status(&format!(
                "Model updated successfully\nUsers: {}",
                users.join(", ")
            ));
            Ok(users)
        }
        Ok(TrainingResponse::Error { message, details }) => {
            match &details {
                Some(details) => log::error!("Training failed: {} ({})", message, details),
                None => log::error!("Training failed: {}", message),
            }
            reporter.report_status(&format!("Training failed: {}", message));
            Err(CaptureError::BackendRejected(message))
        }
        Err(e) => {
            log::error!("Training request failed: {}", e);
            reporter.report_status(&format!("Server error: {}", e.user_message()));
            Err(e)
        }
    }
}
