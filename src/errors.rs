use thiserror::Error;

/// Errors surfaced by capture sessions, the sampler and backend submissions.
///
/// Every variant is recoverable: the caller retries by re-invoking the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Camera permission was denied or no capture device is present
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// The surface had no valid frame geometry when sampled
    #[error("Camera not ready")]
    NotReady,
    /// Network or transport failure while submitting frames
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
    /// Structured error payload returned by the backend
    #[error("Backend rejected request: {0}")]
    BackendRejected(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Configuration error: {0}")]
    Config(String),
    /// A spawned capture task panicked or was aborted
    #[error("Task join error: {0}")]
    TaskFailed(String),
}

impl CaptureError {
    /// Message to show the user, without the category prefix.
    pub fn user_message(&self) -> &str {
        match self {
            CaptureError::DeviceUnavailable(msg)
            | CaptureError::SubmissionFailed(msg)
            | CaptureError::BackendRejected(msg)
            | CaptureError::Encoding(msg)
            | CaptureError::InvalidArgument(msg)
            | CaptureError::Config(msg)
            | CaptureError::TaskFailed(msg) => msg,
            CaptureError::NotReady => "Camera not ready",
        }
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(error: image::ImageError) -> Self {
        CaptureError::Encoding(error.to_string())
    }
}

impl From<tokio::task::JoinError> for CaptureError {
    fn from(error: tokio::task::JoinError) -> Self {
        CaptureError::TaskFailed(error.to_string())
    }
}

impl From<reqwest::Error> for CaptureError {
    fn from(error: reqwest::Error) -> Self {
        CaptureError::SubmissionFailed(error.to_string())
    }
}
