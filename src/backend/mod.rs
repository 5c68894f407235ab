//! Face backend contract
//!
//! The recognition/training service is an external collaborator. The scheduler
//! only depends on [`FaceBackend`]; [`HttpBackend`] speaks the HTTP endpoints.

pub mod http;

pub use http::HttpBackend;

use crate::errors::CaptureError;
use crate::types::FramePayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reply to a per-frame enrollment submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollFrameResponse {
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Reply to a training finalization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrainingResponse {
    Success {
        users: Vec<String>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

/// Reply to a burst recognition request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub similarity: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RecognitionResponse {
    /// Whether the backend matched a known person
    pub fn is_match(&self) -> bool {
        !self.result.is_empty() && self.result != "Unknown"
    }

    /// Status line shown to the user
    pub fn status_text(&self) -> String {
        if self.is_match() {
            format!(
                "Result: {} | Similarity: {:.3} | Reason: {}",
                self.result, self.similarity, self.reason
            )
        } else {
            let result = if self.result.is_empty() {
                "Unknown"
            } else {
                self.result.as_str()
            };
            format!("Result: {} | Reason: {}", result, self.reason)
        }
    }
}

/// Reply to a single-frame detection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub detected: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl DetectionResponse {
    pub fn status_text(&self) -> String {
        if self.detected {
            format!("Face detected! Confidence: {:.3}", self.confidence)
        } else {
            "No face detected".to_string()
        }
    }
}

/// Operations the capture workflows submit to
#[async_trait]
pub trait FaceBackend: Send + Sync {
    /// Submit one enrollment frame for `name`
    async fn submit_enroll_frame(
        &self,
        name: &str,
        frame: &FramePayload,
    ) -> Result<EnrollFrameResponse, CaptureError>;

    /// Rebuild the recognition model from enrolled frames
    async fn finalize_training(&self) -> Result<TrainingResponse, CaptureError>;

    /// Recognize a person from an ordered burst of frames
    async fn recognize(&self, frames: &[FramePayload])
        -> Result<RecognitionResponse, CaptureError>;

    /// Detect a face in a single frame. A structured `{error}` reply maps to
    /// `BackendRejected`.
    async fn detect(&self, frame: &FramePayload) -> Result<DetectionResponse, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_status_for_match() {
        let response: RecognitionResponse =
            serde_json::from_str(r#"{"result":"Alice","similarity":0.842,"reason":"match"}"#)
                .unwrap();
        assert_eq!(
            response.status_text(),
            "Result: Alice | Similarity: 0.842 | Reason: match"
        );
    }

    #[test]
    fn test_recognition_status_for_unknown() {
        let response: RecognitionResponse = serde_json::from_str(
            r#"{"result":"Unknown","label":"Unknown","similarity":0.41,"reason":"blocked_unknowns","image":null,"image_url":null}"#,
        )
        .unwrap();
        assert!(!response.is_match());
        assert_eq!(
            response.status_text(),
            "Result: Unknown | Reason: blocked_unknowns"
        );
    }

    #[test]
    fn test_training_response_tags() {
        let ok: TrainingResponse =
            serde_json::from_str(r#"{"status":"success","users":["Alice","Bob"]}"#).unwrap();
        assert_eq!(
            ok,
            TrainingResponse::Success {
                users: vec!["Alice".to_string(), "Bob".to_string()]
            }
        );

        let failed: TrainingResponse = serde_json::from_str(
            r#"{"status":"error","message":"Embedding build failed","details":"exit 1"}"#,
        )
        .unwrap();
        assert!(matches!(failed, TrainingResponse::Error { ref message, .. } if message == "Embedding build failed"));
    }

    #[test]
    fn test_detection_status() {
        let response = DetectionResponse {
            detected: true,
            confidence: 0.91234,
            image: None,
        };
        assert_eq!(response.status_text(), "Face detected! Confidence: 0.912");
        let none = DetectionResponse {
            detected: false,
            confidence: 0.0,
            image: None,
        };
        assert_eq!(none.status_text(), "No face detected");
    }
}
