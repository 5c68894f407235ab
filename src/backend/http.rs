use super::{
    DetectionResponse, EnrollFrameResponse, FaceBackend, RecognitionResponse, TrainingResponse,
};
use crate::config::BackendConfig;
use crate::errors::CaptureError;
use crate::types::FramePayload;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// An `error` field wins even when detection fields are present
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectReply {
    Rejected(ErrorBody),
    Detection(DetectionResponse),
}

/// [`FaceBackend`] over the HTTP endpoints of the recognition server
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, CaptureError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| CaptureError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Parse a 2xx body, or turn a non-2xx reply into `SubmissionFailed`
    /// carrying the backend's `{error}` message when present.
    async fn parse_reply<T: DeserializeOwned>(response: Response) -> Result<T, CaptureError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| "Request failed".to_string());
        log::warn!("Backend returned HTTP {}: {}", status, message);
        Err(CaptureError::SubmissionFailed(message))
    }
}

#[async_trait]
impl FaceBackend for HttpBackend {
    async fn submit_enroll_frame(
        &self,
        name: &str,
        frame: &FramePayload,
    ) -> Result<EnrollFrameResponse, CaptureError> {
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .text("frame", frame.to_data_url());

        let response = self
            .client
            .post(self.endpoint(&self.config.enroll_frame_path))
            .multipart(form)
            .send()
            .await?;

        Self::parse_reply(response).await
    }

    async fn finalize_training(&self) -> Result<TrainingResponse, CaptureError> {
        let response = self
            .client
            .post(self.endpoint(&self.config.finalize_training_path))
            .send()
            .await?;

        // Training failures arrive as HTTP 500 with a structured body
        let status = response.status();
        let body = response.text().await?;
        serde_json::from_str::<TrainingResponse>(&body).map_err(|e| {
            CaptureError::SubmissionFailed(format!("Unexpected training reply ({}): {}", status, e))
        })
    }

    async fn recognize(
        &self,
        frames: &[FramePayload],
    ) -> Result<RecognitionResponse, CaptureError> {
        let body: Vec<String> = frames.iter().map(FramePayload::to_data_url).collect();
        log::debug!("Submitting burst of {} frames", body.len());

        let response = self
            .client
            .post(self.endpoint(&self.config.recognize_path))
            .json(&body)
            .send()
            .await?;

        Self::parse_reply(response).await
    }

    async fn detect(&self, frame: &FramePayload) -> Result<DetectionResponse, CaptureError> {
        let response = self
            .client
            .post(self.endpoint(&self.config.detect_path))
            .json(&serde_json::json!({ "frame": frame.to_data_url() }))
            .send()
            .await?;

        match Self::parse_reply::<DetectReply>(response).await? {
            DetectReply::Detection(detection) => Ok(detection),
            DetectReply::Rejected(body) => Err(CaptureError::BackendRejected(body.error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        let config = BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = backend("http://127.0.0.1:5000/");
        assert_eq!(
            backend.endpoint("/add_user_frame"),
            "http://127.0.0.1:5000/add_user_frame"
        );
        assert_eq!(
            backend.endpoint("recognize"),
            "http://127.0.0.1:5000/recognize"
        );
    }

    #[test]
    fn test_detect_reply_variants() {
        let reply: DetectReply =
            serde_json::from_str(r#"{"detected":true,"confidence":0.8}"#).unwrap();
        assert!(matches!(reply, DetectReply::Detection(d) if d.detected));

        let reply: DetectReply = serde_json::from_str(r#"{"error":"bad frame"}"#).unwrap();
        assert!(matches!(reply, DetectReply::Rejected(b) if b.error == "bad frame"));

        let reply: DetectReply =
            serde_json::from_str(r#"{"detected":false,"confidence":0.0,"error":"no face model"}"#)
                .unwrap();
        assert!(matches!(reply, DetectReply::Rejected(b) if b.error == "no face model"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_submission_failure() {
        let backend = backend("http://127.0.0.1:9");
        let frame = FramePayload::new(vec![0xFF, 0xD8], 1, 1, 0);
        let result = backend.detect(&frame).await;
        assert!(matches!(result, Err(CaptureError::SubmissionFailed(_))));
    }
}
