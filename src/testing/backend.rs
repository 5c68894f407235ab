//! Scripted face backend recording every submission

use crate::backend::{
    DetectionResponse, EnrollFrameResponse, FaceBackend, RecognitionResponse, TrainingResponse,
};
use crate::errors::CaptureError;
use crate::types::FramePayload;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct State {
    latency: Duration,
    enroll_script: VecDeque<Result<EnrollFrameResponse, CaptureError>>,
    enroll_default: Result<EnrollFrameResponse, CaptureError>,
    recognition: Result<RecognitionResponse, CaptureError>,
    detection: Result<DetectionResponse, CaptureError>,
    training: Result<TrainingResponse, CaptureError>,
    enroll_calls: Vec<(String, FramePayload)>,
    recognize_calls: Vec<Vec<FramePayload>>,
    detect_calls: Vec<FramePayload>,
    finalize_calls: u32,
}

/// Face backend double. Clones share the script and the recorded calls.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Accepts every enrollment frame; recognizes "Alice"; detects a face
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                latency: Duration::ZERO,
                enroll_script: VecDeque::new(),
                enroll_default: Ok(EnrollFrameResponse {
                    saved: true,
                    count: None,
                }),
                recognition: Ok(RecognitionResponse {
                    result: "Alice".to_string(),
                    similarity: 0.842,
                    reason: "match".to_string(),
                    image: None,
                    image_url: None,
                }),
                detection: Ok(DetectionResponse {
                    detected: true,
                    confidence: 0.97,
                    image: None,
                }),
                training: Ok(TrainingResponse::Success {
                    users: vec!["Alice".to_string()],
                }),
                enroll_calls: Vec::new(),
                recognize_calls: Vec::new(),
                detect_calls: Vec::new(),
                finalize_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delay every reply
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    /// Replies for the next enrollment submissions, in order
    pub fn with_enroll_replies(
        self,
        replies: impl IntoIterator<Item = Result<EnrollFrameResponse, CaptureError>>,
    ) -> Self {
        self.lock().enroll_script.extend(replies);
        self
    }

    /// Reply used once the enrollment script is exhausted
    pub fn with_enroll_default(self, reply: Result<EnrollFrameResponse, CaptureError>) -> Self {
        self.lock().enroll_default = reply;
        self
    }

    pub fn with_recognition(self, reply: Result<RecognitionResponse, CaptureError>) -> Self {
        self.lock().recognition = reply;
        self
    }

    pub fn with_detection(self, reply: Result<DetectionResponse, CaptureError>) -> Self {
        self.lock().detection = reply;
        self
    }

    pub fn with_training(self, reply: Result<TrainingResponse, CaptureError>) -> Self {
        self.lock().training = reply;
        self
    }

    pub fn enroll_submissions(&self) -> usize {
        self.lock().enroll_calls.len()
    }

    pub fn enroll_names(&self) -> Vec<String> {
        self.lock()
            .enroll_calls
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn recognize_batches(&self) -> Vec<Vec<FramePayload>> {
        self.lock().recognize_calls.clone()
    }

    pub fn detect_submissions(&self) -> usize {
        self.lock().detect_calls.len()
    }

    pub fn finalize_calls(&self) -> u32 {
        self.lock().finalize_calls
    }

    async fn delay(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl FaceBackend for MockBackend {
    async fn submit_enroll_frame(
        &self,
        name: &str,
        frame: &FramePayload,
    ) -> Result<EnrollFrameResponse, CaptureError> {
        let reply = {
            let mut state = self.lock();
            state.enroll_calls.push((name.to_string(), frame.clone()));
            match state.enroll_script.pop_front() {
                Some(reply) => reply,
                None => state.enroll_default.clone(),
            }
        };
        self.delay().await;
        reply
    }

    async fn finalize_training(&self) -> Result<TrainingResponse, CaptureError> {
        let reply = {
            let mut state = self.lock();
            state.finalize_calls += 1;
            state.training.clone()
        };
        self.delay().await;
        reply
    }

    async fn recognize(
        &self,
        frames: &[FramePayload],
    ) -> Result<RecognitionResponse, CaptureError> {
        let reply = {
            let mut state = self.lock();
            state.recognize_calls.push(frames.to_vec());
            state.recognition.clone()
        };
        self.delay().await;
        reply
    }

    async fn detect(&self, frame: &FramePayload) -> Result<DetectionResponse, CaptureError> {
        let reply = {
            let mut state = self.lock();
            state.detect_calls.push(frame.clone());
            state.detection.clone()
        };
        self.delay().await;
        reply
    }
}
