use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three capture workflows a controller can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    EnrollStream,
    RecognizeBurst,
    DetectSingle,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [
        JobKind::EnrollStream,
        JobKind::RecognizeBurst,
        JobKind::DetectSingle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::EnrollStream => "enroll",
            JobKind::RecognizeBurst => "recognize",
            JobKind::DetectSingle => "detect",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a capture job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// An encoded still frame ready for submission.
///
/// Payloads are immutable once produced; the JPEG bytes are reference counted so
/// clones handed to concurrent submissions share one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    jpeg: Bytes,
    width: u32,
    height: u32,
    offset_ms: u64,
    name: Option<String>,
}

impl FramePayload {
    pub fn new(jpeg: impl Into<Bytes>, width: u32, height: u32, offset_ms: u64) -> Self {
        Self {
            jpeg: jpeg.into(),
            width,
            height,
            offset_ms,
            name: None,
        }
    }

    /// Associate a person name with the frame (enrollment)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn jpeg(&self) -> &Bytes {
        &self.jpeg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Milliseconds between job start and the capture of this frame
    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Wire form expected by the backend: `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.jpeg))
    }
}

/// Enrollment progress published while an `EnrollStream` job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollProgress {
    pub accepted: u32,
    pub cap: u32,
    pub ready_to_finalize: bool,
}

impl EnrollProgress {
    pub fn new(cap: u32) -> Self {
        Self {
            accepted: 0,
            cap,
            ready_to_finalize: false,
        }
    }
}
