//! Configuration management for CrabFace
//!
//! Provides loading, saving and validation of backend endpoints, camera
//! selection, sampler quality and capture workflow timings.

use crate::errors::CaptureError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix for layered overrides, e.g. `CRABFACE__BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "CRABFACE";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrabFaceConfig {
    pub backend: BackendConfig,
    pub camera: CameraConfig,
    pub sampler: SamplerConfig,
    pub enroll: EnrollConfig,
    pub recognize: RecognizeConfig,
    pub detect: DetectConfig,
}

/// Recognition server endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the recognition server
    pub base_url: String,
    /// Per-frame enrollment endpoint (multipart `name`, `frame`)
    pub enroll_frame_path: String,
    /// Training finalization endpoint
    pub finalize_training_path: String,
    /// Burst recognition endpoint (JSON array of frames)
    pub recognize_path: String,
    /// Single-frame detection endpoint (JSON `{frame}`)
    pub detect_path: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

/// Camera selection for the native backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Platform device index
    pub device_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

/// Enrollment stream timings and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollConfig {
    /// Tick period in milliseconds
    pub interval_ms: u64,
    /// Accepted frames after which capture stops
    pub accepted_cap: u32,
    /// Accepted frames after which training may be finalized
    pub ready_threshold: u32,
}

/// Recognition burst timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizeConfig {
    pub interval_ms: u64,
    /// Length of the capture window in milliseconds
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Delay between stream start and the single capture
    pub settle_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            enroll_frame_path: "/add_user_frame".to_string(),
            finalize_training_path: "/rebuild_embeddings".to_string(),
            recognize_path: "/recognize".to_string(),
            detect_path: "/detect_face".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { device_index: 0 }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: crate::sampler::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 300,
            accepted_cap: 30,
            ready_threshold: 20,
        }
    }
}

impl Default for RecognizeConfig {
    fn default() -> Self {
        Self {
            interval_ms: 180,
            duration_ms: 3000,
        }
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self { settle_ms: 500 }
    }
}

impl EnrollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl RecognizeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Window length in seconds as shown to the user: `3`, `3.5`
    pub fn duration_secs(&self) -> String {
        (self.duration_ms as f64 / 1000.0).to_string()
    }
}

impl DetectConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl CrabFaceConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: CrabFaceConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from an optional TOML file with `CRABFACE__SECTION__KEY` environment overrides
    pub fn load_layered<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CaptureError::Config(format!("Failed to load settings: {}", e)))?;

        let loaded: CrabFaceConfig = settings
            .try_deserialize()
            .map_err(|e| CaptureError::Config(format!("Invalid settings: {}", e)))?;

        loaded.validate().map_err(CaptureError::Config)?;
        Ok(loaded)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabface.toml")
    }

    /// Load from default location (with env overrides) or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_layered(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.backend.base_url.is_empty() {
            return Err("Backend base URL must not be empty".to_string());
        }
        if self.backend.request_timeout_ms == 0 {
            return Err("Request timeout must be positive".to_string());
        }

        if self.sampler.jpeg_quality == 0 || self.sampler.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.enroll.interval_ms == 0 {
            return Err("Enrollment interval must be positive".to_string());
        }
        if self.enroll.accepted_cap == 0 {
            return Err("Enrollment cap must be positive".to_string());
        }
        if self.enroll.ready_threshold > self.enroll.accepted_cap {
            return Err("Ready threshold cannot exceed the enrollment cap".to_string());
        }

        if self.recognize.interval_ms == 0 {
            return Err("Recognition interval must be positive".to_string());
        }
        if self.recognize.duration_ms < self.recognize.interval_ms {
            return Err("Recognition window must cover at least one interval".to_string());
        }

        Ok(())
    }
}
