use crate::reporter::StatusReporter;
use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime};

pub const STATUS_EVENT: &str = "crabface://status";
pub const IMAGE_EVENT: &str = "crabface://image";
pub const PROGRESS_EVENT: &str = "crabface://progress";

#[derive(Debug, Clone, Serialize)]
struct ProgressPayload {
    count: u32,
    cap: u32,
}

/// Forwards workflow reports to the webview as Tauri events
pub struct TauriReporter<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriReporter<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(e) = self.app.emit(event, payload) {
            log::warn!("Failed to emit {}: {}", event, e);
        }
    }
}

impl<R: Runtime> StatusReporter for TauriReporter<R> {
    fn report_status(&self, text: &str) {
        log::debug!("status: {}", text);
        self.emit(STATUS_EVENT, text.to_string());
    }

    fn report_image(&self, src: &str) {
        self.emit(IMAGE_EVENT, src.to_string());
    }

    fn report_progress(&self, count: u32, cap: u32) {
        self.emit(PROGRESS_EVENT, ProgressPayload { count, cap });
    }
}
