use crate::reporter::StatusReporter;
use std::sync::{Arc, Mutex, PoisonError};

/// One call made on a reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Status(String),
    Image(String),
    Progress(u32, u32),
}

/// Reporter keeping every report in order. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Image(src) => Some(src),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<(u32, u32)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Progress(count, cap) => Some((count, cap)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses().pop()
    }

    fn push(&self, event: ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl StatusReporter for RecordingReporter {
    fn report_status(&self, text: &str) {
        self.push(ReportEvent::Status(text.to_string()));
    }

    fn report_image(&self, src: &str) {
        self.push(ReportEvent::Image(src.to_string()));
    }

    fn report_progress(&self, count: u32, cap: u32) {
        self.push(ReportEvent::Progress(count, cap));
    }
}
