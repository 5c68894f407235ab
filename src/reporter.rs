//! UI reporting interface
//!
//! Workflows push status text, result images and enrollment progress through
//! [`StatusReporter`]. Hosts decide how to render them.

/// Narrow reporting interface consumed by the capture workflows
pub trait StatusReporter: Send + Sync {
    fn report_status(&self, text: &str);

    /// Image source: a URL or a `data:` URL
    fn report_image(&self, src: &str);

    fn report_progress(&self, count: u32, cap: u32);
}

/// Reporter that writes every report to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report_status(&self, text: &str) {
        log::info!("{}", text);
    }

    fn report_image(&self, src: &str) {
        if src.starts_with("data:") {
            log::info!("Result image received ({} bytes inline)", src.len());
        } else {
            log::info!("Result image: {}", src);
        }
    }

    fn report_progress(&self, count: u32, cap: u32) {
        log::debug!("Enrollment progress {}/{}", count, cap);
    }
}
