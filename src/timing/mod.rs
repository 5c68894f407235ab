//! Basic timing utilities for capture offsets
//!
//! Simple monotonic clock for stamping frames relative to job start.

use std::sync::Arc;
use tokio::time::Instant;

/// Monotonic clock for capture offsets
///
/// All frame offsets within a job derive from this single source
/// so they follow capture order. Built on tokio's clock so paused-time
/// tests observe exact offsets.
#[derive(Debug, Clone)]
pub struct JobClock {
    start: Arc<Instant>,
}

impl JobClock {
    /// Create a new clock with the current instant as time zero
    pub fn new() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Milliseconds elapsed since the clock started
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for JobClock {
    fn default() -> Self {
        Self::new()
    }
}
