//! Periodic capture ticks with cancellation and an optional deadline

use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Result of waiting for the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Fire(Instant),
    Deadline,
    Cancelled,
}

/// Fixed-period timer. The first tick fires one period after creation and
/// ticks that fall behind are skipped, never queued.
#[derive(Debug)]
pub struct Ticker {
    interval: Interval,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Ticker {
    pub fn new(period: Duration, cancel: CancellationToken) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            deadline: None,
            cancel,
        }
    }

    /// Stop firing once `window` has elapsed from now
    pub fn for_window(mut self, window: Duration) -> Self {
        self.deadline = Some(Instant::now() + window);
        self
    }

    /// Wait for the next tick. Cancellation wins over the deadline, which wins
    /// over a tick due at the same instant.
    pub async fn next(&mut self) -> Tick {
        let deadline = self.deadline;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Tick::Cancelled,
            _ = sleep_until(deadline) => Tick::Deadline,
            at = self.interval.tick() => Tick::Fire(at),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
