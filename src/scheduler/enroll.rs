//! Enrollment stream: per-tick capture, immediate per-frame submission

use super::job::{Interrupt, JobContext, JobLimit, SchedulerState};
use super::ticker::{Tick, Ticker};
use crate::backend::EnrollFrameResponse;
use crate::config::EnrollConfig;
use crate::errors::CaptureError;
use crate::types::{EnrollProgress, JobStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

/// Final state of an enrollment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollSummary {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub accepted: u32,
    /// Per-frame submissions issued
    pub submitted: u32,
    pub ready_to_finalize: bool,
}

pub(crate) async fn run(
    mut ctx: JobContext,
    name: String,
    config: EnrollConfig,
    progress: watch::Sender<EnrollProgress>,
) -> Result<EnrollSummary, CaptureError> {
    log::info!("Starting enrollment capture for '{}'", name);
    ctx.reporter.report_status("Starting capture. Hold still...");

    if let Err(interrupt) = ctx.start_session().await {
        return settle_interrupt(&mut ctx, interrupt, &progress);
    }
    ctx.transition(SchedulerState::Sampling);

    let mut ticker = Ticker::new(config.interval(), ctx.cancel.clone());
    let mut inflight: JoinSet<Result<EnrollFrameResponse, CaptureError>> = JoinSet::new();
    let mut submitted = 0u32;
    let mut state = *progress.borrow();

    let cancelled = loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break true,
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                if !accept_response(&ctx, joined, &mut state, &config) {
                    continue;
                }
                progress.send_replace(state);
                if matches!(ctx.job.limit(), JobLimit::AcceptedCount(cap) if state.accepted >= cap) {
                    break false;
                }
            }
            tick = ticker.next() => match tick {
                Tick::Fire(_) => {
                    match ctx.sampler.capture(&mut ctx.session) {
                        Ok(Some(frame)) => {
                            let frame = frame.with_name(name.clone());
                            let backend = ctx.backend.clone();
                            let name = name.clone();
                            submitted += 1;
                            inflight.spawn(async move {
                                backend.submit_enroll_frame(&name, &frame).await
                            });
                        }
                        Ok(None) => log::debug!("Surface not ready, skipping tick"),
                        Err(e) => log::warn!("Frame capture failed, skipping tick: {}", e),
                    }
                }
                Tick::Cancelled => break true,
                Tick::Deadline => break false,
            },
        }
    };

    // Responses still in flight no longer count
    inflight.abort_all();

    if cancelled {
        ctx.abort(Interrupt::Cancelled);
        ctx.reporter.report_status(&format!(
            "Capture stopped. {} images saved.",
            state.accepted
        ));
    } else {
        ctx.transition(SchedulerState::Finalizing);
        ctx.complete();
        ctx.reporter.report_status(&format!(
            "Capture complete. {} images saved. Click 'Finalize User & Train Model' to update the recognition model.",
            state.accepted
        ));
    }

    Ok(EnrollSummary {
        job_id: ctx.job.id(),
        status: ctx.job.status(),
        accepted: state.accepted,
        submitted,
        ready_to_finalize: state.ready_to_finalize,
    })
}

/// Apply one submission result to the progress. Returns whether the frame was accepted.
fn accept_response(
    ctx: &JobContext,
    joined: Result<Result<EnrollFrameResponse, CaptureError>, JoinError>,
    state: &mut EnrollProgress,
    config: &EnrollConfig,
) -> bool {
    let response = match joined {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            log::warn!("Capture error: {}", e);
            return false;
        }
        Err(e) => {
            log::warn!("Submission task ended abnormally: {}", e);
            return false;
        }
    };

    if !response.saved {
        log::debug!("Frame rejected by backend");
        return false;
    }

    state.accepted += 1;
    ctx.reporter.report_progress(state.accepted, state.cap);
    ctx.reporter
        .report_status(&format!("Captured {}/{}", state.accepted, state.cap));

    if !state.ready_to_finalize && state.accepted >= config.ready_threshold {
        log::info!(
            "{} frames accepted, training can be finalized",
            state.accepted
        );
        state.ready_to_finalize = true;
    }
    true
}

fn settle_interrupt(
    ctx: &mut JobContext,
    interrupt: Interrupt,
    progress: &watch::Sender<EnrollProgress>,
) -> Result<EnrollSummary, CaptureError> {
    if let Some(error) = ctx.abort(interrupt) {
        return Err(error);
    }
    let state = *progress.borrow();
    Ok(EnrollSummary {
        job_id: ctx.job.id(),
        status: ctx.job.status(),
        accepted: state.accepted,
        submitted: 0,
        ready_to_finalize: state.ready_to_finalize,
    })
}
