//! Single-frame face detection

use super::job::{Interrupt, JobContext, SchedulerState};
use crate::backend::DetectionResponse;
use crate::config::DetectConfig;
use crate::errors::CaptureError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Completed { response: DetectionResponse },
    /// The surface had no frame geometry after the settle delay
    NotReady,
    Cancelled,
}

pub(crate) async fn run(
    mut ctx: JobContext,
    config: DetectConfig,
) -> Result<DetectionOutcome, CaptureError> {
    ctx.reporter.report_status("Starting camera...");
    if let Err(interrupt) = ctx.start_session().await {
        return settle(&mut ctx, interrupt);
    }
    ctx.transition(SchedulerState::Sampling);

    if let Err(interrupt) = ctx.pause(config.settle()).await {
        return settle(&mut ctx, interrupt);
    }

    let captured = ctx.sampler.capture(&mut ctx.session);
    ctx.transition(SchedulerState::Finalizing);

    let frame = match captured {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            log::warn!("Detection surface has no frame geometry");
            ctx.reporter.report_status("Camera not ready");
            ctx.complete();
            return Ok(DetectionOutcome::NotReady);
        }
        Err(e) => {
            log::error!("Failed to capture detection frame: {}", e);
            ctx.reporter
                .report_status(&format!("Detection failed: {}", e.user_message()));
            return settle(&mut ctx, Interrupt::Failed(e));
        }
    };

    ctx.reporter.report_status("Detecting face...");
    let backend = ctx.backend.clone();
    let submitted = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        reply = backend.detect(&frame) => Some(reply),
    };

    match submitted {
        None => settle(&mut ctx, Interrupt::Cancelled),
        Some(Ok(response)) => {
            log::info!(
                "Detection finished: detected={} confidence={:.3}",
                response.detected,
                response.confidence
            );
            ctx.reporter.report_status(&response.status_text());
            if let Some(image) = response.image.as_deref().filter(|s| !s.is_empty()) {
                ctx.reporter.report_image(image);
            }
            ctx.complete();
            Ok(DetectionOutcome::Completed { response })
        }
        Some(Err(e)) => {
            let status = match &e {
                CaptureError::BackendRejected(msg) => format!("Error: {}", msg),
                other => format!("Detection failed: {}", other.user_message()),
            };
            log::warn!("{}", status);
            ctx.reporter.report_status(&status);
            settle(&mut ctx, Interrupt::Failed(e))
        }
    }
}

fn settle(ctx: &mut JobContext, interrupt: Interrupt) -> Result<DetectionOutcome, CaptureError> {
    match ctx.abort(interrupt) {
        Some(error) => Err(error),
        None => Ok(DetectionOutcome::Cancelled),
    }
}
