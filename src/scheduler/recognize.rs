//! Recognition burst: buffer frames for a fixed window, submit them as one batch

use super::job::{Interrupt, JobContext, JobLimit, SchedulerState};
use super::ticker::{Tick, Ticker};
use crate::backend::RecognitionResponse;
use crate::config::RecognizeConfig;
use crate::errors::CaptureError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Completed {
        frames: usize,
        response: RecognitionResponse,
    },
    /// The window elapsed without a single usable frame
    NoFrames,
    Cancelled,
}

pub(crate) async fn run(
    mut ctx: JobContext,
    config: RecognizeConfig,
) -> Result<RecognitionOutcome, CaptureError> {
    ctx.reporter.report_status("Starting camera...");
    if let Err(interrupt) = ctx.start_session().await {
        return settle(&mut ctx, interrupt);
    }

    ctx.transition(SchedulerState::Sampling);
    ctx.reporter.report_status(&format!(
        "Capturing frames for {} seconds...",
        config.duration_secs()
    ));

    let mut ticker = Ticker::new(config.interval(), ctx.cancel.clone());
    if let JobLimit::Window(window) = ctx.job.limit() {
        ticker = ticker.for_window(window);
    }
    loop {
        match ticker.next().await {
            Tick::Fire(_) => match ctx.sampler.capture(&mut ctx.session) {
                Ok(Some(frame)) => {
                    log::debug!("Buffered frame at +{}ms", frame.offset_ms());
                    ctx.job.push_frame(frame);
                }
                Ok(None) => log::debug!("Surface not ready, skipping tick"),
                Err(e) => log::warn!("Frame capture failed, skipping tick: {}", e),
            },
            Tick::Deadline => break,
            Tick::Cancelled => return settle(&mut ctx, Interrupt::Cancelled),
        }
    }

    ctx.transition(SchedulerState::Finalizing);
    // The camera is released before the batch goes out
    ctx.session.stop();

    let frames = ctx.job.take_frames();
    if frames.is_empty() {
        log::warn!("Recognition window elapsed without frames");
        ctx.reporter.report_status("No frames captured");
        ctx.complete();
        return Ok(RecognitionOutcome::NoFrames);
    }

    log::info!("Submitting {} frames for recognition", frames.len());
    ctx.reporter.report_status("Processing...");

    let backend = ctx.backend.clone();
    let submitted = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        reply = backend.recognize(&frames) => Some(reply),
    };

    match submitted {
        None => settle(&mut ctx, Interrupt::Cancelled),
        Some(Ok(response)) => {
            ctx.reporter.report_status(&response.status_text());
            if let Some(src) = result_image(&response) {
                ctx.reporter.report_image(&src);
            }
            ctx.complete();
            Ok(RecognitionOutcome::Completed {
                frames: frames.len(),
                response,
            })
        }
        Some(Err(e)) => {
            log::error!("Recognition failed: {}", e);
            ctx.reporter.report_status("Recognition failed");
            Err(ctx.abort(Interrupt::Failed(e.clone())).unwrap_or(e))
        }
    }
}

/// Image to show for a recognition result: the URL with a cache buster when
/// present, otherwise the inline image.
pub fn result_image(response: &RecognitionResponse) -> Option<String> {
    match (&response.image_url, &response.image) {
        (Some(url), _) if !url.is_empty() => Some(format!(
            "{}?t={}",
            url,
            chrono::Utc::now().timestamp_millis()
        )),
        (_, Some(image)) if !image.is_empty() => Some(image.clone()),
        _ => None,
    }
}

fn settle(
    ctx: &mut JobContext,
    interrupt: Interrupt,
) -> Result<RecognitionOutcome, CaptureError> {
    match ctx.abort(interrupt) {
        Some(error) => Err(error),
        None => Ok(RecognitionOutcome::Cancelled),
    }
}
