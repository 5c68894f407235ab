//! Contract-level tests: capture paths must exercise the invariants they rely on.
//!
//! Invariant checks are recorded per thread, so workflows here run on the
//! test's own current-thread runtime without spawning.

use crabface::invariant_ppt::{clear_invariant_log, contract_test};
use crabface::testing::{MockBackend, MockCamera, MockCameraMode, RecordingReporter};
use crabface::{CaptureController, CrabFaceConfig, RecognitionOutcome};
use std::sync::Arc;

fn controller() -> CaptureController {
    CaptureController::new(
        Arc::new(MockCamera::new(MockCameraMode::Available)),
        Arc::new(MockBackend::new()),
        Arc::new(RecordingReporter::new()),
        CrabFaceConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn recognition_burst_contract() {
    clear_invariant_log();

    let outcome = controller().run_recognition().await.unwrap();
    assert!(matches!(outcome, RecognitionOutcome::Completed { frames: 16, .. }));

    contract_test(
        "recognition burst",
        &[
            "A job runs under its own slot claim",
            "Session holds at most one live stream",
            "Capture job transitions follow the scheduler state machine",
            "Frames are only appended to running jobs",
        ],
    );
}

#[tokio::test(start_paused = true)]
async fn detection_contract() {
    clear_invariant_log();

    controller().run_detection().await.unwrap();

    contract_test(
        "detection",
        &[
            "A job runs under its own slot claim",
            "Session holds at most one live stream",
            "Capture job transitions follow the scheduler state machine",
        ],
    );
}
