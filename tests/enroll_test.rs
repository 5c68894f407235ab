//! Enrollment stream tests
//!
//! All tests run on a paused tokio clock so tick timing is exact.

use crabface::backend::EnrollFrameResponse;
use crabface::testing::{CameraEvent, MockBackend, MockCamera, MockCameraMode, RecordingReporter};
use crabface::{CaptureController, CaptureError, CrabFaceConfig, JobKind, JobStatus};
use std::sync::Arc;
use std::time::Duration;

const COMPLETE_STATUS: &str = "Capture complete. 30 images saved. Click 'Finalize User & Train Model' to update the recognition model.";

fn controller(
    camera: &MockCamera,
    backend: &MockBackend,
    reporter: &RecordingReporter,
) -> CaptureController {
    CaptureController::new(
        Arc::new(camera.clone()),
        Arc::new(backend.clone()),
        Arc::new(reporter.clone()),
        CrabFaceConfig::default(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// COMPLETION
// ═══════════════════════════════════════════════════════════════════════════

/// Every frame accepted: 30 submissions, completion at the cap
#[tokio::test(start_paused = true)]
async fn test_enrollment_completes_at_cap() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let handle = controller.start_enrollment("  Alice ").await.unwrap();
    let summary = handle.wait().await.unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.accepted, 30);
    assert_eq!(summary.submitted, 30);
    assert!(summary.ready_to_finalize);

    assert_eq!(backend.enroll_submissions(), 30);
    assert!(backend.enroll_names().iter().all(|name| name == "Alice"));

    let statuses = reporter.statuses();
    assert_eq!(statuses.first().map(String::as_str), Some("Starting capture. Hold still..."));
    assert!(statuses.contains(&"Captured 20/30".to_string()));
    assert_eq!(reporter.last_status().as_deref(), Some(COMPLETE_STATUS));

    let progress = reporter.progress();
    assert_eq!(progress.len(), 30);
    assert_eq!(progress.last(), Some(&(30, 30)));

    assert_eq!(camera.stats().stops(), 1);
    assert_eq!(camera.stats().live_streams(), 0);
    assert!(controller.surface(JobKind::EnrollStream).indicator().is_off());
    assert!(!controller.is_running(JobKind::EnrollStream));
}

/// The ready flag flips at 20 accepted frames while capture keeps going
#[tokio::test(start_paused = true)]
async fn test_ready_to_finalize_published_at_threshold() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let handle = controller.start_enrollment("Alice").await.unwrap();
    let mut progress = handle.subscribe();

    let at_threshold = *progress.wait_for(|p| p.accepted == 20).await.unwrap();
    assert!(at_threshold.ready_to_finalize);
    assert_eq!(at_threshold.cap, 30);
    assert!(!handle.is_finished());
    assert_eq!(camera.stats().live_streams(), 1);
    assert!(handle.ready_to_finalize());

    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.accepted, 30);
}

/// Rejected and failed submissions do not count and capture continues
#[tokio::test(start_paused = true)]
async fn test_rejected_frames_are_not_counted() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new().with_enroll_replies([
        Ok(EnrollFrameResponse {
            saved: false,
            count: None,
        }),
        Err(CaptureError::SubmissionFailed("Request failed".to_string())),
    ]);
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let summary = controller
        .start_enrollment("Alice")
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.accepted, 30);
    assert_eq!(summary.submitted, 32);
    assert_eq!(reporter.progress().first(), Some(&(1, 30)));
}

/// Ticks that find no frame geometry are skipped without a submission
#[tokio::test(start_paused = true)]
async fn test_warm_up_ticks_are_skipped() {
    let camera = MockCamera::new(MockCameraMode::WarmUp { polls: 2 });
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let start = tokio::time::Instant::now();
    let summary = controller
        .start_enrollment("Alice")
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.submitted, 30);
    // 2 empty ticks + 30 productive ones
    assert_eq!(start.elapsed(), Duration::from_millis(32 * 300));
}

/// Replies still in flight when the cap is reached are dropped
#[tokio::test(start_paused = true)]
async fn test_inflight_replies_dropped_at_cap() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new().with_latency(Duration::from_millis(1000));
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let summary = controller
        .start_enrollment("Alice")
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.accepted, 30);
    assert!(summary.submitted > 30, "submitted {}", summary.submitted);
    assert_eq!(summary.submitted as usize, backend.enroll_submissions());

    tokio::time::sleep(Duration::from_secs(5)).await;
    let progress = reporter.progress();
    assert_eq!(progress.len(), 30);
    assert!(progress.iter().all(|&(count, cap)| count <= 30 && cap == 30));
    assert_eq!(progress.last(), Some(&(30, 30)));
    assert_eq!(reporter.last_status().as_deref(), Some(COMPLETE_STATUS));
    assert_eq!(summary.submitted as usize, backend.enroll_submissions());
}

// ═══════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════

/// Explicit stop tears the session down and nothing is submitted afterwards
#[tokio::test(start_paused = true)]
async fn test_stop_enrollment_midway() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let handle = controller.start_enrollment("Alice").await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(controller.stop_enrollment());

    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Cancelled);
    assert_eq!(summary.accepted, 3);
    assert_eq!(
        reporter.last_status().as_deref(),
        Some("Capture stopped. 3 images saved.")
    );
    assert_eq!(camera.stats().live_streams(), 0);
    assert!(controller.surface(JobKind::EnrollStream).indicator().is_off());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.enroll_submissions(), 3);
    assert!(!controller.stop_enrollment());
}

/// Replies still in flight at a stop never count
#[tokio::test(start_paused = true)]
async fn test_inflight_replies_dropped_on_stop() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new().with_latency(Duration::from_millis(1000));
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let handle = controller.start_enrollment("Alice").await.unwrap();
    tokio::time::sleep(Duration::from_millis(2050)).await;
    assert!(controller.stop_enrollment());

    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Cancelled);
    assert!(summary.accepted < summary.submitted);
    assert_eq!(summary.submitted as usize, backend.enroll_submissions());
    assert_eq!(
        reporter.last_status(),
        Some(format!("Capture stopped. {} images saved.", summary.accepted))
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(reporter.progress().len(), summary.accepted as usize);
    assert_eq!(summary.submitted as usize, backend.enroll_submissions());
    assert_eq!(camera.stats().live_streams(), 0);
}

/// Cancelling through the handle while the camera is still being acquired
#[tokio::test(start_paused = true)]
async fn test_cancel_during_acquisition() {
    let camera =
        MockCamera::new(MockCameraMode::Available).with_acquire_delay(Duration::from_secs(2));
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let handle = controller.start_enrollment("Alice").await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.cancel();

    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Cancelled);
    assert_eq!(summary.submitted, 0);
    assert_eq!(camera.stats().acquires(), 0);
    assert!(controller.surface(JobKind::EnrollStream).indicator().is_off());
}

/// Starting a second enrollment stops the first stream before acquiring again
#[tokio::test(start_paused = true)]
async fn test_second_enrollment_supersedes_first() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let first = controller.start_enrollment("Alice").await.unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;

    let second = controller.start_enrollment("Bob").await.unwrap();
    assert_ne!(first.job_id(), second.job_id());

    let first_summary = first.wait().await.unwrap();
    assert_eq!(first_summary.status, JobStatus::Cancelled);
    assert_eq!(first_summary.accepted, 2);

    let second_summary = second.wait().await.unwrap();
    assert_eq!(second_summary.status, JobStatus::Completed);

    let events = camera.events();
    assert_eq!(
        &events[..3],
        &[
            CameraEvent::Acquired(1),
            CameraEvent::Stopped(1),
            CameraEvent::Acquired(2)
        ]
    );
    let names = backend.enroll_names();
    assert_eq!(names.iter().filter(|n| *n == "Alice").count(), 2);
    assert_eq!(names.iter().filter(|n| *n == "Bob").count(), 30);
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════

/// Blank names never reach the camera
#[tokio::test(start_paused = true)]
async fn test_blank_name_rejected() {
    let camera = MockCamera::new(MockCameraMode::Available);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let result = controller.start_enrollment("   ").await;
    assert_eq!(
        result.err(),
        Some(CaptureError::InvalidArgument("Enter a name first".to_string()))
    );
    assert_eq!(reporter.last_status().as_deref(), Some("Enter a name first"));
    assert_eq!(camera.stats().acquires(), 0);
}

/// Device denial fails the job with a user-facing status
#[tokio::test(start_paused = true)]
async fn test_camera_unavailable() {
    let camera = MockCamera::new(MockCameraMode::Unavailable);
    let backend = MockBackend::new();
    let reporter = RecordingReporter::new();
    let controller = controller(&camera, &backend, &reporter);

    let result = controller
        .start_enrollment("Alice")
        .await
        .unwrap()
        .wait()
        .await;

    assert!(matches!(result, Err(CaptureError::DeviceUnavailable(_))));
    assert_eq!(
        reporter.last_status().as_deref(),
        Some("Camera unavailable: Permission denied")
    );
    assert_eq!(backend.enroll_submissions(), 0);
    assert!(controller.surface(JobKind::EnrollStream).indicator().is_off());
}
