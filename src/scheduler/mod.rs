//! Capture scheduling
//!
//! [`CaptureController`] runs the three capture workflows against one camera
//! backend and one face backend. Each workflow kind owns a display surface and a
//! slot: starting a kind again cancels the job already running in that slot and
//! waits for its teardown before a new stream is acquired.
//!
//! ```rust,ignore
//! let controller = CaptureController::new(camera, backend, reporter, config);
//! let enrollment = controller.start_enrollment("Alice").await?;
//! let summary = enrollment.wait().await?;
//! if summary.ready_to_finalize {
//!     controller.finalize_training().await?;
//! }
//! ```

mod detect;
mod enroll;
pub mod job;
mod recognize;
pub mod ticker;
mod training;

pub use detect::DetectionOutcome;
pub use enroll::EnrollSummary;
pub use job::{CaptureJob, JobLimit, SchedulerState};
pub use recognize::{result_image, RecognitionOutcome};
pub use ticker::{Tick, Ticker};

use crate::backend::FaceBackend;
use crate::config::CrabFaceConfig;
use crate::errors::CaptureError;
use crate::reporter::StatusReporter;
use crate::sampler::FrameSampler;
use crate::session::{CameraBackend, MediaSession};
use crate::surface::Surface;
use crate::timing::JobClock;
use crate::types::{EnrollProgress, JobKind};
use job::{JobContext, KindSlot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Surface identifiers, one per workflow
pub const ENROLL_SURFACE: &str = "addVideo";
pub const RECOGNIZE_SURFACE: &str = "videoRec";
pub const DETECT_SURFACE: &str = "videoDetect";

pub struct CaptureController {
    camera: Arc<dyn CameraBackend>,
    backend: Arc<dyn FaceBackend>,
    reporter: Arc<dyn StatusReporter>,
    config: CrabFaceConfig,
    enroll: Arc<KindSlot>,
    recognize: Arc<KindSlot>,
    detect: Arc<KindSlot>,
    training: tokio::sync::Mutex<()>,
}

impl CaptureController {
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        backend: Arc<dyn FaceBackend>,
        reporter: Arc<dyn StatusReporter>,
        config: CrabFaceConfig,
    ) -> Self {
        Self {
            camera,
            backend,
            reporter,
            config,
            enroll: Arc::new(KindSlot::new(Surface::new(ENROLL_SURFACE))),
            recognize: Arc::new(KindSlot::new(Surface::new(RECOGNIZE_SURFACE))),
            detect: Arc::new(KindSlot::new(Surface::new(DETECT_SURFACE))),
            training: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CrabFaceConfig {
        &self.config
    }

    /// Display surface of a workflow kind
    pub fn surface(&self, kind: JobKind) -> &Surface {
        &self.slot(kind).surface
    }

    /// Cancel the job currently running for `kind`. Returns false when none runs.
    pub fn cancel(&self, kind: JobKind) -> bool {
        self.slot(kind).cancel()
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.slot(kind).is_registered()
    }

    /// Start streaming enrollment frames for `name`.
    ///
    /// Returns once the previous enrollment (if any) has been torn down; the
    /// capture itself runs on a spawned task observed through the handle.
    pub async fn start_enrollment(&self, name: &str) -> Result<EnrollHandle, CaptureError> {
        let name = name.trim();
        if name.is_empty() {
            self.reporter.report_status("Enter a name first");
            return Err(CaptureError::InvalidArgument(
                "Enter a name first".to_string(),
            ));
        }

        let settings = self.config.enroll.clone();
        let ctx = self
            .prepare(
                CaptureJob::new(
                    JobKind::EnrollStream,
                    Some(settings.interval()),
                    JobLimit::AcceptedCount(settings.accepted_cap),
                ),
                &self.enroll,
            )
            .await;

        let job_id = ctx.job.id();
        let cancel = ctx.cancel.clone();
        let (progress_tx, progress_rx) = watch::channel(EnrollProgress::new(settings.accepted_cap));
        let task = tokio::spawn(enroll::run(ctx, name.to_string(), settings, progress_tx));

        Ok(EnrollHandle {
            job_id,
            progress: progress_rx,
            cancel,
            task,
        })
    }

    /// Stop the running enrollment, if any
    pub fn stop_enrollment(&self) -> bool {
        self.cancel(JobKind::EnrollStream)
    }

    /// Rebuild the recognition model from the enrolled frames
    pub async fn finalize_training(&self) -> Result<Vec<String>, CaptureError> {
        let _guard = self.training.try_lock().map_err(|_| {
            CaptureError::InvalidArgument("Training already in progress".to_string())
        })?;
        training::finalize(self.backend.as_ref(), self.reporter.as_ref()).await
    }

    /// Capture a burst of frames and submit them for recognition
    pub async fn run_recognition(&self) -> Result<RecognitionOutcome, CaptureError> {
        let settings = self.config.recognize.clone();
        let ctx = self
            .prepare(
                CaptureJob::new(
                    JobKind::RecognizeBurst,
                    Some(settings.interval()),
                    JobLimit::Window(settings.duration()),
                ),
                &self.recognize,
            )
            .await;
        recognize::run(ctx, settings).await
    }

    /// Capture one frame and submit it for face detection
    pub async fn run_detection(&self) -> Result<DetectionOutcome, CaptureError> {
        let ctx = self
            .prepare(
                CaptureJob::new(JobKind::DetectSingle, None, JobLimit::SingleShot),
                &self.detect,
            )
            .await;
        detect::run(ctx, self.config.detect.clone()).await
    }

    fn slot(&self, kind: JobKind) -> &Arc<KindSlot> {
        match kind {
            JobKind::EnrollStream => &self.enroll,
            JobKind::RecognizeBurst => &self.recognize,
            JobKind::DetectSingle => &self.detect,
        }
    }

    async fn prepare(&self, job: CaptureJob, slot: &Arc<KindSlot>) -> JobContext {
        log::info!("Starting {} job {}", job.kind(), job.id());
        let claim = slot.claim(job.id()).await;
        let sampler = FrameSampler::new(self.config.sampler.jpeg_quality, JobClock::new());
        JobContext::new(
            job,
            MediaSession::new(self.camera.clone()),
            slot.surface.clone(),
            sampler,
            self.backend.clone(),
            self.reporter.clone(),
            claim,
        )
    }
}

/// Handle to a running enrollment
#[derive(Debug)]
pub struct EnrollHandle {
    job_id: Uuid,
    progress: watch::Receiver<EnrollProgress>,
    cancel: CancellationToken,
    task: JoinHandle<Result<EnrollSummary, CaptureError>>,
}

impl EnrollHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Latest published progress
    pub fn progress(&self) -> EnrollProgress {
        *self.progress.borrow()
    }

    /// Receiver notified on every accepted frame
    pub fn subscribe(&self) -> watch::Receiver<EnrollProgress> {
        self.progress.clone()
    }

    pub fn ready_to_finalize(&self) -> bool {
        self.progress.borrow().ready_to_finalize
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the enrollment to complete or stop
    pub async fn wait(self) -> Result<EnrollSummary, CaptureError> {
        self.task.await?
    }
}
