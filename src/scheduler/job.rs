//! Capture jobs, the scheduler state machine and the per-job context

use crate::assert_invariant;
use crate::backend::FaceBackend;
use crate::errors::CaptureError;
use crate::reporter::StatusReporter;
use crate::sampler::FrameSampler;
use crate::session::MediaSession;
use crate::surface::Surface;
use crate::types::{FramePayload, JobKind, JobStatus};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Starting,
    Sampling,
    Finalizing,
    Failed,
    Cancelled,
}

impl SchedulerState {
    pub fn can_transition_to(self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Sampling)
                | (Starting, Failed)
                | (Starting, Cancelled)
                | (Sampling, Finalizing)
                | (Sampling, Cancelled)
                | (Finalizing, Idle)
                | (Finalizing, Failed)
                | (Finalizing, Cancelled)
                | (Failed, Idle)
                | (Cancelled, Idle)
        )
    }
}

/// Stop condition of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobLimit {
    /// Stop once this many frames were accepted by the backend
    AcceptedCount(u32),
    /// Stop once the capture window elapsed
    Window(Duration),
    SingleShot,
}

/// One invocation of a capture workflow
#[derive(Debug)]
pub struct CaptureJob {
    id: Uuid,
    kind: JobKind,
    interval: Option<Duration>,
    limit: JobLimit,
    frames: Vec<FramePayload>,
    status: JobStatus,
}

impl CaptureJob {
    pub fn new(kind: JobKind, interval: Option<Duration>, limit: JobLimit) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            interval,
            limit,
            frames: Vec::new(),
            status: JobStatus::Running,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn limit(&self) -> JobLimit {
        self.limit
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn frames(&self) -> &[FramePayload] {
        &self.frames
    }

    /// Append a captured frame; frames keep capture order
    pub fn push_frame(&mut self, frame: FramePayload) {
        assert_invariant!(
            self.status == JobStatus::Running,
            "Frames are only appended to running jobs",
            "CaptureJob::push_frame"
        );
        self.frames.push(frame);
    }

    /// Hand the accumulated frames over for submission
    pub fn take_frames(&mut self) -> Vec<FramePayload> {
        std::mem::take(&mut self.frames)
    }

    pub fn finish(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        log::info!("{} job {} finished: {:?}", self.kind, self.id, status);
        self.status = status;
    }
}

/// Registration of the job currently owning a kind's slot
pub(crate) struct KindSlot {
    pub surface: Surface,
    current: Mutex<Option<(Uuid, CancellationToken)>>,
    running: Arc<tokio::sync::Mutex<()>>,
}

impl KindSlot {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            current: Mutex::new(None),
            running: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Cancel the registered job, if any
    pub fn cancel(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some((id, token)) => {
                log::info!("Cancelling job {}", id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Register a new job, cancelling the previous one, then wait until the
    /// previous job finished its teardown.
    ///
    /// Dropping the returned future while it waits clears the registration.
    pub async fn claim(self: &Arc<Self>, id: Uuid) -> Claim {
        let token = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((previous, previous_token)) = current.replace((id, token.clone())) {
                log::info!("Job {} superseded by {}", previous, id);
                previous_token.cancel();
            }
        }
        let registration = Registration {
            slot: self.clone(),
            id,
        };

        let guard = self.running.clone().lock_owned().await;
        Claim {
            registration,
            token,
            _guard: guard,
        }
    }
}

/// A job id written into a slot. Dropping it clears the slot unless a newer
/// job has registered since.
struct Registration {
    slot: Arc<KindSlot>,
    id: Uuid,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut current = self
            .slot
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(current.as_ref(), Some((id, _)) if *id == self.id) {
            *current = None;
        }
    }
}

/// Exclusive right to run a job of one kind. Dropping it frees the slot.
pub(crate) struct Claim {
    registration: Registration,
    token: CancellationToken,
    _guard: OwnedMutexGuard<()>,
}

impl Claim {
    pub fn id(&self) -> Uuid {
        self.registration.id
    }
}

/// Why a job stopped before finishing its normal path
#[derive(Debug)]
pub(crate) enum Interrupt {
    Cancelled,
    Failed(CaptureError),
}

/// Everything one running job owns
pub(crate) struct JobContext {
    pub job: CaptureJob,
    pub session: MediaSession,
    pub surface: Surface,
    pub sampler: FrameSampler,
    pub backend: Arc<dyn FaceBackend>,
    pub reporter: Arc<dyn StatusReporter>,
    pub cancel: CancellationToken,
    state: SchedulerState,
    // Dropped last so the slot frees only after the stream is released
    _claim: Claim,
}

impl JobContext {
    pub fn new(
        job: CaptureJob,
        session: MediaSession,
        surface: Surface,
        sampler: FrameSampler,
        backend: Arc<dyn FaceBackend>,
        reporter: Arc<dyn StatusReporter>,
        claim: Claim,
    ) -> Self {
        assert_invariant!(
            claim.id() == job.id(),
            "A job runs under its own slot claim",
            "JobContext::new"
        );
        Self {
            job,
            session,
            surface,
            sampler,
            backend,
            reporter,
            cancel: claim.token.clone(),
            state: SchedulerState::Idle,
            _claim: claim,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn transition(&mut self, next: SchedulerState) {
        assert_invariant!(
            self.state.can_transition_to(next),
            "Capture job transitions follow the scheduler state machine",
            "JobContext::transition"
        );
        log::debug!(
            "{} job {}: {:?} -> {:?}",
            self.job.kind(),
            self.job.id(),
            self.state,
            next
        );
        self.state = next;
    }

    /// Idle -> Starting, then acquire the camera. Cancellation while the
    /// device is being acquired abandons the acquisition.
    pub async fn start_session(&mut self) -> Result<(), Interrupt> {
        self.transition(SchedulerState::Starting);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            started = self.session.start(&self.surface) => started.map_err(Interrupt::Failed),
        }
    }

    /// Wait for `duration` unless the job is cancelled first
    pub fn pause(&self, duration: Duration) -> impl Future<Output = Result<(), Interrupt>> + Send {
        let cancel = self.cancel.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                _ = tokio::time::sleep(duration) => Ok(()),
            }
        }
    }

    /// Single teardown routine: stop ticks, release the stream, surface off.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.session.stop();
    }

    /// Tear down and settle the job after an interrupt
    pub fn abort(&mut self, interrupt: Interrupt) -> Option<CaptureError> {
        self.teardown();
        match interrupt {
            Interrupt::Cancelled => {
                self.transition(SchedulerState::Cancelled);
                self.job.finish(JobStatus::Cancelled);
                self.transition(SchedulerState::Idle);
                None
            }
            Interrupt::Failed(error) => {
                if let CaptureError::DeviceUnavailable(_) = error {
                    self.reporter.report_status(&error.to_string());
                }
                self.transition(SchedulerState::Failed);
                self.job.finish(JobStatus::Failed);
                self.transition(SchedulerState::Idle);
                Some(error)
            }
        }
    }

    /// Finalizing -> Idle with the job completed
    pub fn complete(&mut self) {
        self.teardown();
        self.job.finish(JobStatus::Completed);
        self.transition(SchedulerState::Idle);
    }
}
