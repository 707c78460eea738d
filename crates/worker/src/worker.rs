//! The single-flight drain loop.
//!
//! One `Worker` per process. Callers enqueue job ids; the worker pops
//! them FIFO and runs one job at a time, re-entrancy guarded by a busy
//! flag rather than OS-level locking. Every per-job failure is absorbed
//! and recorded on that job; nothing thrown inside the loop can halt
//! the queue or crash the host process.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use sensia_core::job::{AnalysisJob, JobStatus, SensorReading};
use sensia_core::progress::ProgressInfo;
use sensia_core::types::JobId;
use sensia_engine::contract::AnalysisEngine;
use sensia_engine::phases::PhaseEvent;
use sensia_engine::projector::{PhaseProjector, Projection};
use sensia_store::job_store::JobStore;
use sensia_store::sensor_source::SensorDataSource;
use sensia_store::update::JobUpdate;

use crate::config::WorkerConfig;
use crate::error::{FailureReason, WorkerError};

/// First step index covered by the finishing cascade. The engine emits
/// no per-step granularity past the shared analysis step, so the worker
/// walks the remaining steps itself.
const CASCADE_START: usize = 3;

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Single-flight analysis job worker.
///
/// Owns its queue state explicitly; construct one per process and share
/// it by cloning (clones share the same queue).
#[derive(Clone)]
pub struct Worker {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn JobStore>,
    source: Arc<dyn SensorDataSource>,
    engine: Arc<dyn AnalysisEngine>,
    config: WorkerConfig,
    projector: PhaseProjector,
    queue: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<JobId>,
    /// True while a drain task is running. At most one drain task exists
    /// per worker at any time.
    busy: bool,
}

impl Worker {
    pub fn new(
        store: Arc<dyn JobStore>,
        source: Arc<dyn SensorDataSource>,
        engine: Arc<dyn AnalysisEngine>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                engine,
                config,
                projector: PhaseProjector,
                queue: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Add a job id to the pending queue.
    ///
    /// Idempotent: an id already queued is not duplicated. When the
    /// worker is idle this spawns the drain task immediately; otherwise
    /// the id is picked up after the current job finishes. Must be
    /// called from within a tokio runtime.
    pub async fn enqueue(&self, id: JobId) {
        let mut queue = self.inner.queue.lock().await;
        if queue.pending.contains(&id) {
            tracing::debug!(job_id = %id, "Job already queued; ignoring duplicate enqueue");
            return;
        }
        queue.pending.push_back(id);
        tracing::debug!(job_id = %id, queued = queue.pending.len(), "Job enqueued");

        if queue.busy {
            return;
        }
        queue.busy = true;
        drop(queue);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.drain().await });
    }

    /// Enqueue every job still `Pending` in the store.
    ///
    /// Intended to be called once at process start, to recover jobs that
    /// were created before a crash but never picked up. Returns how many
    /// jobs were enqueued.
    pub async fn recover_pending(&self) -> Result<usize, WorkerError> {
        let pending = self.inner.store.list_by_status(JobStatus::Pending).await?;
        let count = pending.len();
        for job in pending {
            self.enqueue(job.id).await;
        }
        if count > 0 {
            tracing::info!(count, "Recovered pending jobs");
        }
        Ok(count)
    }

    /// Number of ids waiting in the queue (excludes the job currently
    /// being processed).
    pub async fn queue_len(&self) -> usize {
        self.inner.queue.lock().await.pending.len()
    }

    /// Whether a drain task is currently running.
    pub async fn is_busy(&self) -> bool {
        self.inner.queue.lock().await.busy
    }
}

// ---------------------------------------------------------------------------
// Drain loop
// ---------------------------------------------------------------------------

impl Inner {
    /// Pop and process queued ids until the queue is empty, then clear
    /// the busy flag and stop. One failing job never blocks the next.
    async fn drain(self: Arc<Self>) {
        loop {
            let next = {
                let mut queue = self.queue.lock().await;
                match queue.pending.pop_front() {
                    Some(id) => id,
                    None => {
                        queue.busy = false;
                        return;
                    }
                }
            };

            if let Err(e) = self.process(next).await {
                // A store failure left the job in an unknown state; try
                // to record the failure, then move on to the next job.
                tracing::error!(job_id = %next, error = %e, "Job processing aborted");
                let update = JobUpdate::new().with_status(JobStatus::Failed);
                if let Err(e) = self.store.save(next, update).await {
                    tracing::error!(job_id = %next, error = %e, "Failed to record job failure");
                }
            }
        }
    }

    /// Run one job through fetch -> validate -> analyze -> persist.
    async fn process(&self, id: JobId) -> Result<(), WorkerError> {
        let Some(job) = self.store.load(id).await? else {
            tracing::warn!(job_id = %id, "Queued job no longer exists; skipping");
            return Ok(());
        };
        if job.status != JobStatus::Pending {
            // Terminal and in-flight jobs are a no-op; recover_pending
            // and enqueue can race a job that just finished.
            tracing::debug!(
                job_id = %id,
                status = job.status.as_str(),
                "Job is not pending; skipping",
            );
            return Ok(());
        }

        let update = JobUpdate::new().with_status(JobStatus::Processing);
        self.store.save(id, update).await?;
        tracing::info!(job_id = %id, kind = job.kind.as_str(), "Job processing started");

        let mut progress = ProgressInfo::for_kind(job.kind);
        let update = JobUpdate::new().with_progress(progress.clone());
        self.store.save(id, update).await?;

        let range = job.parameters.range;
        let readings = match self
            .source
            .fetch_range(&job.subject_id, range.start, range.end)
            .await
        {
            Ok(readings) => readings,
            Err(e) => {
                tracing::error!(
                    job_id = %id,
                    subject_id = %job.subject_id,
                    error = %e,
                    reason = FailureReason::Source.as_str(),
                    "Dataset fetch failed",
                );
                return self.finish_failed(id, &mut progress).await;
            }
        };

        if readings.is_empty() {
            tracing::warn!(
                job_id = %id,
                subject_id = %job.subject_id,
                reason = FailureReason::EmptyDataset.as_str(),
                "No readings in requested range",
            );
            return self.finish_failed(id, &mut progress).await;
        }

        self.run_engine(&job, readings, progress).await
    }

    /// Invoke the engine and project its phase stream into step
    /// transitions, persisting after each meaningful change.
    async fn run_engine(
        &self,
        job: &AnalysisJob,
        readings: Vec<SensorReading>,
        progress: ProgressInfo,
    ) -> Result<(), WorkerError> {
        let id = job.id;
        let (tx, rx) = mpsc::channel(self.config.phase_buffer);

        let engine_fut = self
            .engine
            .analyze(&readings, job.kind, &job.parameters, tx);
        let project_fut = self.pump_phases(id, progress, rx);

        let (outcome, mut progress) = tokio::join!(engine_fut, project_fut);

        match outcome {
            Ok(result) => {
                tracing::info!(job_id = %id, "Analysis completed");
                let update = JobUpdate::new()
                    .with_status(JobStatus::Completed)
                    .with_result(result)
                    .with_progress(progress);
                self.store.save(id, update).await?;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    job_id = %id,
                    error = %e,
                    reason = FailureReason::Engine.as_str(),
                    "Analysis engine failed",
                );
                self.finish_failed(id, &mut progress).await
            }
        }
    }

    /// Consume phase events until the engine drops its sender, folding
    /// each event into the progress value and returning the final state.
    async fn pump_phases(
        &self,
        id: JobId,
        mut progress: ProgressInfo,
        mut rx: mpsc::Receiver<PhaseEvent>,
    ) -> ProgressInfo {
        while let Some(event) = rx.recv().await {
            match self.projector.project(&mut progress, &event) {
                Projection::Unchanged => {}
                Projection::Updated => self.save_progress(id, &progress).await,
                Projection::EngineFinished => {
                    self.save_progress(id, &progress).await;
                    self.finishing_cascade(id, &mut progress).await;
                }
            }
        }
        progress
    }

    /// Walk the remaining steps after the engine reports completion:
    /// activate, persist, hold, complete, persist, hold — in order, so a
    /// polling client sees each final step transition individually.
    async fn finishing_cascade(&self, id: JobId, progress: &mut ProgressInfo) {
        for index in CASCADE_START..progress.total_steps {
            if progress.activate(index) {
                self.save_progress(id, progress).await;
                self.hold().await;
            }
            if progress.complete(index) {
                self.save_progress(id, progress).await;
                self.hold().await;
            }
        }
    }

    /// Mark the failed step, persist the terminal status, and stop. The
    /// job is never retried by this core.
    async fn finish_failed(
        &self,
        id: JobId,
        progress: &mut ProgressInfo,
    ) -> Result<(), WorkerError> {
        progress.fail_current();
        let update = JobUpdate::new()
            .with_status(JobStatus::Failed)
            .with_progress(progress.clone());
        self.store.save(id, update).await?;
        Ok(())
    }

    /// Persist an in-flight progress snapshot. Mid-flight persistence
    /// failures are logged and absorbed so the phase stream keeps
    /// draining; the terminal save still reports its own error.
    async fn save_progress(&self, id: JobId, progress: &ProgressInfo) {
        let update = JobUpdate::new().with_progress(progress.clone());
        if let Err(e) = self.store.save(id, update).await {
            tracing::error!(job_id = %id, error = %e, "Failed to persist progress");
        }
    }

    async fn hold(&self) {
        if !self.config.step_hold.is_zero() {
            tokio::time::sleep(self.config.step_hold).await;
        }
    }
}
