//! Partial job updates.

use sensia_core::job::{AnalysisJob, JobStatus};
use sensia_core::progress::ProgressInfo;

/// A partial update merged into a stored job record.
///
/// Constructed via [`JobUpdate::new`] and enriched with the builder
/// methods [`with_status`](JobUpdate::with_status),
/// [`with_progress`](JobUpdate::with_progress), and
/// [`with_result`](JobUpdate::with_result). Fields left `None` keep
/// their stored value.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<ProgressInfo>,
    pub result: Option<serde_json::Value>,
}

impl JobUpdate {
    /// An empty update. Applying it only refreshes `updated_at`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the job status.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the progress structure.
    pub fn with_progress(mut self, progress: ProgressInfo) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the result payload.
    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Merge this update into a job record and refresh its modification
    /// timestamp. Store implementations are expected to apply exactly
    /// these semantics.
    pub fn apply(&self, job: &mut AnalysisJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(progress) = &self.progress {
            job.progress = Some(progress.clone());
        }
        if let Some(result) = &self.result {
            job.result = Some(result.clone());
        }
        job.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensia_core::job::{AnalysisJob, AnalysisKind, JobParameters, TimeRange};
    use sensia_core::progress::ProgressInfo;

    fn job() -> AnalysisJob {
        let now = chrono::Utc::now();
        AnalysisJob::new(
            "sensor-1",
            "user-1",
            AnalysisKind::Trend,
            JobParameters {
                range: TimeRange {
                    start: now,
                    end: now,
                },
                engine_hint: None,
            },
        )
    }

    #[test]
    fn apply_merges_only_set_fields() {
        let mut job = job();
        let progress = ProgressInfo::for_kind(AnalysisKind::Trend);

        JobUpdate::new()
            .with_status(JobStatus::Processing)
            .with_progress(progress.clone())
            .apply(&mut job);

        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, Some(progress));
        assert!(job.result.is_none());
    }

    #[test]
    fn apply_refreshes_updated_at() {
        let mut job = job();
        let before = job.updated_at;

        JobUpdate::new().apply(&mut job);

        assert!(job.updated_at >= before);
        assert_eq!(job.status, JobStatus::Pending);
    }
}
