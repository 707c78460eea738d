//! Analysis job entity, status state machine, and request parameters.
//!
//! Jobs are created `Pending` by the request layer, transitioned
//! exclusively by the worker, and never deleted by this core.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::progress::ProgressInfo;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Analysis kind
// ---------------------------------------------------------------------------

/// The flavour of analysis a job performs. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Trend,
    Anomaly,
    Forecast,
}

impl AnalysisKind {
    /// Stable lowercase name, used in logs and step descriptions.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::Trend => "trend",
            AnalysisKind::Anomaly => "anomaly",
            AnalysisKind::Forecast => "forecast",
        }
    }
}

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

/// Lifecycle status of an analysis job.
///
/// `Pending` is initial; `Completed` and `Failed` are terminal. No
/// transition out of a terminal status is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Stable lowercase name, used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether no further transitions are allowed from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The set of statuses reachable from `self`.
    ///
    /// Terminal statuses return an empty slice.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[JobStatus::Processing],
            JobStatus::Processing => &[JobStatus::Completed, JobStatus::Failed],
            JobStatus::Completed | JobStatus::Failed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: JobStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a transition, returning a descriptive error for invalid ones.
    pub fn validate_transition(self, to: JobStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::Transition(format!(
                "{} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Inclusive time range over which readings are analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Rules:
    /// - `start` must not be after `end`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start > self.end {
            return Err(CoreError::Validation(
                "Time range start must not be after end".to_string(),
            ));
        }
        Ok(())
    }
}

/// User-supplied parameters for an analysis job.
///
/// Validated by the request layer before the job is enqueued; the worker
/// does not re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    pub range: TimeRange,
    /// Optional hint for selecting a specific engine implementation.
    pub engine_hint: Option<String>,
}

impl JobParameters {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.range.validate()
    }
}

// ---------------------------------------------------------------------------
// Job entity
// ---------------------------------------------------------------------------

/// One request to analyze a bounded time range of readings for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: JobId,
    /// Identifier of the data source being analyzed (e.g. a sensor).
    pub subject_id: String,
    /// Identifier of the owner.
    pub requester_id: String,
    pub kind: AnalysisKind,
    pub parameters: JobParameters,
    pub status: JobStatus,
    /// Absent until processing begins.
    pub progress: Option<ProgressInfo>,
    /// Present only when `status` is `Completed`.
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AnalysisJob {
    /// Create a new pending job with a fresh id.
    pub fn new(
        subject_id: impl Into<String>,
        requester_id: impl Into<String>,
        kind: AnalysisKind,
        parameters: JobParameters,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: JobId::new_v4(),
            subject_id: subject_id.into(),
            requester_id: requester_id.into(),
            kind,
            parameters,
            status: JobStatus::Pending,
            progress: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor readings
// ---------------------------------------------------------------------------

/// A single data point in a sensor time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub recorded_at: Timestamp,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn range(offset_secs: i64) -> TimeRange {
        let start = Utc::now();
        TimeRange {
            start,
            end: start + Duration::seconds(offset_secs),
        }
    }

    // -- state machine --------------------------------------------------------

    #[test]
    fn pending_transitions_only_to_processing() {
        assert_eq!(
            JobStatus::Pending.valid_transitions(),
            &[JobStatus::Processing]
        );
    }

    #[test]
    fn processing_transitions_to_terminal_states() {
        assert!(JobStatus::Processing.can_transition(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition(JobStatus::Failed));
        assert!(!JobStatus::Processing.can_transition(JobStatus::Pending));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(JobStatus::Completed.valid_transitions().is_empty());
        assert!(JobStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = JobStatus::Completed
            .validate_transition(JobStatus::Processing)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status transition: completed -> processing"
        );
    }

    // -- parameters -----------------------------------------------------------

    #[test]
    fn valid_time_range_accepted() {
        assert!(range(60).validate().is_ok());
    }

    #[test]
    fn inverted_time_range_rejected() {
        assert!(range(-60).validate().is_err());
    }

    #[test]
    fn zero_width_time_range_accepted() {
        assert!(range(0).validate().is_ok());
    }

    // -- entity ---------------------------------------------------------------

    #[test]
    fn new_job_starts_pending_without_progress() {
        let job = AnalysisJob::new(
            "sensor-1",
            "user-1",
            AnalysisKind::Trend,
            JobParameters {
                range: range(60),
                engine_hint: None,
            },
        );

        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.progress.is_none());
        assert!(job.result.is_none());
    }
}
