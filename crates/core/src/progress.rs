//! Step-by-step progress model for analysis jobs.
//!
//! Every job gets a fixed step template for its analysis kind. The worker
//! owns the `ProgressInfo` value while the job is in flight and persists
//! it after every meaningful transition, so pollers observe monotonic
//! progress. Steps only ever move forward: `pending -> active ->
//! {completed, failed}`; `current_step` never regresses.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::job::AnalysisKind;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Step descriptions
// ---------------------------------------------------------------------------

/// Shared prefix steps, present for every analysis kind (indices 0-2).
const SHARED_STEPS: [(&str, StepRole); 3] = [
    ("data preparation", StepRole::Preparation),
    ("data validation", StepRole::Validation),
    ("data analysis", StepRole::Analysis),
];

const TREND_STEPS: [(&str, StepRole); 2] = [
    ("trend detection", StepRole::Detection),
    ("finalize trend analysis", StepRole::Finalize),
];

const ANOMALY_STEPS: [(&str, StepRole); 2] = [
    ("anomaly detection", StepRole::Detection),
    ("finalize anomaly analysis", StepRole::Finalize),
];

const FORECAST_STEPS: [(&str, StepRole); 3] = [
    ("model training", StepRole::Detection),
    ("forecast computation", StepRole::Computation),
    ("finalize forecast analysis", StepRole::Finalize),
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Status of a single progress step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl StepStatus {
    /// Whether the step can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// Semantic tag for a step, computed once when the template is built.
///
/// Phase projection locates steps by role instead of re-deriving the
/// target from description text on every callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    Preparation,
    Validation,
    Analysis,
    /// The kind-specific detection/training step (index 3 for every kind).
    Detection,
    /// Forecast-only computation step between detection and finalize.
    Computation,
    Finalize,
}

/// One named phase of a job's progress, with its own status and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub index: usize,
    pub description: String,
    pub role: StepRole,
    pub status: StepStatus,
    /// Set the instant the step becomes active.
    pub started_at: Option<Timestamp>,
    /// Set together with `duration_ms` when the step completes or fails.
    pub ended_at: Option<Timestamp>,
    /// `ended_at - started_at`; absent when the step never started.
    pub duration_ms: Option<i64>,
}

/// Ordered step progress for one job. Insertion order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub total_steps: usize,
    /// Index of the step a poller should treat as next to watch.
    /// Monotonically non-decreasing while the job is processing.
    pub current_step: usize,
    pub steps: Vec<ProgressStep>,
}

// ---------------------------------------------------------------------------
// Template construction
// ---------------------------------------------------------------------------

impl ProgressInfo {
    /// Build the fixed step template for an analysis kind.
    ///
    /// All steps start `Pending`. The template is deterministic: same
    /// kind, same steps, same order, every time.
    pub fn for_kind(kind: AnalysisKind) -> Self {
        let specific: &[(&str, StepRole)] = match kind {
            AnalysisKind::Trend => &TREND_STEPS,
            AnalysisKind::Anomaly => &ANOMALY_STEPS,
            AnalysisKind::Forecast => &FORECAST_STEPS,
        };

        let steps: Vec<ProgressStep> = SHARED_STEPS
            .iter()
            .chain(specific.iter())
            .enumerate()
            .map(|(index, (description, role))| ProgressStep {
                index,
                description: (*description).to_string(),
                role: *role,
                status: StepStatus::Pending,
                started_at: None,
                ended_at: None,
                duration_ms: None,
            })
            .collect();

        Self {
            total_steps: steps.len(),
            current_step: 0,
            steps,
        }
    }

    /// Index of the first step tagged with `role`, if the template has one.
    pub fn step_with_role(&self, role: StepRole) -> Option<usize> {
        self.steps.iter().position(|s| s.role == role)
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

impl ProgressInfo {
    /// Mark the step at `index` active.
    ///
    /// Every earlier step still pending or active is completed first,
    /// preserving the at-most-one-active invariant (and advancing
    /// `current_step` through those completions). No-op when the step is
    /// already active, already terminal, or out of range. Returns whether
    /// anything changed.
    pub fn activate(&mut self, index: usize) -> bool {
        let Some(step) = self.steps.get(index) else {
            return false;
        };
        if step.status != StepStatus::Pending {
            return false;
        }

        let now = Utc::now();
        for earlier in &mut self.steps[..index] {
            if !earlier.status.is_terminal() {
                finish(earlier, StepStatus::Completed, now);
            }
        }
        self.advance();

        let step = &mut self.steps[index];
        step.status = StepStatus::Active;
        step.started_at = Some(now);
        true
    }

    /// Mark the step at `index` completed and advance `current_step` to
    /// the next still-pending step. No-op when the step is already
    /// terminal or out of range. Returns whether anything changed.
    pub fn complete(&mut self, index: usize) -> bool {
        let Some(step) = self.steps.get_mut(index) else {
            return false;
        };
        if step.status.is_terminal() {
            return false;
        }

        finish(step, StepStatus::Completed, Utc::now());
        self.advance();
        true
    }

    /// Mark the step at `index` failed. `current_step` is not advanced;
    /// a failed step is where progress stops. Returns whether anything
    /// changed.
    pub fn fail(&mut self, index: usize) -> bool {
        let Some(step) = self.steps.get_mut(index) else {
            return false;
        };
        if step.status.is_terminal() {
            return false;
        }
        finish(step, StepStatus::Failed, Utc::now());
        true
    }

    /// Fail the currently active step, falling back to the step at
    /// `current_step` when nothing is active yet (e.g. the dataset came
    /// back empty before any phase event arrived).
    pub fn fail_current(&mut self) -> bool {
        let index = self
            .steps
            .iter()
            .position(|s| s.status == StepStatus::Active)
            .unwrap_or(self.current_step);
        self.fail(index)
    }

    /// Move `current_step` forward to the first still-pending step, or
    /// hold it at the last index once nothing is pending. Never moves
    /// backward.
    fn advance(&mut self) {
        let next = self
            .steps
            .iter()
            .position(|s| s.status == StepStatus::Pending)
            .unwrap_or(self.total_steps.saturating_sub(1));
        if next > self.current_step {
            self.current_step = next;
        }
    }
}

/// Stamp a terminal status onto a step: end time always, duration only
/// when the step actually started.
fn finish(step: &mut ProgressStep, status: StepStatus, now: Timestamp) {
    step.status = status;
    step.ended_at = Some(now);
    step.duration_ms = step.started_at.map(|start| (now - start).num_milliseconds());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- templates ------------------------------------------------------------

    #[test]
    fn forecast_template_is_deterministic() {
        let progress = ProgressInfo::for_kind(AnalysisKind::Forecast);

        assert_eq!(progress.total_steps, 6);
        assert_eq!(progress.current_step, 0);
        let descriptions: Vec<&str> = progress
            .steps
            .iter()
            .map(|s| s.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            [
                "data preparation",
                "data validation",
                "data analysis",
                "model training",
                "forecast computation",
                "finalize forecast analysis",
            ]
        );
        assert!(progress.steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[test]
    fn trend_and_anomaly_templates_have_five_steps() {
        assert_eq!(ProgressInfo::for_kind(AnalysisKind::Trend).total_steps, 5);
        assert_eq!(ProgressInfo::for_kind(AnalysisKind::Anomaly).total_steps, 5);
    }

    #[test]
    fn detection_role_tags_index_three_for_every_kind() {
        for kind in [
            AnalysisKind::Trend,
            AnalysisKind::Anomaly,
            AnalysisKind::Forecast,
        ] {
            let progress = ProgressInfo::for_kind(kind);
            assert_eq!(progress.step_with_role(StepRole::Detection), Some(3));
        }
    }

    #[test]
    fn computation_role_exists_only_for_forecast() {
        let forecast = ProgressInfo::for_kind(AnalysisKind::Forecast);
        assert_eq!(forecast.step_with_role(StepRole::Computation), Some(4));

        let trend = ProgressInfo::for_kind(AnalysisKind::Trend);
        assert_eq!(trend.step_with_role(StepRole::Computation), None);
    }

    // -- activation -----------------------------------------------------------

    #[test]
    fn activate_sets_status_and_start_time() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);

        assert!(progress.activate(0));
        assert_eq!(progress.steps[0].status, StepStatus::Active);
        assert!(progress.steps[0].started_at.is_some());
        assert_eq!(progress.current_step, 0);
    }

    #[test]
    fn activate_completes_skipped_earlier_steps() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(0);

        assert!(progress.activate(2));
        assert_eq!(progress.steps[0].status, StepStatus::Completed);
        assert_eq!(progress.steps[1].status, StepStatus::Completed);
        assert_eq!(progress.steps[2].status, StepStatus::Active);
        assert_eq!(progress.current_step, 2);
    }

    #[test]
    fn activate_is_noop_on_active_step() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);
        let started = progress.steps[2].started_at;

        assert!(!progress.activate(2));
        assert_eq!(progress.steps[2].started_at, started);
    }

    #[test]
    fn activate_never_reopens_terminal_steps() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);
        progress.complete(2);

        assert!(!progress.activate(2));
        assert_eq!(progress.steps[2].status, StepStatus::Completed);
    }

    #[test]
    fn activate_out_of_range_is_noop() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        assert!(!progress.activate(99));
    }

    // -- completion -----------------------------------------------------------

    #[test]
    fn complete_sets_end_time_and_duration() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);

        assert!(progress.complete(2));
        let step = &progress.steps[2];
        assert_eq!(step.status, StepStatus::Completed);
        assert!(step.ended_at.is_some());
        assert!(step.duration_ms.is_some());
    }

    #[test]
    fn complete_without_start_has_no_duration() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);

        assert!(progress.complete(1));
        let step = &progress.steps[1];
        assert!(step.ended_at.is_some());
        assert!(step.duration_ms.is_none());
    }

    #[test]
    fn complete_advances_current_step_to_next_pending() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);
        progress.complete(2);

        assert_eq!(progress.current_step, 3);
    }

    #[test]
    fn current_step_holds_at_last_index_when_nothing_pending() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        for index in 0..progress.total_steps {
            progress.complete(index);
        }

        assert_eq!(progress.current_step, progress.total_steps - 1);
    }

    #[test]
    fn current_step_never_regresses() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);
        progress.complete(2);
        let reached = progress.current_step;

        // A late completion of an earlier step must not pull it back.
        progress.complete(0);
        assert!(progress.current_step >= reached);
    }

    // -- failure --------------------------------------------------------------

    #[test]
    fn fail_current_targets_the_active_step() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);

        assert!(progress.fail_current());
        assert_eq!(progress.steps[2].status, StepStatus::Failed);
        assert!(progress.steps[2].ended_at.is_some());
    }

    #[test]
    fn fail_current_falls_back_to_current_step_when_nothing_active() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Anomaly);

        assert!(progress.fail_current());
        assert_eq!(progress.steps[0].status, StepStatus::Failed);
        assert!(progress.steps[0].duration_ms.is_none());
    }

    #[test]
    fn fail_does_not_advance_current_step() {
        let mut progress = ProgressInfo::for_kind(AnalysisKind::Trend);
        progress.activate(2);
        progress.fail(2);

        assert_eq!(progress.current_step, 2);
    }
}
