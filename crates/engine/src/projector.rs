//! Phase-to-step projection.
//!
//! Maps each phase event onto at most one progress-step transition.
//! The projector is pure over the progress value: it performs no I/O
//! and sleeps for nothing. The caller persists on [`Projection::Updated`]
//! and drives the finishing cascade on [`Projection::EngineFinished`].

use sensia_core::progress::{ProgressInfo, StepRole};

use crate::phases::{
    PhaseEvent, PHASE_ANALYSIS_COMPLETE, PHASE_CORRELATION_ANALYSIS, PHASE_DATA_PREPARATION,
    PHASE_SENSOR_ANALYSIS_PROGRESS, PHASE_SENSOR_ANALYSIS_START, PHASE_SUMMARY_GENERATION,
};

/// Step index of the shared "data analysis" step, the target of the
/// sensor-analysis phases.
const ANALYSIS_STEP: usize = 2;

/// `sensor_analysis_progress` ratios in `[DEBOUNCE_FLOOR, 1.0)` are
/// dropped so near-complete progress chatter does not thrash persistence.
const DEBOUNCE_FLOOR: f64 = 0.7;

/// Outcome of projecting one phase event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Nothing changed; do not persist.
    Unchanged,
    /// The progress value changed; persist it.
    Updated,
    /// The engine reported completion. The shared analysis step is now
    /// closed; the caller runs the finishing cascade over the remaining
    /// steps.
    EngineFinished,
}

/// Translates engine phase events into progress-step transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseProjector;

impl PhaseProjector {
    /// Project one phase event onto the progress model.
    ///
    /// Unknown phases are ignored: engines are free to emit phases this
    /// core has no step for.
    pub fn project(&self, progress: &mut ProgressInfo, event: &PhaseEvent) -> Projection {
        match event.phase.as_str() {
            PHASE_DATA_PREPARATION => updated(progress.activate(0)),

            PHASE_SENSOR_ANALYSIS_START => updated(progress.activate(ANALYSIS_STEP)),

            PHASE_SENSOR_ANALYSIS_PROGRESS => {
                if event.ratio >= 1.0 {
                    updated(progress.complete(ANALYSIS_STEP))
                } else if event.ratio < DEBOUNCE_FLOOR {
                    updated(progress.activate(ANALYSIS_STEP))
                } else {
                    Projection::Unchanged
                }
            }

            PHASE_CORRELATION_ANALYSIS => {
                // Activation only; completion is deferred to the
                // summary_generation phase.
                match progress.step_with_role(StepRole::Detection) {
                    Some(index) => updated(progress.activate(index)),
                    None => Projection::Unchanged,
                }
            }

            PHASE_SUMMARY_GENERATION => {
                let mut changed = false;
                if let Some(index) = progress.step_with_role(StepRole::Detection) {
                    changed |= progress.complete(index);
                }
                // Forecast has a computation step between detection and
                // finalize; open it so pollers see it running.
                if let Some(index) = progress.step_with_role(StepRole::Computation) {
                    changed |= progress.activate(index);
                }
                updated(changed)
            }

            PHASE_ANALYSIS_COMPLETE => {
                progress.complete(ANALYSIS_STEP);
                Projection::EngineFinished
            }

            other => {
                tracing::debug!(phase = %other, "Ignoring unknown phase");
                Projection::Unchanged
            }
        }
    }
}

fn updated(changed: bool) -> Projection {
    if changed {
        Projection::Updated
    } else {
        Projection::Unchanged
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
