//! Phase events emitted by analysis engines.
//!
//! Phase names are free-form strings owned by the engine, not a 1:1
//! mapping to progress steps; the projector interprets the ones below
//! and ignores everything else.

use serde::Serialize;

/// Dataset normalization is underway.
pub const PHASE_DATA_PREPARATION: &str = "data_preparation";

/// Core sensor analysis started.
pub const PHASE_SENSOR_ANALYSIS_START: &str = "sensor_analysis_start";

/// Core sensor analysis progress; `ratio` carries completion in [0, 1].
pub const PHASE_SENSOR_ANALYSIS_PROGRESS: &str = "sensor_analysis_progress";

/// Kind-specific detection/training work started.
pub const PHASE_CORRELATION_ANALYSIS: &str = "correlation_analysis";

/// The engine is producing its summary; detection work is done.
pub const PHASE_SUMMARY_GENERATION: &str = "summary_generation";

/// The engine finished all analysis work. Emitted exactly once on
/// success, with ratio 1.0, before the `analyze` call resolves.
pub const PHASE_ANALYSIS_COMPLETE: &str = "analysis_complete";

/// One progress callback from an engine, in emission order.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseEvent {
    pub phase: String,
    /// Human-readable detail, passed through for logging only.
    pub detail: String,
    /// Continuous completion ratio in `[0.0, 1.0]`.
    pub ratio: f64,
}

impl PhaseEvent {
    pub fn new(phase: impl Into<String>, detail: impl Into<String>, ratio: f64) -> Self {
        Self {
            phase: phase.into(),
            detail: detail.into(),
            ratio,
        }
    }
}
