//! The analysis engine contract.

use async_trait::async_trait;
use tokio::sync::mpsc;

use sensia_core::job::{AnalysisKind, JobParameters, SensorReading};

use crate::phases::PhaseEvent;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Analysis engine unavailable: {0}")]
    Unavailable(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),
}

/// An opaque analysis service.
///
/// Given a chronologically ordered dataset it produces a structured
/// result and emits [`PhaseEvent`]s through `phases` while working.
/// Events for a single call arrive in emission order. On success the
/// engine must have emitted [`PHASE_ANALYSIS_COMPLETE`] with ratio 1.0
/// exactly once; on failure it emits nothing further and the call
/// returns the error.
///
/// [`PHASE_ANALYSIS_COMPLETE`]: crate::phases::PHASE_ANALYSIS_COMPLETE
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(
        &self,
        readings: &[SensorReading],
        kind: AnalysisKind,
        parameters: &JobParameters,
        phases: mpsc::Sender<PhaseEvent>,
    ) -> Result<serde_json::Value, EngineError>;
}
