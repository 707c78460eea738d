//! Abstract job persistence.

use async_trait::async_trait;

use sensia_core::job::{AnalysisJob, JobStatus};
use sensia_core::types::JobId;

use crate::update::JobUpdate;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Keyed job record store.
///
/// The worker is the only writer while a job is in flight; pollers must
/// re-fetch rather than cache, since the record is rewritten after every
/// step transition.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load a job by id. `None` when no such record exists.
    async fn load(&self, id: JobId) -> Result<Option<AnalysisJob>, StoreError>;

    /// Merge a partial update into the record, refreshing its
    /// modification timestamp (see [`JobUpdate::apply`]).
    async fn save(&self, id: JobId, update: JobUpdate) -> Result<(), StoreError>;

    /// All jobs currently in `status`. Used at process start to recover
    /// jobs that were created but never picked up.
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<AnalysisJob>, StoreError>;
}
