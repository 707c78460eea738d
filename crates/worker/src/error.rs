use sensia_store::job_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a job ended up `Failed`. Carried in log fields only; the job
/// record itself reports the terminal status and the failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The requested range held no readings.
    EmptyDataset,
    /// The dataset fetch itself failed.
    Source,
    /// The analysis engine rejected the job.
    Engine,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::EmptyDataset => "empty_dataset",
            FailureReason::Source => "source",
            FailureReason::Engine => "engine",
        }
    }
}
