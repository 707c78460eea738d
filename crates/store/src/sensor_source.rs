//! Abstract sensor dataset access.

use async_trait::async_trait;

use sensia_core::job::SensorReading;
use sensia_core::types::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Sensor data source failure: {0}")]
    Backend(String),
}

/// Read access to a subject's time series.
#[async_trait]
pub trait SensorDataSource: Send + Sync {
    /// Readings for `subject_id` within `[start, end]`, ascending by
    /// timestamp. An empty vector is a valid, expected response (the
    /// subject simply has no data in range), not an error.
    async fn fetch_range(
        &self,
        subject_id: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<SensorReading>, SourceError>;
}
