//! Abstract persistence and data-access contracts.
//!
//! The processing core reads and writes jobs through [`job_store::JobStore`]
//! and fetches readings through [`sensor_source::SensorDataSource`]; the
//! concrete backends (database, time-series store) live with the host
//! application.

pub mod job_store;
pub mod sensor_source;
pub mod update;
