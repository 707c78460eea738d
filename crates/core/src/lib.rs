//! Domain models for the Sensia sensor-analysis platform.
//!
//! Zero internal dependencies by design: the job model, the progress
//! model, and the shared type aliases defined here are consumed by the
//! store contracts, the engine bridge, and the worker without dragging
//! in any I/O machinery.

pub mod error;
pub mod job;
pub mod progress;
pub mod types;
