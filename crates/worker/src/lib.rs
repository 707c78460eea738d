//! Single-flight analysis job queue and worker.
//!
//! The [`worker::Worker`] accepts job ids, serializes execution so at
//! most one analysis runs per process, drives each job through fetch,
//! validate, analyze, and persist, and always proceeds to the next
//! queued job regardless of outcome.

pub mod config;
pub mod error;
pub mod worker;
