//! Analysis engine bridge.
//!
//! Defines the contract an analysis engine implements, the phase events
//! it emits while working, and the projector that translates that
//! free-form phase stream onto the bounded step progress model.

pub mod contract;
pub mod phases;
pub mod projector;
