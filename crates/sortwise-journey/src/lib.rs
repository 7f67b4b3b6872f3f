//! sortwise-journey — Behavioral analysis of sorting sessions.
//!
//! Consumes ordered card-movement traces: reconstructs each
//! participant's journey (final placements, hesitation, undo patterns,
//! temporal phases), aggregates journeys across a study, and classifies
//! trends in ordered numeric series by least-squares regression.

pub mod journey;
pub mod study;
pub mod trend;

pub use sortwise_core::error::AnalysisError;
