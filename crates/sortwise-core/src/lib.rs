//! sortwise-core — Data model and errors for the sortwise analytics engine.
//!
//! This crate defines the fundamental record shapes that the analysis
//! crates consume: participant sort results, card movement events, and
//! the typed error conditions analyses can fail with.

pub mod error;
pub mod model;
pub mod movement;
