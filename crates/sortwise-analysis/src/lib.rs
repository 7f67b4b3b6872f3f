//! sortwise-analysis — Similarity, clustering, and agreement scoring.
//!
//! Pure, synchronous transformations over validated [`ParticipantResult`]
//! collections: pairwise card similarity, average-linkage hierarchical
//! clustering, and card/category agreement statistics. Nothing here owns
//! state across calls or touches anything outside its inputs.
//!
//! [`ParticipantResult`]: sortwise_core::model::ParticipantResult

pub mod agreement;
pub mod clustering;
pub mod insights;
pub mod similarity;

pub use sortwise_core::error::AnalysisError;
