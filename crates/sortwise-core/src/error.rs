//! Analysis error types.
//!
//! Only functions whose contract *requires* qualifying data fail with
//! these conditions. Functions that tolerate empty input return empty
//! or neutral structures instead, and every ratio in the engine
//! special-cases a zero denominator to 0 rather than erroring.

use thiserror::Error;

/// Errors an analysis can fail with.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Agreement analysis was asked to run over a result set containing
    /// no card-sort results at all.
    #[error("no card sort results available for agreement analysis")]
    NoCardSortData,

    /// Journey analysis was given a participant with zero recorded
    /// movements.
    #[error("no movements recorded for participant {participant_id}")]
    EmptyMovementSet { participant_id: String },
}

impl AnalysisError {
    /// Returns `true` if the condition means "not enough data yet" and
    /// the caller can simply re-run once more data arrives.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            AnalysisError::NoCardSortData | AnalysisError::EmptyMovementSet { .. }
        )
    }
}
