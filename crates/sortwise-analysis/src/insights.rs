//! Study-level agreement analysis report.
//!
//! Bundles card scores, category scores, and the agreement matrix into
//! one record with an overall score, insight extremes, and a fixed
//! six-bucket score histogram.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sortwise_core::error::AnalysisError;
use sortwise_core::model::ParticipantResult;

use crate::agreement::{
    agreement_matrix, card_agreement_scores, category_agreement_scores, AgreementMatrix,
    CardAgreementScore, CategoryAgreementScore,
};

/// A complete agreement analysis over one study's card-sort results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementAnalysis {
    /// Unique analysis-run identifier.
    pub id: Uuid,
    /// When the analysis ran.
    pub created_at: DateTime<Utc>,
    /// Number of card-sort results analyzed.
    pub participant_count: usize,
    /// Mean of all card agreement scores, in [0, 100].
    pub overall_agreement: f64,
    /// Per-card agreement.
    pub card_scores: Vec<CardAgreementScore>,
    /// Per-category agreement.
    pub category_scores: Vec<CategoryAgreementScore>,
    /// Card-pair agreement matrix.
    pub matrix: AgreementMatrix,
    /// Extremes worth surfacing to researchers.
    pub insights: AgreementInsights,
    /// Histogram of card agreement scores.
    pub distribution: ScoreDistribution,
}

/// Highest/lowest agreement extremes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementInsights {
    pub highest_agreement_card: Option<CardHighlight>,
    pub lowest_agreement_card: Option<CardHighlight>,
    pub most_consistent_category: Option<CategoryHighlight>,
    pub least_consistent_category: Option<CategoryHighlight>,
}

/// A card singled out by an insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardHighlight {
    pub card_id: String,
    pub card_label: String,
    pub agreement: f64,
}

/// A category singled out by an insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryHighlight {
    pub name: String,
    pub agreement: f64,
}

/// Card agreement scores bucketed into six fixed ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub buckets: Vec<ScoreBucket>,
}

/// One histogram bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBucket {
    /// Human-readable range label (e.g. "90-100").
    pub label: String,
    /// Inclusive lower bound.
    pub lower: f64,
    /// Number of cards whose agreement falls in this bucket.
    pub count: usize,
}

const BUCKETS: &[(&str, f64)] = &[
    ("90-100", 90.0),
    ("80-89", 80.0),
    ("70-79", 70.0),
    ("60-69", 60.0),
    ("50-59", 50.0),
    ("below-50", 0.0),
];

fn distribution(card_scores: &[CardAgreementScore]) -> ScoreDistribution {
    let buckets = BUCKETS
        .iter()
        .map(|(label, lower)| ScoreBucket {
            label: (*label).to_string(),
            lower: *lower,
            count: card_scores
                .iter()
                .filter(|s| {
                    s.agreement >= *lower
                        && !BUCKETS
                            .iter()
                            .any(|(_, higher)| *higher > *lower && s.agreement >= *higher)
                })
                .count(),
        })
        .collect();
    ScoreDistribution { buckets }
}

/// Run the full agreement analysis over a study's results.
///
/// Results whose method is not a card sort are skipped. Fails with
/// [`AnalysisError::NoCardSortData`] when nothing qualifies.
pub fn agreement_analysis(
    results: &[ParticipantResult],
) -> Result<AgreementAnalysis, AnalysisError> {
    let card_sorts: Vec<ParticipantResult> = results
        .iter()
        .filter(|r| r.method.is_card_sort())
        .cloned()
        .collect();

    let skipped = results.len() - card_sorts.len();
    if skipped > 0 {
        tracing::warn!(skipped, "ignoring non-card-sort results in agreement analysis");
    }
    if card_sorts.is_empty() {
        return Err(AnalysisError::NoCardSortData);
    }
    tracing::debug!(participants = card_sorts.len(), "running agreement analysis");

    let card_scores = card_agreement_scores(&card_sorts);
    let category_scores = category_agreement_scores(&card_sorts);
    let matrix = agreement_matrix(&card_sorts);

    let overall_agreement = if card_scores.is_empty() {
        0.0
    } else {
        card_scores.iter().map(|s| s.agreement).sum::<f64>() / card_scores.len() as f64
    };

    let highest_agreement_card = card_scores
        .iter()
        .max_by(|a, b| a.agreement.total_cmp(&b.agreement))
        .map(card_highlight);
    let lowest_agreement_card = card_scores
        .iter()
        .min_by(|a, b| a.agreement.total_cmp(&b.agreement))
        .map(card_highlight);
    let most_consistent_category = category_scores
        .iter()
        .max_by(|a, b| a.agreement.total_cmp(&b.agreement))
        .map(category_highlight);
    let least_consistent_category = category_scores
        .iter()
        .min_by(|a, b| a.agreement.total_cmp(&b.agreement))
        .map(category_highlight);

    Ok(AgreementAnalysis {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        participant_count: card_sorts.len(),
        overall_agreement,
        distribution: distribution(&card_scores),
        insights: AgreementInsights {
            highest_agreement_card,
            lowest_agreement_card,
            most_consistent_category,
            least_consistent_category,
        },
        card_scores,
        category_scores,
        matrix,
    })
}

fn card_highlight(score: &CardAgreementScore) -> CardHighlight {
    CardHighlight {
        card_id: score.card_id.clone(),
        card_label: score.card_label.clone(),
        agreement: score.agreement,
    }
}

fn category_highlight(score: &CategoryAgreementScore) -> CategoryHighlight {
    CategoryHighlight {
        name: score.name.clone(),
        agreement: score.agreement,
    }
}
