//! Core data model types for sortwise.
//!
//! These are the record shapes the surrounding application hands to the
//! engine: cards, per-participant category placements, and completed
//! study results. The engine never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single sortable item shown to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier for this card within a study.
    pub id: String,
    /// Display text shown to participants.
    pub label: String,
}

impl Card {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// One category as filled in by one participant: the category's name
/// and the cards the participant placed there, in placement order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPlacement {
    /// Unique identifier for this placement.
    pub id: String,
    /// Category name as shown to (or created by) the participant.
    pub name: String,
    /// Cards placed in this category, in the order they were placed.
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// The evaluation method a study used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyMethod {
    OpenSort,
    ClosedSort,
    HybridSort,
    ReverseSort,
    TreeTest,
}

impl StudyMethod {
    /// Whether results of this method are grouping data suitable for
    /// similarity and agreement analysis. Reverse sorting and tree
    /// testing record findability picks, not groupings.
    pub fn is_card_sort(&self) -> bool {
        matches!(
            self,
            StudyMethod::OpenSort | StudyMethod::ClosedSort | StudyMethod::HybridSort
        )
    }
}

impl fmt::Display for StudyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyMethod::OpenSort => write!(f, "open-sort"),
            StudyMethod::ClosedSort => write!(f, "closed-sort"),
            StudyMethod::HybridSort => write!(f, "hybrid-sort"),
            StudyMethod::ReverseSort => write!(f, "reverse-sort"),
            StudyMethod::TreeTest => write!(f, "tree-test"),
        }
    }
}

impl FromStr for StudyMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open-sort" | "open" => Ok(StudyMethod::OpenSort),
            "closed-sort" | "closed" => Ok(StudyMethod::ClosedSort),
            "hybrid-sort" | "hybrid" => Ok(StudyMethod::HybridSort),
            "reverse-sort" | "reverse" => Ok(StudyMethod::ReverseSort),
            "tree-test" | "tree" => Ok(StudyMethod::TreeTest),
            other => Err(format!("unknown study method: {other}")),
        }
    }
}

/// One participant's completed sort for one study.
///
/// Invariant (enforced upstream, relied on here): a given card id
/// appears in at most one placement within a single result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResult {
    /// Participant identifier.
    pub participant_id: String,
    /// Study this result belongs to.
    pub study_id: String,
    /// Evaluation method the study used.
    pub method: StudyMethod,
    /// The participant's category placements.
    #[serde(default)]
    pub placements: Vec<CategoryPlacement>,
}

impl ParticipantResult {
    /// All cards in this result, in placement discovery order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.placements.iter().flat_map(|p| p.cards.iter())
    }

    /// The category name this participant placed a card in, if any.
    pub fn card_category(&self, card_id: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.cards.iter().any(|c| c.id == card_id))
            .map(|p| p.name.as_str())
    }
}
