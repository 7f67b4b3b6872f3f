//! Pairwise card similarity from participant sort results.
//!
//! Two cards are similar to the degree that participants put them in the
//! same category. Similarity = co-occurrence count / participant count,
//! so it always lands in [0, 1].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use sortwise_core::model::{Card, ParticipantResult};

/// Similarity between one unordered pair of cards.
///
/// `card_a` is always the earlier card in discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityPair {
    /// Id of the first card of the pair.
    pub card_a: String,
    /// Id of the second card of the pair.
    pub card_b: String,
    /// Number of participants who placed both cards in the same category.
    pub co_occurrence: u32,
    /// Co-occurrence normalized by participant count, in [0, 1].
    pub similarity: f64,
}

/// Symmetric card-by-card similarity matrix.
///
/// Row/column order follows `cards`; the diagonal is fixed at 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    /// Cards in matrix order.
    pub cards: Vec<Card>,
    /// `values[i][j]` = similarity between `cards[i]` and `cards[j]`.
    pub values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    /// Number of cards (rows/columns).
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// The card universe for similarity analysis: the first result's card
/// set in placement discovery order. Callers that care about matrix
/// order must supply a canonical result as element 0.
fn card_universe(results: &[ParticipantResult]) -> Vec<Card> {
    let Some(first) = results.first() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut cards = Vec::new();
    for card in first.cards() {
        if seen.insert(card.id.clone()) {
            cards.push(card.clone());
        }
    }
    cards
}

/// Compute similarity for every unordered pair of distinct cards.
///
/// Returns pairs sorted descending by similarity (stable with respect
/// to pair discovery order). Empty input yields an empty vec.
pub fn card_similarities(results: &[ParticipantResult]) -> Vec<SimilarityPair> {
    let cards = card_universe(results);
    if cards.is_empty() {
        return Vec::new();
    }
    tracing::debug!(
        participants = results.len(),
        cards = cards.len(),
        "computing pairwise card similarity"
    );

    let total = results.len() as f64;
    let mut pairs = Vec::with_capacity(cards.len() * (cards.len().saturating_sub(1)) / 2);

    for i in 0..cards.len() {
        for j in (i + 1)..cards.len() {
            let co_occurrence = results
                .iter()
                .filter(|r| {
                    match (r.card_category(&cards[i].id), r.card_category(&cards[j].id)) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    }
                })
                .count() as u32;

            pairs.push(SimilarityPair {
                card_a: cards[i].id.clone(),
                card_b: cards[j].id.clone(),
                co_occurrence,
                similarity: co_occurrence as f64 / total,
            });
        }
    }

    pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    pairs
}

/// Build the symmetric similarity matrix over the first result's cards.
pub fn similarity_matrix(results: &[ParticipantResult]) -> SimilarityMatrix {
    let cards = card_universe(results);
    let n = cards.len();
    let mut values = vec![vec![0.0; n]; n];
    for (i, row) in values.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let index: HashMap<&str, usize> = cards
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    for pair in card_similarities(results) {
        let (Some(&i), Some(&j)) = (index.get(pair.card_a.as_str()), index.get(pair.card_b.as_str()))
        else {
            continue;
        };
        values[i][j] = pair.similarity;
        values[j][i] = pair.similarity;
    }

    SimilarityMatrix { cards, values }
}
