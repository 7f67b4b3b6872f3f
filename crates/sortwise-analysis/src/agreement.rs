//! Card and category agreement scoring.
//!
//! Agreement measures how consistently participants placed a card (or
//! used a category) the same way. Scores are percentages in [0, 100].
//! This module is independent of the clusterer: it works straight off
//! placement tallies.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use sortwise_core::model::{Card, ParticipantResult};

/// Agreement statistics for one card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardAgreementScore {
    /// Card identifier.
    pub card_id: String,
    /// Card display text.
    pub card_label: String,
    /// (max category count / total participants) × 100.
    pub agreement: f64,
    /// The category most participants placed the card in. Ties go to
    /// the category seen first in input order.
    pub consensus_category: String,
    /// Full placement-frequency map: category name → participant count.
    pub category_counts: HashMap<String, u32>,
    /// Number of participants considered.
    pub total_participants: u32,
    /// Number of distinct categories the card was ever placed in.
    pub distinct_categories: usize,
}

/// Agreement statistics for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAgreementScore {
    /// Category name.
    pub name: String,
    /// Average per-card consistency × usage percentage, in [0, 100].
    pub agreement: f64,
    /// Number of distinct cards ever placed in this category.
    pub total_cards: usize,
    /// Number of distinct participants who used this category.
    pub participants_using: u32,
    /// Share of participants who used this category, in [0, 100].
    pub usage_percentage: f64,
    /// Cards placed here by at least half (rounded up) of the
    /// category's users.
    pub consensus_cards: Vec<Card>,
}

/// Symmetric card-by-card agreement matrix.
///
/// `values[i][j]` = percentage of participants who placed `cards[i]`
/// and `cards[j]` in the same category; the diagonal is fixed at 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementMatrix {
    /// Cards in matrix order.
    pub cards: Vec<Card>,
    /// Percentages in [0, 100].
    pub values: Vec<Vec<f64>>,
}

/// Every card across all results, deduplicated in discovery order
/// (first result first, placement order within a result).
fn all_cards(results: &[ParticipantResult]) -> Vec<Card> {
    let mut seen = HashSet::new();
    let mut cards = Vec::new();
    for result in results {
        for card in result.cards() {
            if seen.insert(card.id.clone()) {
                cards.push(card.clone());
            }
        }
    }
    cards
}

/// Per-card agreement across all participants.
pub fn card_agreement_scores(results: &[ParticipantResult]) -> Vec<CardAgreementScore> {
    let cards = all_cards(results);
    tracing::debug!(
        participants = results.len(),
        cards = cards.len(),
        "scoring card agreement"
    );
    let total = results.len() as u32;

    cards
        .into_iter()
        .map(|card| {
            // Tally kept as a vec so first-seen order decides ties.
            let mut tally: Vec<(String, u32)> = Vec::new();
            for result in results {
                if let Some(category) = result.card_category(&card.id) {
                    match tally.iter_mut().find(|(name, _)| name == category) {
                        Some((_, count)) => *count += 1,
                        None => tally.push((category.to_string(), 1)),
                    }
                }
            }

            let (consensus_category, max_count) = tally
                .iter()
                .fold(("".to_string(), 0u32), |(best_name, best), (name, count)| {
                    if *count > best {
                        (name.clone(), *count)
                    } else {
                        (best_name, best)
                    }
                });

            let agreement = if total == 0 {
                0.0
            } else {
                max_count as f64 / total as f64 * 100.0
            };

            CardAgreementScore {
                card_id: card.id,
                card_label: card.label,
                agreement,
                consensus_category,
                distinct_categories: tally.len(),
                category_counts: tally.into_iter().collect(),
                total_participants: total,
            }
        })
        .collect()
}

/// Per-category agreement across all participants.
pub fn category_agreement_scores(results: &[ParticipantResult]) -> Vec<CategoryAgreementScore> {
    // Category universe in first-seen order.
    let mut names: Vec<String> = Vec::new();
    for result in results {
        for placement in &result.placements {
            if !names.contains(&placement.name) {
                names.push(placement.name.clone());
            }
        }
    }
    tracing::debug!(
        participants = results.len(),
        categories = names.len(),
        "scoring category agreement"
    );
    let total = results.len() as u32;

    names
        .into_iter()
        .map(|name| {
            let mut users: HashSet<&str> = HashSet::new();
            // Card frequency within this category, first-seen order.
            let mut card_freq: Vec<(Card, u32)> = Vec::new();

            for result in results {
                let mut participant_cards: HashSet<&str> = HashSet::new();
                let mut used = false;
                for placement in result.placements.iter().filter(|p| p.name == name) {
                    used = true;
                    for card in &placement.cards {
                        // Count each participant once per card.
                        if !participant_cards.insert(card.id.as_str()) {
                            continue;
                        }
                        match card_freq.iter_mut().find(|(c, _)| c.id == card.id) {
                            Some((_, count)) => *count += 1,
                            None => card_freq.push((card.clone(), 1)),
                        }
                    }
                }
                if used {
                    users.insert(result.participant_id.as_str());
                }
            }

            let usage = users.len() as u32;
            let usage_percentage = if total == 0 {
                0.0
            } else {
                usage as f64 / total as f64 * 100.0
            };

            let avg_consistency = if usage == 0 || card_freq.is_empty() {
                0.0
            } else {
                card_freq
                    .iter()
                    .map(|(_, count)| *count as f64 / usage as f64)
                    .sum::<f64>()
                    / card_freq.len() as f64
            };

            let consensus_threshold = usage.div_ceil(2);
            let consensus_cards = if usage == 0 {
                Vec::new()
            } else {
                card_freq
                    .iter()
                    .filter(|(_, count)| *count >= consensus_threshold)
                    .map(|(card, _)| card.clone())
                    .collect()
            };

            CategoryAgreementScore {
                name,
                agreement: avg_consistency * usage_percentage,
                total_cards: card_freq.len(),
                participants_using: usage,
                usage_percentage,
                consensus_cards,
            }
        })
        .collect()
}

/// Card-pair agreement matrix over all cards seen in any result.
pub fn agreement_matrix(results: &[ParticipantResult]) -> AgreementMatrix {
    let cards = all_cards(results);
    let n = cards.len();
    let total = results.len() as f64;
    let mut values = vec![vec![0.0; n]; n];

    for i in 0..n {
        values[i][i] = 100.0;
        for j in (i + 1)..n {
            let both = results
                .iter()
                .filter(|r| {
                    match (r.card_category(&cards[i].id), r.card_category(&cards[j].id)) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    }
                })
                .count() as f64;
            let pct = if total == 0.0 { 0.0 } else { both / total * 100.0 };
            values[i][j] = pct;
            values[j][i] = pct;
        }
    }

    AgreementMatrix { cards, values }
}
