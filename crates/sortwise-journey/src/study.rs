//! Cross-participant journey aggregation for one study.
//!
//! Averages behavioral statistics, mines recurring movement patterns,
//! surfaces problematic and consensus cards, scores per-card
//! convergence, and summarizes phases over every participant that
//! produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sortwise_core::movement::CardMovement;

use crate::journey::{
    analyze_participant_journey, JourneyConfig, ParticipantJourney, PhaseKind,
};
use crate::trend::{calculate_trend, TrendAnalysis, TrendPoint};

/// A recurring per-card movement pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementPattern {
    /// Destination categories joined with " -> ".
    pub signature: String,
    /// How many (participant, card) trajectories matched.
    pub occurrences: usize,
    /// Distinct cards that exhibited the pattern, first seen first.
    pub card_ids: Vec<String>,
}

/// A card many participants hesitated over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblematicCard {
    pub card_id: String,
    pub card_label: String,
    /// Participants who moved this card more times than the
    /// hesitation threshold.
    pub participants_hesitated: usize,
}

/// A card most participants left alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusCard {
    pub card_id: String,
    pub card_label: String,
    /// Participants who moved this card at all.
    pub moved_by: usize,
}

/// How much more consistent a card's placement became over the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConvergence {
    pub card_id: String,
    pub card_label: String,
    /// Distinct initial categories / initial placements.
    pub initial_variance: f64,
    /// Distinct final categories / final placements.
    pub final_variance: f64,
    /// max(0, (initial − final) / initial × 100); 0 when the initial
    /// variance is 0.
    pub score: f64,
}

/// Aggregate view of one phase across the study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub kind: PhaseKind,
    /// Participants whose session produced this phase.
    pub participants: usize,
    pub avg_duration_ms: f64,
    /// Average movements per minute inside the phase window.
    pub avg_movement_rate: f64,
}

/// Study-level journey analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyJourneyAnalysis {
    /// Unique analysis-run identifier.
    pub id: Uuid,
    /// When the analysis ran.
    pub created_at: DateTime<Utc>,
    /// Participants with at least one recorded movement.
    pub participant_count: usize,
    pub avg_duration_ms: f64,
    pub avg_total_moves: f64,
    pub avg_hesitation_events: f64,
    pub avg_refinement_rate: f64,
    /// Recurring movement patterns, most frequent first.
    pub common_patterns: Vec<MovementPattern>,
    /// Cards the most participants hesitated over, worst first.
    pub problematic_cards: Vec<ProblematicCard>,
    /// Cards moved by fewer than the consensus ratio of participants.
    pub consensus_cards: Vec<ConsensusCard>,
    /// Per-card convergence scores.
    pub convergence: Vec<CardConvergence>,
    /// Summaries for every phase at least one participant produced.
    pub phase_summaries: Vec<PhaseSummary>,
    /// Trend of total moves across sessions ordered by start time.
    pub movement_trend: TrendAnalysis,
    /// The underlying per-participant journeys.
    pub journeys: Vec<ParticipantJourney>,
}

/// Aggregate journeys across a study.
///
/// Tolerates an empty study (returns a neutral analysis); participants
/// with zero recorded movements are skipped with a warning.
pub fn analyze_study_journeys(
    sessions: &[Vec<CardMovement>],
    config: &JourneyConfig,
) -> StudyJourneyAnalysis {
    let mut journeys = Vec::with_capacity(sessions.len());
    for session in sessions {
        if session.is_empty() {
            tracing::warn!("skipping participant session with no movements");
            continue;
        }
        match analyze_participant_journey(session, config) {
            Ok(journey) => journeys.push(journey),
            Err(e) => tracing::warn!("skipping unanalyzable session: {e}"),
        }
    }
    tracing::debug!(participants = journeys.len(), "aggregating study journeys");

    let n = journeys.len();
    let nf = n as f64;
    let mean = |sum: f64| if n == 0 { 0.0 } else { sum / nf };

    let avg_duration_ms = mean(journeys.iter().map(|j| j.duration_ms as f64).sum());
    let avg_total_moves = mean(journeys.iter().map(|j| j.statistics.total_moves as f64).sum());
    let avg_hesitation_events = mean(
        journeys
            .iter()
            .map(|j| j.statistics.hesitation_events as f64)
            .sum(),
    );
    let avg_refinement_rate = mean(journeys.iter().map(|j| j.refinement_rate()).sum());

    let common_patterns = mine_patterns(&journeys, config);
    let problematic_cards = problematic_cards(&journeys, config);
    let consensus_cards = consensus_cards(&journeys, config);
    let convergence = convergence_scores(&journeys);
    let phase_summaries = summarize_phases(&journeys);

    let mut ordered: Vec<&ParticipantJourney> = journeys.iter().collect();
    ordered.sort_by_key(|j| j.start_time);
    let points: Vec<TrendPoint> = ordered
        .iter()
        .map(|j| TrendPoint {
            value: j.statistics.total_moves as f64,
            date: j.start_time,
        })
        .collect();
    let movement_trend = calculate_trend(&points);

    StudyJourneyAnalysis {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        participant_count: n,
        avg_duration_ms,
        avg_total_moves,
        avg_hesitation_events,
        avg_refinement_rate,
        common_patterns,
        problematic_cards,
        consensus_cards,
        convergence,
        phase_summaries,
        movement_trend,
        journeys,
    }
}

fn mine_patterns(journeys: &[ParticipantJourney], config: &JourneyConfig) -> Vec<MovementPattern> {
    // Signature tally kept in first-seen order so equal frequencies
    // rank deterministically.
    let mut patterns: Vec<MovementPattern> = Vec::new();
    for journey in journeys {
        for trajectory in &journey.trajectories {
            let signature = trajectory.destinations.join(" -> ");
            match patterns.iter_mut().find(|p| p.signature == signature) {
                Some(p) => {
                    p.occurrences += 1;
                    if !p.card_ids.contains(&trajectory.card_id) {
                        p.card_ids.push(trajectory.card_id.clone());
                    }
                }
                None => patterns.push(MovementPattern {
                    signature,
                    occurrences: 1,
                    card_ids: vec![trajectory.card_id.clone()],
                }),
            }
        }
    }
    patterns.retain(|p| p.occurrences >= config.min_pattern_occurrences);
    patterns.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    patterns.truncate(config.max_patterns);
    patterns
}

/// Every card any journey touched, first seen first, with its label.
fn card_universe(journeys: &[ParticipantJourney]) -> Vec<(String, String)> {
    let mut cards: Vec<(String, String)> = Vec::new();
    for journey in journeys {
        for trajectory in &journey.trajectories {
            if !cards.iter().any(|(id, _)| *id == trajectory.card_id) {
                cards.push((trajectory.card_id.clone(), trajectory.card_label.clone()));
            }
        }
    }
    cards
}

fn problematic_cards(
    journeys: &[ParticipantJourney],
    config: &JourneyConfig,
) -> Vec<ProblematicCard> {
    let mut cards: Vec<ProblematicCard> = card_universe(journeys)
        .into_iter()
        .map(|(card_id, card_label)| {
            let participants_hesitated = journeys
                .iter()
                .filter(|j| {
                    j.trajectories.iter().any(|t| {
                        t.card_id == card_id
                            && t.destinations.len() > config.hesitation_threshold
                    })
                })
                .count();
            ProblematicCard {
                card_id,
                card_label,
                participants_hesitated,
            }
        })
        .filter(|c| c.participants_hesitated > 0)
        .collect();
    cards.sort_by(|a, b| b.participants_hesitated.cmp(&a.participants_hesitated));
    cards.truncate(config.max_problematic_cards);
    cards
}

fn consensus_cards(journeys: &[ParticipantJourney], config: &JourneyConfig) -> Vec<ConsensusCard> {
    let n = journeys.len();
    card_universe(journeys)
        .into_iter()
        .filter_map(|(card_id, card_label)| {
            let moved_by = journeys
                .iter()
                .filter(|j| j.trajectories.iter().any(|t| t.card_id == card_id))
                .count();
            if (moved_by as f64) < config.consensus_movement_ratio * n as f64 {
                Some(ConsensusCard {
                    card_id,
                    card_label,
                    moved_by,
                })
            } else {
                None
            }
        })
        .collect()
}

fn convergence_scores(journeys: &[ParticipantJourney]) -> Vec<CardConvergence> {
    card_universe(journeys)
        .into_iter()
        .map(|(card_id, card_label)| {
            let mut initials: Vec<&str> = Vec::new();
            let mut finals: Vec<&str> = Vec::new();
            for journey in journeys {
                if let Some(t) = journey.trajectories.iter().find(|t| t.card_id == card_id) {
                    if let (Some(first), Some(last)) =
                        (t.destinations.first(), t.destinations.last())
                    {
                        initials.push(first);
                        finals.push(last);
                    }
                }
            }
            let initial_variance = categorical_variance(&initials);
            let final_variance = categorical_variance(&finals);
            let score = if initial_variance > 0.0 {
                ((initial_variance - final_variance) / initial_variance * 100.0).max(0.0)
            } else {
                0.0
            };
            CardConvergence {
                card_id,
                card_label,
                initial_variance,
                final_variance,
                score,
            }
        })
        .collect()
}

/// Distinct categories used divided by total placements.
fn categorical_variance(placements: &[&str]) -> f64 {
    if placements.is_empty() {
        return 0.0;
    }
    let mut distinct: Vec<&str> = Vec::new();
    for p in placements {
        if !distinct.contains(p) {
            distinct.push(p);
        }
    }
    distinct.len() as f64 / placements.len() as f64
}

fn summarize_phases(journeys: &[ParticipantJourney]) -> Vec<PhaseSummary> {
    PhaseKind::ALL
        .iter()
        .filter_map(|&kind| {
            let produced: Vec<_> = journeys
                .iter()
                .flat_map(|j| j.phases.iter().filter(|p| p.kind == kind))
                .collect();
            if produced.is_empty() {
                return None;
            }
            let n = produced.len() as f64;
            let avg_duration_ms =
                produced.iter().map(|p| p.duration_ms() as f64).sum::<f64>() / n;
            let avg_movement_rate = produced
                .iter()
                .map(|p| {
                    let minutes = p.duration_ms() as f64 / 60_000.0;
                    if minutes > 0.0 {
                        p.movement_count as f64 / minutes
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
                / n;
            Some(PhaseSummary {
                kind,
                participants: produced.len(),
                avg_duration_ms,
                avg_movement_rate,
            })
        })
        .collect()
}
