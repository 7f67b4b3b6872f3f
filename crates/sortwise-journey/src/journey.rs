//! Per-participant journey reconstruction.
//!
//! A journey is the time-ordered trace of one participant's card
//! movements. From it we derive the final placement of every card,
//! behavioral statistics (hesitation, undo patterns), and a temporal
//! segmentation of the session into named phases.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sortwise_core::error::AnalysisError;
use sortwise_core::movement::CardMovement;

/// Tunables for journey analysis. Defaults match the reference
/// behavior of the engine; change them only for exploratory runs.
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// A card moved more than this many times counts as hesitated.
    pub hesitation_threshold: usize,
    /// Cards moved by fewer than this share of participants count as
    /// consensus cards in study aggregation.
    pub consensus_movement_ratio: f64,
    /// Minimum recurrences for a movement pattern to be reported.
    pub min_pattern_occurrences: usize,
    /// Cap on reported movement patterns.
    pub max_patterns: usize,
    /// Cap on reported problematic cards.
    pub max_problematic_cards: usize,
    /// Elapsed-time fraction where the initial phase ends (inclusive).
    pub initial_phase_end: f64,
    /// Elapsed-time fraction where the exploration phase ends.
    pub exploration_phase_end: f64,
    /// Elapsed-time fraction where the refinement phase ends.
    pub refinement_phase_end: f64,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            hesitation_threshold: 2,
            consensus_movement_ratio: 0.3,
            min_pattern_occurrences: 2,
            max_patterns: 10,
            max_problematic_cards: 10,
            initial_phase_end: 0.2,
            exploration_phase_end: 0.7,
            refinement_phase_end: 0.9,
        }
    }
}

/// The named temporal phases of a sorting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Initial,
    Exploration,
    Refinement,
    Finalization,
}

impl PhaseKind {
    /// All phases in session order.
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Initial,
        PhaseKind::Exploration,
        PhaseKind::Refinement,
        PhaseKind::Finalization,
    ];
}

/// One populated phase of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyPhase {
    pub kind: PhaseKind,
    /// Start of the phase's time window.
    pub started_at: DateTime<Utc>,
    /// End of the phase's time window.
    pub ended_at: DateTime<Utc>,
    /// Movements that fell inside the window.
    pub movement_count: usize,
    /// Distinct cards touched in the window, in first-touch order.
    pub card_ids: Vec<String>,
}

impl JourneyPhase {
    pub fn duration_ms(&self) -> u64 {
        (self.ended_at - self.started_at).num_milliseconds().max(0) as u64
    }
}

/// The ordered destinations one card went through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTrajectory {
    pub card_id: String,
    pub card_label: String,
    /// Destination categories in movement order.
    pub destinations: Vec<String>,
}

/// Behavioral statistics over one journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyStatistics {
    /// Total movement events.
    pub total_moves: usize,
    /// Distinct cards touched.
    pub unique_cards_moved: usize,
    /// total_moves / unique_cards_moved, 0 when no cards moved.
    pub average_moves_per_card: f64,
    /// Moves whose destination re-appears earlier in that card's own
    /// trajectory.
    pub undo_redo_count: usize,
    /// Cards moved more often than the hesitation threshold.
    pub hesitation_events: usize,
}

/// One participant's reconstructed journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJourney {
    pub participant_id: String,
    pub session_id: String,
    /// Earliest movement timestamp.
    pub start_time: DateTime<Utc>,
    /// Latest movement timestamp.
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    /// Movements sorted by movement index.
    pub movements: Vec<CardMovement>,
    /// Last destination per card.
    pub final_placements: HashMap<String, String>,
    /// Per-card destination histories, in first-move order.
    pub trajectories: Vec<CardTrajectory>,
    pub statistics: JourneyStatistics,
    /// Populated phases in session order; empty phases are omitted.
    pub phases: Vec<JourneyPhase>,
    /// Span from the first to the last populated phase.
    pub decision_time_ms: u64,
}

impl ParticipantJourney {
    /// Share of this journey's moves that fell in the refinement phase.
    pub fn refinement_rate(&self) -> f64 {
        if self.statistics.total_moves == 0 {
            return 0.0;
        }
        let refinement_moves = self
            .phases
            .iter()
            .filter(|p| p.kind == PhaseKind::Refinement)
            .map(|p| p.movement_count)
            .sum::<usize>();
        refinement_moves as f64 / self.statistics.total_moves as f64
    }
}

/// Reconstruct one participant's journey from raw movement events.
///
/// Events are sorted by `movement_index` here rather than trusting
/// caller order, so every derived statistic sees index order. Fails
/// with [`AnalysisError::EmptyMovementSet`] on zero events.
pub fn analyze_participant_journey(
    movements: &[CardMovement],
    config: &JourneyConfig,
) -> Result<ParticipantJourney, AnalysisError> {
    if movements.is_empty() {
        return Err(AnalysisError::EmptyMovementSet {
            participant_id: "unknown".into(),
        });
    }

    let mut sorted = movements.to_vec();
    sorted.sort_by_key(|m| m.movement_index);

    let participant_id = sorted[0].participant_id.clone();
    let session_id = sorted[0].session_id.clone();
    tracing::debug!(
        participant = %participant_id,
        movements = sorted.len(),
        "analyzing participant journey"
    );

    let start_time = sorted.iter().map(|m| m.timestamp).min().unwrap_or(sorted[0].timestamp);
    let end_time = sorted.iter().map(|m| m.timestamp).max().unwrap_or(sorted[0].timestamp);
    let duration_ms = (end_time - start_time).num_milliseconds().max(0) as u64;

    // Per-card destination histories, first-move order.
    let mut trajectories: Vec<CardTrajectory> = Vec::new();
    let mut final_placements: HashMap<String, String> = HashMap::new();
    for movement in &sorted {
        match trajectories.iter_mut().find(|t| t.card_id == movement.card_id) {
            Some(t) => t.destinations.push(movement.to_category.clone()),
            None => trajectories.push(CardTrajectory {
                card_id: movement.card_id.clone(),
                card_label: movement.card_label.clone(),
                destinations: vec![movement.to_category.clone()],
            }),
        }
        final_placements.insert(movement.card_id.clone(), movement.to_category.clone());
    }

    let total_moves = sorted.len();
    let unique_cards_moved = trajectories.len();
    let average_moves_per_card = if unique_cards_moved == 0 {
        0.0
    } else {
        total_moves as f64 / unique_cards_moved as f64
    };

    let undo_redo_count = trajectories
        .iter()
        .map(|t| {
            (1..t.destinations.len())
                .filter(|&k| t.destinations[..k].contains(&t.destinations[k]))
                .count()
        })
        .sum();

    let hesitation_events = trajectories
        .iter()
        .filter(|t| t.destinations.len() > config.hesitation_threshold)
        .count();

    let phases = segment_phases(&sorted, start_time, duration_ms, config);
    let decision_time_ms = match (phases.first(), phases.last()) {
        (Some(first), Some(last)) => {
            (last.ended_at - first.started_at).num_milliseconds().max(0) as u64
        }
        _ => 0,
    };

    Ok(ParticipantJourney {
        participant_id,
        session_id,
        start_time,
        end_time,
        duration_ms,
        movements: sorted,
        final_placements,
        trajectories,
        statistics: JourneyStatistics {
            total_moves,
            unique_cards_moved,
            average_moves_per_card,
            undo_redo_count,
            hesitation_events,
        },
        phases,
        decision_time_ms,
    })
}

/// Split the session into phases by fixed elapsed-time fractions of the
/// total duration. Phases with zero movements are omitted; zero-length
/// sessions put every movement in the initial phase.
fn segment_phases(
    sorted: &[CardMovement],
    start_time: DateTime<Utc>,
    duration_ms: u64,
    config: &JourneyConfig,
) -> Vec<JourneyPhase> {
    let windows: [(PhaseKind, f64, f64); 4] = [
        (PhaseKind::Initial, 0.0, config.initial_phase_end),
        (PhaseKind::Exploration, config.initial_phase_end, config.exploration_phase_end),
        (PhaseKind::Refinement, config.exploration_phase_end, config.refinement_phase_end),
        (PhaseKind::Finalization, config.refinement_phase_end, 1.0),
    ];

    if duration_ms == 0 {
        let card_ids = distinct_cards(sorted.iter());
        return vec![JourneyPhase {
            kind: PhaseKind::Initial,
            started_at: start_time,
            ended_at: start_time,
            movement_count: sorted.len(),
            card_ids,
        }];
    }

    let mut phases = Vec::new();
    for (kind, lo, hi) in windows {
        let in_window: Vec<&CardMovement> = sorted
            .iter()
            .filter(|m| {
                let elapsed = (m.timestamp - start_time).num_milliseconds().max(0) as f64;
                let fraction = elapsed / duration_ms as f64;
                // The initial phase includes its lower bound; the rest
                // are half-open (lo, hi].
                if kind == PhaseKind::Initial {
                    fraction <= hi
                } else {
                    fraction > lo && fraction <= hi
                }
            })
            .collect();

        if in_window.is_empty() {
            continue;
        }

        phases.push(JourneyPhase {
            kind,
            started_at: start_time + Duration::milliseconds((duration_ms as f64 * lo).round() as i64),
            ended_at: start_time + Duration::milliseconds((duration_ms as f64 * hi).round() as i64),
            movement_count: in_window.len(),
            card_ids: distinct_cards(in_window.into_iter()),
        });
    }
    phases
}

fn distinct_cards<'a>(movements: impl Iterator<Item = &'a CardMovement>) -> Vec<String> {
    let mut ids = Vec::new();
    for m in movements {
        if !ids.contains(&m.card_id) {
            ids.push(m.card_id.clone());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movement(card: &str, to: &str, index: u32, offset_ms: i64) -> CardMovement {
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        CardMovement {
            card_id: card.into(),
            card_label: format!("Card {card}"),
            from_category: None,
            to_category: to.into(),
            timestamp: base + Duration::milliseconds(offset_ms),
            movement_index: index,
            participant_id: "p1".into(),
            session_id: "sess-1".into(),
        }
    }

    #[test]
    fn empty_movements_are_rejected() {
        let err = analyze_participant_journey(&[], &JourneyConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyMovementSet { .. }));
    }

    #[test]
    fn undo_and_hesitation_detection() {
        // Card 1: X → Y → X. Returning to X is one undo; three moves of
        // one card is one hesitation event.
        let movements = vec![
            movement("1", "X", 0, 0),
            movement("1", "Y", 1, 1000),
            movement("1", "X", 2, 2000),
        ];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        assert_eq!(journey.statistics.undo_redo_count, 1);
        assert_eq!(journey.statistics.hesitation_events, 1);
        assert_eq!(journey.statistics.total_moves, 3);
        assert_eq!(journey.statistics.unique_cards_moved, 1);
        assert!((journey.statistics.average_moves_per_card - 3.0).abs() < 1e-9);
        assert_eq!(journey.final_placements["1"], "X");
    }

    #[test]
    fn unsorted_input_is_reordered_by_index() {
        let movements = vec![
            movement("1", "X", 2, 2000),
            movement("1", "Y", 1, 1000),
            movement("1", "Z", 0, 0),
        ];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        assert_eq!(journey.final_placements["1"], "X");
        assert_eq!(
            journey.trajectories[0].destinations,
            vec!["Z".to_string(), "Y".into(), "X".into()]
        );
    }

    #[test]
    fn start_end_and_duration() {
        let movements = vec![movement("1", "X", 0, 0), movement("2", "Y", 1, 5000)];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        assert_eq!(journey.duration_ms, 5000);
        assert_eq!((journey.end_time - journey.start_time).num_milliseconds(), 5000);
    }

    #[test]
    fn phases_assigned_by_elapsed_fraction() {
        // Duration 10s: moves at 0% (initial), 50% (exploration),
        // 100% (finalization). Refinement is empty and omitted.
        let movements = vec![
            movement("1", "X", 0, 0),
            movement("2", "Y", 1, 5000),
            movement("3", "Z", 2, 10_000),
        ];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        let kinds: Vec<PhaseKind> = journey.phases.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PhaseKind::Initial, PhaseKind::Exploration, PhaseKind::Finalization]
        );
        for phase in &journey.phases {
            assert_eq!(phase.movement_count, 1);
        }
        // Span from the first to the last recorded phase: the initial
        // window starts at 0% and finalization ends at 100%.
        assert_eq!(journey.decision_time_ms, 10_000);
    }

    #[test]
    fn phase_boundaries_are_inclusive_on_the_right() {
        // Move at exactly 20% of a 10s session belongs to Initial.
        let movements = vec![
            movement("1", "X", 0, 0),
            movement("2", "Y", 1, 2000),
            movement("3", "Z", 2, 10_000),
        ];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        let initial = journey
            .phases
            .iter()
            .find(|p| p.kind == PhaseKind::Initial)
            .unwrap();
        assert_eq!(initial.movement_count, 2);
        assert_eq!(initial.card_ids, vec!["1".to_string(), "2".into()]);
    }

    #[test]
    fn zero_duration_session_is_all_initial() {
        let movements = vec![movement("1", "X", 0, 0), movement("2", "Y", 1, 0)];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        assert_eq!(journey.phases.len(), 1);
        assert_eq!(journey.phases[0].kind, PhaseKind::Initial);
        assert_eq!(journey.phases[0].movement_count, 2);
        assert_eq!(journey.decision_time_ms, 0);
    }

    #[test]
    fn refinement_rate_counts_refinement_moves() {
        // Duration 10s: refinement window is (7s, 9s].
        let movements = vec![
            movement("1", "X", 0, 0),
            movement("1", "Y", 1, 8000),
            movement("1", "Z", 2, 8500),
            movement("2", "X", 3, 10_000),
        ];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        assert!((journey.refinement_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn journey_serializes() {
        let movements = vec![movement("1", "X", 0, 0), movement("1", "Y", 1, 1000)];
        let journey =
            analyze_participant_journey(&movements, &JourneyConfig::default()).unwrap();
        let json = serde_json::to_string(&journey).unwrap();
        let back: ParticipantJourney = serde_json::from_str(&json).unwrap();
        assert_eq!(back.participant_id, "p1");
        assert_eq!(back.statistics.total_moves, 2);
    }
}
