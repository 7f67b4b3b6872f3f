//! End-to-end pipeline test: participant results → similarity matrix →
//! dendrogram, checking the structural invariants the visualization
//! layer relies on.

use sortwise_analysis::clustering::cluster;
use sortwise_analysis::insights::agreement_analysis;
use sortwise_analysis::similarity::similarity_matrix;
use sortwise_core::model::{Card, CategoryPlacement, ParticipantResult, StudyMethod};

fn result(participant: &str, groups: &[(&str, &[&str])]) -> ParticipantResult {
    ParticipantResult {
        participant_id: participant.into(),
        study_id: "study-1".into(),
        method: StudyMethod::OpenSort,
        placements: groups
            .iter()
            .enumerate()
            .map(|(i, (name, cards))| CategoryPlacement {
                id: format!("{participant}-{i}"),
                name: (*name).into(),
                cards: cards.iter().map(|id| Card::new(*id, id.to_uppercase())).collect(),
            })
            .collect(),
    }
}

fn grocery_study() -> Vec<ParticipantResult> {
    vec![
        result(
            "p1",
            &[
                ("Fruit", &["apple", "banana", "cherry"]),
                ("Dairy", &["milk", "yogurt"]),
            ],
        ),
        result(
            "p2",
            &[
                ("Produce", &["apple", "banana"]),
                ("Fridge", &["milk", "yogurt", "cherry"]),
            ],
        ),
        result(
            "p3",
            &[
                ("Fruit", &["apple", "banana", "cherry"]),
                ("Drinks", &["milk"]),
                ("Snacks", &["yogurt"]),
            ],
        ),
    ]
}

#[test]
fn similarity_feeds_clustering() {
    let results = grocery_study();
    let matrix = similarity_matrix(&results);

    assert_eq!(matrix.len(), 5);
    for i in 0..matrix.len() {
        assert!((matrix.values[i][i] - 1.0).abs() < f64::EPSILON);
        for j in 0..matrix.len() {
            assert_eq!(matrix.values[i][j], matrix.values[j][i]);
        }
    }

    let tree = cluster(&matrix);
    assert_eq!(tree.leaves().len(), 5);
    assert_eq!(tree.nodes.len(), 9);
    assert_eq!(tree.nodes[tree.root].leaf_count, 5);

    // apple and banana always co-occur: they merge before anything
    // joins either of them with milk.
    let ids: Vec<&str> = tree
        .leaf_cards(tree.root)
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids.len(), 5);
    let apple_banana_merge = tree
        .nodes
        .iter()
        .find(|n| n.children == Some((0, 1)))
        .expect("apple+banana merge node");
    assert!(apple_banana_merge.distance < 1e-9);
}

#[test]
fn agreement_analysis_over_same_study() {
    let analysis = agreement_analysis(&grocery_study()).unwrap();
    assert_eq!(analysis.participant_count, 3);
    assert_eq!(analysis.card_scores.len(), 5);
    assert!((0.0..=100.0).contains(&analysis.overall_agreement));
    assert_eq!(analysis.matrix.cards.len(), 5);

    // Dendrogram and agreement matrix agree on symmetry invariants.
    for i in 0..5 {
        assert!((analysis.matrix.values[i][i] - 100.0).abs() < f64::EPSILON);
    }
}
