//! Average-linkage agglomerative clustering over a similarity matrix.
//!
//! Produces a dendrogram: a binary merge tree with one leaf per card and
//! exactly n−1 internal nodes. Nodes live in an index-addressed arena
//! (children/parent are indices, not owning pointers) so the tree is
//! trivial to serialize for the visualization layer.
//!
//! The naïve O(n³) scan is deliberate: studies run tens to low hundreds
//! of cards. When several cluster pairs share the minimum distance, the
//! first pair found wins — the scan goes over the active cluster list in
//! ascending (i, j) order with i < j, and a merged cluster is appended
//! at the end of the list. Downstream results depend on this order;
//! do not change it without versioning the output.

use serde::{Deserialize, Serialize};

use sortwise_core::model::Card;

use crate::similarity::SimilarityMatrix;

/// One node of the dendrogram arena.
///
/// Leaves wrap a card and have distance 0; internal nodes have exactly
/// two children and record the average-linkage distance at which they
/// were merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNode {
    /// The wrapped card, for leaves only.
    pub card: Option<Card>,
    /// Arena indices of the two merged children, for internal nodes only.
    pub children: Option<(usize, usize)>,
    /// Arena index of the parent, `None` for the root.
    pub parent: Option<usize>,
    /// Merge distance (1 − similarity scale). 0 for leaves.
    pub distance: f64,
    /// Number of leaves underneath this node (1 for leaves).
    pub leaf_count: usize,
}

impl ClusterNode {
    pub fn is_leaf(&self) -> bool {
        self.card.is_some()
    }
}

/// The binary merge tree produced by [`cluster`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dendrogram {
    /// All nodes; leaves occupy the first n slots in card order.
    pub nodes: Vec<ClusterNode>,
    /// Arena index of the root node.
    pub root: usize,
}

impl Dendrogram {
    /// Indices of all leaf nodes, in card order.
    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i)
            .collect()
    }

    /// Cards under the given node, left subtree first.
    pub fn leaf_cards(&self, node: usize) -> Vec<&Card> {
        let mut cards = Vec::new();
        let mut stack = vec![node];
        while let Some(idx) = stack.pop() {
            let n = &self.nodes[idx];
            if let Some(card) = &n.card {
                cards.push(card);
            }
            if let Some((left, right)) = n.children {
                // Push right first so left is visited first.
                stack.push(right);
                stack.push(left);
            }
        }
        cards
    }
}

/// An active cluster during agglomeration: its arena node plus the
/// original leaf indices it covers, kept flat so average linkage stays
/// a mean over original pairwise distances.
struct ActiveCluster {
    node: usize,
    members: Vec<usize>,
}

/// Cluster the matrix's cards by repeated minimum-distance merging.
///
/// Degenerate input (zero cards) returns a single placeholder empty
/// node so callers always get a tree to walk.
pub fn cluster(matrix: &SimilarityMatrix) -> Dendrogram {
    let n = matrix.len();
    if n == 0 {
        return Dendrogram {
            nodes: vec![ClusterNode {
                card: None,
                children: None,
                parent: None,
                distance: 0.0,
                leaf_count: 0,
            }],
            root: 0,
        };
    }
    tracing::debug!(cards = n, "clustering similarity matrix");

    // Leaf-to-leaf distances: 1 − similarity.
    let dist: Vec<Vec<f64>> = matrix
        .values
        .iter()
        .map(|row| row.iter().map(|s| 1.0 - s).collect())
        .collect();

    let mut nodes: Vec<ClusterNode> = matrix
        .cards
        .iter()
        .map(|card| ClusterNode {
            card: Some(card.clone()),
            children: None,
            parent: None,
            distance: 0.0,
            leaf_count: 1,
        })
        .collect();

    let mut active: Vec<ActiveCluster> = (0..n)
        .map(|i| ActiveCluster {
            node: i,
            members: vec![i],
        })
        .collect();

    while active.len() > 1 {
        let mut best = (0, 1);
        let mut best_dist = f64::INFINITY;
        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                let d = average_linkage(&dist, &active[i].members, &active[j].members);
                if d < best_dist {
                    best_dist = d;
                    best = (i, j);
                }
            }
        }

        let (i, j) = best;
        // Remove the later entry first so the earlier index stays valid.
        let right = active.remove(j);
        let left = active.remove(i);

        let merged_node = nodes.len();
        nodes[left.node].parent = Some(merged_node);
        nodes[right.node].parent = Some(merged_node);

        let mut members = left.members;
        members.extend(right.members);

        nodes.push(ClusterNode {
            card: None,
            children: Some((left.node, right.node)),
            parent: None,
            distance: best_dist,
            leaf_count: nodes[left.node].leaf_count + nodes[right.node].leaf_count,
        });

        active.push(ActiveCluster {
            node: merged_node,
            members,
        });
    }

    let root = active[0].node;
    Dendrogram { nodes, root }
}

/// Mean pairwise leaf-to-leaf distance across two member sets.
fn average_linkage(dist: &[Vec<f64>], a: &[usize], b: &[usize]) -> f64 {
    let mut sum = 0.0;
    for &x in a {
        for &y in b {
            sum += dist[x][y];
        }
    }
    sum / (a.len() * b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(cards: &[&str], values: Vec<Vec<f64>>) -> SimilarityMatrix {
        SimilarityMatrix {
            cards: cards
                .iter()
                .map(|id| Card::new(*id, id.to_uppercase()))
                .collect(),
            values,
        }
    }

    #[test]
    fn empty_matrix_yields_placeholder_node() {
        let tree = cluster(&matrix(&[], vec![]));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root, 0);
        let node = &tree.nodes[0];
        assert!(node.card.is_none());
        assert!(node.children.is_none());
        assert_eq!(node.leaf_count, 0);
    }

    #[test]
    fn single_card_is_its_own_tree() {
        let tree = cluster(&matrix(&["a"], vec![vec![1.0]]));
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.nodes[tree.root].is_leaf());
        assert_eq!(tree.nodes[tree.root].leaf_count, 1);
    }

    #[test]
    fn n_leaves_produce_n_minus_one_merges() {
        let tree = cluster(&matrix(
            &["a", "b", "c", "d"],
            vec![
                vec![1.0, 0.9, 0.1, 0.2],
                vec![0.9, 1.0, 0.2, 0.1],
                vec![0.1, 0.2, 1.0, 0.8],
                vec![0.2, 0.1, 0.8, 1.0],
            ],
        ));
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 4);
        let internal = tree.nodes.iter().filter(|n| !n.is_leaf()).count();
        assert_eq!(internal, 3);
        assert_eq!(tree.nodes[tree.root].leaf_count, 4);
        assert!(tree.nodes[tree.root].parent.is_none());
    }

    #[test]
    fn closest_pair_merges_first() {
        let tree = cluster(&matrix(
            &["a", "b", "c"],
            vec![
                vec![1.0, 0.9, 0.0],
                vec![0.9, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        ));
        // First merge is nodes.len() == 3: must join a and b at distance 0.1.
        let first_merge = &tree.nodes[3];
        assert_eq!(first_merge.children, Some((0, 1)));
        assert!((first_merge.distance - 0.1).abs() < 1e-9);
    }

    #[test]
    fn tie_broken_by_first_pair_found() {
        // All pairs equidistant: (a, b) must merge first.
        let tree = cluster(&matrix(
            &["a", "b", "c"],
            vec![
                vec![1.0, 0.5, 0.5],
                vec![0.5, 1.0, 0.5],
                vec![0.5, 0.5, 1.0],
            ],
        ));
        assert_eq!(tree.nodes[3].children, Some((0, 1)));
    }

    #[test]
    fn parents_are_consistent_with_children() {
        let tree = cluster(&matrix(
            &["a", "b", "c", "d"],
            vec![
                vec![1.0, 0.7, 0.3, 0.0],
                vec![0.7, 1.0, 0.4, 0.1],
                vec![0.3, 0.4, 1.0, 0.6],
                vec![0.0, 0.1, 0.6, 1.0],
            ],
        ));
        for (idx, node) in tree.nodes.iter().enumerate() {
            if let Some((l, r)) = node.children {
                assert_eq!(tree.nodes[l].parent, Some(idx));
                assert_eq!(tree.nodes[r].parent, Some(idx));
                assert_eq!(
                    node.leaf_count,
                    tree.nodes[l].leaf_count + tree.nodes[r].leaf_count
                );
            }
        }
    }

    #[test]
    fn leaf_cards_walks_left_first() {
        let tree = cluster(&matrix(
            &["a", "b", "c"],
            vec![
                vec![1.0, 0.9, 0.0],
                vec![0.9, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        ));
        let ids: Vec<&str> = tree
            .leaf_cards(tree.root)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
