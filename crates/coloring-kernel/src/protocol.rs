//! The per-node coloring protocol: candidate proposal and conflict resolution.
//!
//! Both steps are pure functions of a node record and the values its
//! neighbors sent it this phase. Neither touches shared state, so a superstep
//! can evaluate every node independently and in any order.
//!
//! Randomness comes from [`node_rng`], which derives a generator from the run
//! seed, the round, and the node id. A node therefore draws the same candidate
//! no matter which partition or thread evaluates it.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::graph::{Color, Node, NodeId};

/// The two synchronized phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Neighbors share committed colors; uncolored nodes pick a candidate.
    Propose,
    /// Uncolored neighbors share candidates; non-colliding candidates commit.
    Resolve,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Propose => write!(f, "propose"),
            Self::Resolve => write!(f, "resolve"),
        }
    }
}

/// Outcome classification of a single node in a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Node was already colored and passed through unchanged.
    Unchanged,
    /// Node holds a fresh candidate.
    Proposed,
    /// No free color was available (invariant violation).
    EmptyPalette,
    /// Node committed its candidate.
    Committed,
    /// Node collided or had no candidate; it retries next round.
    Retried,
}

/// Deterministic per-node random source for a given round.
pub fn node_rng(seed: u64, round: usize, node: NodeId) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix(seed, round as u64, node.index() as u64))
}

/// SplitMix64 finalizer over the three inputs.
fn mix(seed: u64, round: u64, node: u64) -> u64 {
    let mut z = seed
        ^ round.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ node.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Colors in the palette `{0 ..= max_degree}` not used by any committed neighbor.
pub fn available_colors(max_degree: usize, committed_neighbors: &[Color]) -> Vec<Color> {
    (0..=max_degree as Color)
        .filter(|c| !committed_neighbors.contains(c))
        .collect()
}

/// Propose a candidate color for `node`.
///
/// `committed_neighbors` holds the committed colors of its colored neighbors;
/// uncolored neighbors contribute nothing. Already-colored nodes are returned
/// unchanged.
pub fn propose_candidate<R: Rng + ?Sized>(
    node: &Node,
    committed_neighbors: &[Color],
    max_degree: usize,
    rng: &mut R,
) -> (Node, StepOutcome) {
    if node.is_colored() {
        return (node.clone(), StepOutcome::Unchanged);
    }

    let available = available_colors(max_degree, committed_neighbors);
    match available.choose(rng) {
        Some(&candidate) => (node.with_candidate(Some(candidate)), StepOutcome::Proposed),
        None => {
            error!(
                node = %node.id,
                degree = node.degree(),
                max_degree,
                "No free color left for uncolored node"
            );
            (node.with_candidate(None), StepOutcome::EmptyPalette)
        }
    }
}

/// Commit or retry `node` given this round's neighbor candidates.
///
/// `neighbor_candidates` holds one entry per *uncolored* neighbor: its
/// candidate for this round, or `None` if it has none. An empty slice means
/// no uncolored neighbor exists and nothing can conflict.
///
/// Collisions are not broken by id or any other priority: every colliding
/// node retries.
pub fn resolve_candidate(node: &Node, neighbor_candidates: &[Option<Color>]) -> (Node, StepOutcome) {
    if node.is_colored() {
        return (node.clone(), StepOutcome::Unchanged);
    }

    match node.candidate {
        Some(candidate) if neighbor_candidates.is_empty() => {
            (node.committed(candidate), StepOutcome::Committed)
        }
        Some(candidate) if !neighbor_candidates.contains(&Some(candidate)) => {
            (node.committed(candidate), StepOutcome::Committed)
        }
        _ => (node.cleared(), StepOutcome::Retried),
    }
}

/// The value `node` sends to each neighbor in `phase`, if any.
///
/// Propose: colored nodes send their committed color. Resolve: uncolored
/// nodes send their candidate (possibly `None`) so receivers can tell "an
/// uncolored neighbor exists" apart from "no uncolored neighbor exists".
pub fn outgoing_value(node: &Node, phase: Phase) -> Option<Option<Color>> {
    match phase {
        Phase::Propose => node.color.map(Some),
        Phase::Resolve if node.is_colored() => None,
        Phase::Resolve => Some(node.candidate),
    }
}

/// Apply `phase` to `node` given its gathered inbox.
pub fn step(
    node: &Node,
    phase: Phase,
    inbox: &[Option<Color>],
    max_degree: usize,
    seed: u64,
    round: usize,
) -> (Node, StepOutcome) {
    match phase {
        Phase::Propose => {
            let committed: Vec<Color> = inbox.iter().flatten().copied().collect();
            let mut rng = node_rng(seed, round, node.id);
            propose_candidate(node, &committed, max_degree, &mut rng)
        }
        Phase::Resolve => resolve_candidate(node, inbox),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uncolored(id: usize, neighbors: &[usize]) -> Node {
        Node::new(NodeId(id), neighbors.iter().map(|&n| NodeId(n)).collect::<Vec<_>>())
    }

    #[test]
    fn test_propose_avoids_committed_neighbor_colors() {
        let node = uncolored(0, &[1, 2]);
        for round in 0..50 {
            let mut rng = node_rng(7, round, node.id);
            let (proposed, outcome) = propose_candidate(&node, &[0, 1], 2, &mut rng);
            assert_eq!(outcome, StepOutcome::Proposed);
            assert_eq!(proposed.candidate, Some(2));
            assert_eq!(proposed.color, None);
        }
    }

    #[test]
    fn test_propose_draws_from_entire_free_palette() {
        let node = uncolored(0, &[1, 2, 3]);
        let mut seen = std::collections::HashSet::new();
        for round in 0..200 {
            let mut rng = node_rng(1, round, node.id);
            let (proposed, _) = propose_candidate(&node, &[], 3, &mut rng);
            seen.insert(proposed.candidate.unwrap());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_propose_with_exhausted_palette_leaves_candidate_unset() {
        let node = uncolored(0, &[1, 2]);
        let mut rng = node_rng(0, 0, node.id);
        let (proposed, outcome) = propose_candidate(&node, &[0, 1], 1, &mut rng);
        assert_eq!(outcome, StepOutcome::EmptyPalette);
        assert_eq!(proposed.candidate, None);
        assert!(!proposed.is_colored());
    }

    #[test]
    fn test_colored_node_is_idempotent() {
        let node = uncolored(4, &[1]).committed(1);
        let mut rng = node_rng(0, 3, node.id);
        assert_eq!(propose_candidate(&node, &[1], 2, &mut rng), (node.clone(), StepOutcome::Unchanged));
        assert_eq!(resolve_candidate(&node, &[Some(1)]), (node.clone(), StepOutcome::Unchanged));
    }

    #[test]
    fn test_resolve_commits_without_uncolored_neighbors() {
        let node = uncolored(0, &[1]).with_candidate(Some(1));
        let (resolved, outcome) = resolve_candidate(&node, &[]);
        assert_eq!(outcome, StepOutcome::Committed);
        assert_eq!(resolved.color, Some(1));
    }

    #[test]
    fn test_resolve_commits_distinct_candidate() {
        let node = uncolored(0, &[1, 2]).with_candidate(Some(0));
        let (resolved, outcome) = resolve_candidate(&node, &[Some(1), None]);
        assert_eq!(outcome, StepOutcome::Committed);
        assert_eq!(resolved.color, Some(0));
    }

    #[test]
    fn test_resolve_collision_retries_both_sides() {
        let a = uncolored(0, &[1]).with_candidate(Some(2));
        let b = uncolored(1, &[0]).with_candidate(Some(2));
        let (ra, oa) = resolve_candidate(&a, &[b.candidate]);
        let (rb, ob) = resolve_candidate(&b, &[a.candidate]);
        assert_eq!((oa, ob), (StepOutcome::Retried, StepOutcome::Retried));
        assert_eq!((ra.color, ra.candidate), (None, None));
        assert_eq!((rb.color, rb.candidate), (None, None));
    }

    #[test]
    fn test_resolve_without_candidate_retries() {
        let node = uncolored(0, &[1]);
        let (resolved, outcome) = resolve_candidate(&node, &[Some(0)]);
        assert_eq!(outcome, StepOutcome::Retried);
        assert!(!resolved.is_colored());
    }

    #[test]
    fn test_outgoing_values_per_phase() {
        let open = uncolored(0, &[1]).with_candidate(Some(1));
        let done = uncolored(1, &[0]).committed(0);

        assert_eq!(outgoing_value(&open, Phase::Propose), None);
        assert_eq!(outgoing_value(&done, Phase::Propose), Some(Some(0)));
        assert_eq!(outgoing_value(&open, Phase::Resolve), Some(Some(1)));
        assert_eq!(outgoing_value(&done, Phase::Resolve), None);
        assert_eq!(outgoing_value(&open.cleared(), Phase::Resolve), Some(None));
    }

    #[test]
    fn test_node_rng_is_reproducible_and_varies() {
        let a: u64 = node_rng(42, 3, NodeId(9)).random();
        let b: u64 = node_rng(42, 3, NodeId(9)).random();
        let c: u64 = node_rng(42, 4, NodeId(9)).random();
        let d: u64 = node_rng(42, 3, NodeId(10)).random();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
