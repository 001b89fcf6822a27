//! Graph store: node records and the immutable generations they live in.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// A color drawn from the palette `{0 ..= max_degree}`.
pub type Color = u32;

/// Unique identifier for a node. Ids are dense: `0..num_nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Index into a generation's node array.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-node protocol state.
///
/// Records are never mutated once published in a [`Generation`]; each phase
/// builds a fresh record via the `with_*` constructors. The neighbor list is
/// shared between generations since topology is fixed after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub neighbors: Arc<[NodeId]>,
    /// Committed color, `None` while uncolored.
    pub color: Option<Color>,
    /// Tentative proposal for the current round. Ignored once committed.
    pub candidate: Option<Color>,
}

impl Node {
    /// A fresh, uncolored node.
    pub fn new(id: NodeId, neighbors: impl Into<Arc<[NodeId]>>) -> Self {
        Self {
            id,
            neighbors: neighbors.into(),
            color: None,
            candidate: None,
        }
    }

    pub fn is_colored(&self) -> bool {
        self.color.is_some()
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Same node, uncolored, proposing `candidate`.
    pub fn with_candidate(&self, candidate: Option<Color>) -> Self {
        Self {
            id: self.id,
            neighbors: Arc::clone(&self.neighbors),
            color: None,
            candidate,
        }
    }

    /// Same node with `color` committed.
    pub fn committed(&self, color: Color) -> Self {
        Self {
            id: self.id,
            neighbors: Arc::clone(&self.neighbors),
            color: Some(color),
            candidate: Some(color),
        }
    }

    /// Same node with both color and candidate cleared, ready to retry.
    pub fn cleared(&self) -> Self {
        self.with_candidate(None)
    }
}

/// One immutable snapshot of every node record, indexed by id.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Round that produced this generation (0 = freshly generated graph).
    pub round: usize,
    pub nodes: Arc<[Node]>,
}

impl Generation {
    pub fn new(round: usize, nodes: Vec<Node>) -> Self {
        Self {
            round,
            nodes: nodes.into(),
        }
    }

    pub fn uncolored(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_colored()).count()
    }
}

/// An undirected bounded-degree graph with fixed topology.
#[derive(Debug, Clone)]
pub struct Graph {
    max_degree: usize,
    nodes: Vec<Node>,
}

impl Graph {
    /// Build a graph from an adjacency list, checking every structural
    /// invariant the protocol depends on.
    pub fn from_adjacency(max_degree: usize, adjacency: Vec<Vec<NodeId>>) -> Result<Self> {
        let n = adjacency.len();
        ensure!(n > 0, "graph must contain at least one node");

        let sets: Vec<BTreeSet<NodeId>> = adjacency
            .iter()
            .map(|ns| ns.iter().copied().collect())
            .collect();

        for (idx, neighbors) in sets.iter().enumerate() {
            let id = NodeId(idx);
            ensure!(
                neighbors.len() == adjacency[idx].len(),
                "node {} has duplicate edges",
                id
            );
            ensure!(
                neighbors.len() <= max_degree,
                "node {} has degree {} above max degree {}",
                id,
                neighbors.len(),
                max_degree
            );
            for &other in neighbors {
                ensure!(other != id, "node {} has a self loop", id);
                ensure!(other.index() < n, "node {} references unknown node {}", id, other);
                ensure!(
                    sets[other.index()].contains(&id),
                    "edge {}-{} is not symmetric",
                    id,
                    other
                );
            }
        }

        let nodes = adjacency
            .into_iter()
            .enumerate()
            .map(|(idx, neighbors)| Node::new(NodeId(idx), neighbors))
            .collect();

        Ok(Self { max_degree, nodes })
    }

    /// Build a graph from an explicit edge list. Repeated edges collapse.
    pub fn from_edges(num_nodes: usize, max_degree: usize, edges: &[(usize, usize)]) -> Result<Self> {
        ensure!(num_nodes > 0, "graph must contain at least one node");
        let mut sets = vec![BTreeSet::new(); num_nodes];
        for &(u, v) in edges {
            ensure!(u < num_nodes && v < num_nodes, "edge {}-{} out of range", u, v);
            ensure!(u != v, "node {} has a self loop", u);
            sets[u].insert(NodeId(v));
            sets[v].insert(NodeId(u));
        }
        let adjacency = sets.into_iter().map(|s| s.into_iter().collect()).collect();
        Self::from_adjacency(max_degree, adjacency)
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum::<usize>() / 2
    }

    /// The initial generation: every node uncolored.
    pub fn initial_generation(&self) -> Generation {
        Generation::new(0, self.nodes.clone())
    }

    /// Whether `u ∈ neighbors(v) ⇔ v ∈ neighbors(u)` holds for every edge.
    pub fn is_symmetric(&self) -> bool {
        self.nodes.iter().all(|node| {
            node.neighbors
                .iter()
                .all(|other| self.nodes[other.index()].neighbors.contains(&node.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges_builds_cycle() {
        let graph = Graph::from_edges(4, 2, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.is_symmetric());
        assert!(graph.nodes().iter().all(|n| n.degree() == 2));
    }

    #[test]
    fn test_from_edges_rejects_degree_overflow() {
        let err = Graph::from_edges(4, 1, &[(0, 1), (0, 2)]).unwrap_err();
        assert!(err.to_string().contains("above max degree"));
    }

    #[test]
    fn test_from_edges_rejects_self_loop() {
        assert!(Graph::from_edges(2, 2, &[(1, 1)]).is_err());
    }

    #[test]
    fn test_from_adjacency_rejects_asymmetric_edge() {
        let adjacency = vec![vec![NodeId(1)], vec![]];
        let err = Graph::from_adjacency(1, adjacency).unwrap_err();
        assert!(err.to_string().contains("not symmetric"));
    }

    #[test]
    fn test_records_are_rebuilt_not_mutated() {
        let node = Node::new(NodeId(3), vec![NodeId(1)]);
        let proposed = node.with_candidate(Some(2));
        let committed = proposed.committed(2);

        assert_eq!(node.candidate, None);
        assert_eq!(proposed.color, None);
        assert_eq!(committed.color, Some(2));
        assert!(Arc::ptr_eq(&node.neighbors, &committed.neighbors));
        assert_eq!(committed.cleared().color, None);
    }
}
