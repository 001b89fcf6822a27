//! Bounded-degree random graph generator.
//!
//! Wires each node to randomly chosen partners until it reaches a randomly
//! drawn target degree, never pushing any node past `max_degree`.

use anyhow::{ensure, Result};
use rand::prelude::*;
use tracing::debug;

use crate::graph::{Graph, NodeId};

/// Configuration for graph generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of nodes
    pub num_nodes: usize,
    /// Upper bound on every node's degree
    pub max_degree: usize,
    /// Seed for reproducible wiring
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_nodes: 1000,
            max_degree: 2,
            seed: 42,
        }
    }
}

/// Random graph generator.
pub struct GraphGenerator {
    config: GeneratorConfig,
}

impl GraphGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate a symmetric graph whose degrees never exceed `max_degree`.
    pub fn generate(&self) -> Result<Graph> {
        let GeneratorConfig {
            num_nodes,
            max_degree,
            seed,
        } = self.config;
        ensure!(num_nodes > 0, "num_nodes must be positive, got {}", num_nodes);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut adjacency: Vec<Vec<NodeId>> = vec![Vec::new(); num_nodes];

        for node in 0..num_nodes {
            let target = rng.random_range(0..=max_degree);
            let mut candidates: Vec<usize> = (0..num_nodes).filter(|&other| other != node).collect();

            while adjacency[node].len() < target && !candidates.is_empty() {
                let other = candidates.swap_remove(rng.random_range(0..candidates.len()));
                if adjacency[other].len() >= max_degree
                    || adjacency[node].contains(&NodeId(other))
                {
                    continue;
                }
                adjacency[node].push(NodeId(other));
                adjacency[other].push(NodeId(node));
            }
        }

        let graph = Graph::from_adjacency(max_degree, adjacency)?;
        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            max_degree,
            seed,
            "Generated random graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(num_nodes: usize, max_degree: usize, seed: u64) -> Graph {
        GraphGenerator::new(GeneratorConfig {
            num_nodes,
            max_degree,
            seed,
        })
        .generate()
        .unwrap()
    }

    #[test]
    fn test_generated_graph_is_symmetric_and_bounded() {
        for seed in 0..20 {
            for max_degree in [0, 1, 2, 4, 7] {
                let graph = generate(60, max_degree, seed);
                assert!(graph.is_symmetric());
                assert!(graph.nodes().iter().all(|n| n.degree() <= max_degree));
            }
        }
    }

    #[test]
    fn test_zero_max_degree_is_edgeless() {
        let graph = generate(25, 0, 7);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_same_seed_same_graph() {
        let a = generate(200, 3, 99);
        let b = generate(200, 3, 99);
        assert_eq!(a.nodes(), b.nodes());
    }

    #[test]
    fn test_single_node_has_no_neighbors() {
        let graph = generate(1, 4, 42);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.nodes()[0].degree(), 0);
    }

    #[test]
    fn test_zero_nodes_fails_fast() {
        let err = GraphGenerator::new(GeneratorConfig {
            num_nodes: 0,
            max_degree: 2,
            seed: 1,
        })
        .generate()
        .unwrap_err();
        assert!(err.to_string().contains("num_nodes"));
    }
}
