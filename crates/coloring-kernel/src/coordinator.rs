//! Round loop and run entry points.
//!
//! [`RoundCoordinator`] repeats supersteps on an [`Engine`] until no node is
//! uncolored. Liveness is probabilistic: with a palette of `max_degree + 1`
//! colors each uncolored node keeps a non-zero chance per round of drawing a
//! color no neighbor draws, but no round count is guaranteed. Callers that
//! need a bound set `max_rounds`.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::ColoringConfig;
use crate::engine::{Engine, LocalEngine, RoundResult};
use crate::generator::GraphGenerator;
use crate::graph::{Color, Graph, Node, NodeId};
use crate::kernel::ActorEngine;
use crate::validator::{validate, Validation};

/// Summary of the round loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Rounds executed
    pub rounds: usize,
    /// Whether every node ended up colored
    pub converged: bool,
    /// Per-round results, in order
    pub history: Vec<RoundResult>,
}

/// Drives Propose→Resolve supersteps until termination.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundCoordinator {
    /// 0 = no cap
    max_rounds: usize,
}

impl RoundCoordinator {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    /// Run rounds until the uncolored count reaches zero or the cap is hit.
    pub async fn run<E: Engine>(&self, engine: &mut E, initial_uncolored: usize) -> Result<RoundReport> {
        let mut report = RoundReport::default();
        let mut uncolored = initial_uncolored;

        while uncolored > 0 {
            if self.max_rounds > 0 && report.rounds >= self.max_rounds {
                warn!(
                    rounds = report.rounds,
                    uncolored,
                    "Round cap reached before every node was colored"
                );
                break;
            }

            let round = report.rounds + 1;
            let result = engine.superstep(round).await?;

            if result.empty_palette > 0 {
                error!(
                    round,
                    nodes = result.empty_palette,
                    "Nodes found no free color; degree bound violated"
                );
            }

            info!(
                round,
                committed = result.committed,
                retried = result.retried,
                uncolored = result.uncolored,
                "Round complete"
            );

            uncolored = result.uncolored;
            report.rounds = round;
            report.history.push(result);
        }

        report.converged = uncolored == 0;
        Ok(report)
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColoringOutcome {
    /// Final node records, sorted by id
    pub nodes: Vec<Node>,
    /// Committed color per node; uncolored nodes are absent
    pub colors: BTreeMap<NodeId, Color>,
    pub validation: Validation,
    #[serde(flatten)]
    pub report: RoundReport,
}

/// Run the protocol on `graph` using `engine`, then validate.
///
/// The engine is shut down before returning, also when a round fails.
pub async fn color_with_engine<E: Engine>(graph: &Graph, mut engine: E, max_rounds: usize) -> Result<ColoringOutcome> {
    let coordinator = RoundCoordinator::new(max_rounds);
    let run = coordinator.run(&mut engine, graph.len()).await;
    let collected = match run {
        Ok(report) => engine.collect().await.map(|nodes| (report, nodes)),
        Err(e) => Err(e),
    };
    engine.shutdown().await?;
    let (report, nodes) = collected?;

    let colors: BTreeMap<NodeId, Color> = nodes
        .iter()
        .filter_map(|n| n.color.map(|c| (n.id, c)))
        .collect();
    let validation = validate(&colors, graph.nodes());

    info!(
        rounds = report.rounds,
        converged = report.converged,
        valid = validation.is_valid(),
        "Coloring finished"
    );

    Ok(ColoringOutcome {
        nodes,
        colors,
        validation,
        report,
    })
}

/// Generate a graph and color it on partition actors.
pub async fn color_graph(config: &ColoringConfig) -> Result<ColoringOutcome> {
    config.validate()?;
    let graph = GraphGenerator::new(config.generator()).generate()?;
    let engine = ActorEngine::launch(&graph, config.partitions, config.seed).await;
    color_with_engine(&graph, engine, config.max_rounds).await
}

/// Generate a graph and color it in-process.
pub async fn color_graph_local(config: &ColoringConfig) -> Result<ColoringOutcome> {
    config.validate()?;
    let graph = GraphGenerator::new(config.generator()).generate()?;
    let engine = LocalEngine::new(&graph, config.partitions, config.seed);
    color_with_engine(&graph, engine, config.max_rounds).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_nodes: usize, max_degree: usize, seed: u64) -> ColoringConfig {
        ColoringConfig {
            num_nodes,
            max_degree,
            seed,
            partitions: 3,
            max_rounds: 200,
        }
    }

    #[tokio::test]
    async fn test_single_node_commits_in_one_round() {
        for max_degree in [0, 1, 4] {
            let outcome = color_graph_local(&config(1, max_degree, 5)).await.unwrap();
            assert_eq!(outcome.report.rounds, 1);
            assert!(outcome.report.converged);
            assert!((outcome.colors[&NodeId(0)] as usize) <= max_degree);
        }
    }

    #[tokio::test]
    async fn test_edgeless_graph_commits_in_round_one() {
        let outcome = color_graph_local(&config(50, 0, 11)).await.unwrap();
        assert_eq!(outcome.report.rounds, 1);
        assert!(outcome.validation.is_valid());
        assert!(outcome.colors.values().all(|&c| c == 0));
    }

    #[tokio::test]
    async fn test_cycle_colors_properly() {
        let graph = Graph::from_edges(4, 2, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        for seed in 0..25 {
            let engine = LocalEngine::new(&graph, 2, seed);
            let outcome = color_with_engine(&graph, engine, 200).await.unwrap();
            assert!(outcome.report.converged, "seed {seed} did not converge");
            assert!(outcome.validation.is_valid(), "seed {seed} produced a clash");
        }
    }

    #[tokio::test]
    async fn test_validity_grid() {
        for num_nodes in [1, 10, 100] {
            for max_degree in [0, 1, 2, 4] {
                let outcome = color_graph_local(&config(num_nodes, max_degree, 42)).await.unwrap();
                assert!(outcome.report.converged, "n={num_nodes} d={max_degree}");
                assert!(outcome.validation.is_valid(), "n={num_nodes} d={max_degree}");
                assert_eq!(outcome.colors.len(), num_nodes);
            }
        }
    }

    #[tokio::test]
    async fn test_terminates_under_cap_across_seeds() {
        for seed in 0..30 {
            let outcome = color_graph_local(&config(100, 4, seed)).await.unwrap();
            assert!(outcome.report.converged, "seed {seed}");
            assert!(outcome.report.rounds <= 200);
        }
    }

    #[tokio::test]
    async fn test_committed_colors_never_change() {
        let graph = GraphGenerator::new(config(80, 3, 9).generator()).generate().unwrap();
        let mut engine = LocalEngine::new(&graph, 4, 9).retaining_history();
        let report = RoundCoordinator::new(200).run(&mut engine, graph.len()).await.unwrap();
        assert!(report.converged);

        let history = engine.history();
        for pair in history.windows(2) {
            for (before, after) in pair[0].nodes.iter().zip(pair[1].nodes.iter()) {
                if let Some(color) = before.color {
                    assert_eq!(after.color, Some(color), "node {} changed color", before.id);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_partition_count_does_not_change_result() {
        let base = color_graph_local(&ColoringConfig { partitions: 1, ..config(60, 3, 17) })
            .await
            .unwrap();
        let split = color_graph_local(&ColoringConfig { partitions: 7, ..config(60, 3, 17) })
            .await
            .unwrap();
        assert_eq!(base.colors, split.colors);
        assert_eq!(base.report.rounds, split.report.rounds);
    }

    /// Engine whose nodes never commit.
    struct StuckEngine {
        uncolored: usize,
    }

    impl Engine for StuckEngine {
        async fn superstep(&mut self, round: usize) -> Result<RoundResult> {
            Ok(RoundResult {
                round,
                proposed: self.uncolored,
                retried: self.uncolored,
                uncolored: self.uncolored,
                ..Default::default()
            })
        }

        async fn collect(&mut self) -> Result<Vec<Node>> {
            Ok(Vec::new())
        }

        async fn shutdown(self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_round_cap_reports_unconverged() {
        let mut engine = StuckEngine { uncolored: 3 };
        let report = RoundCoordinator::new(5).run(&mut engine, 3).await.unwrap();
        assert_eq!(report.rounds, 5);
        assert!(!report.converged);
        assert_eq!(report.history.len(), 5);
    }

    #[tokio::test]
    async fn test_capped_outcome_flags_uncolored_nodes() {
        let graph = Graph::from_edges(2, 1, &[(0, 1)]).unwrap();
        let outcome = color_with_engine(&graph, StuckEngine { uncolored: 2 }, 2)
            .await
            .unwrap();
        assert!(!outcome.report.converged);
        assert!(outcome.colors.is_empty());
        assert!(!outcome.validation.is_valid());
    }

    #[tokio::test]
    async fn test_nothing_to_color_runs_no_rounds() {
        let mut engine = StuckEngine { uncolored: 0 };
        let report = RoundCoordinator::new(0).run(&mut engine, 0).await.unwrap();
        assert_eq!(report.rounds, 0);
        assert!(report.converged);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_running() {
        assert!(color_graph_local(&config(0, 2, 1)).await.is_err());
    }
}
