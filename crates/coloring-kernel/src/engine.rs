//! Execution substrates for supersteps.
//!
//! The [`Engine`] trait is the seam between the round loop and whatever runs
//! the per-node work. [`LocalEngine`] executes every partition in-process;
//! [`crate::kernel::ActorEngine`] runs each partition in its own actor.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dataflow::{group_by_target, join_map, scatter, Inbox, Partitioner};
use crate::graph::{Generation, Graph, Node};
use crate::protocol::{step, Phase, StepOutcome};

/// Counters for one phase over a set of nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub proposed: usize,
    pub empty_palette: usize,
    pub committed: usize,
    pub retried: usize,
    /// Nodes still uncolored after the phase
    pub uncolored: usize,
}

impl PhaseStats {
    fn record(&mut self, node: &Node, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Unchanged => {}
            StepOutcome::Proposed => self.proposed += 1,
            StepOutcome::EmptyPalette => self.empty_palette += 1,
            StepOutcome::Committed => self.committed += 1,
            StepOutcome::Retried => self.retried += 1,
        }
        if !node.is_colored() {
            self.uncolored += 1;
        }
    }

    /// Sum counters from several partitions.
    pub fn merge(&mut self, other: &PhaseStats) {
        self.proposed += other.proposed;
        self.empty_palette += other.empty_palette;
        self.committed += other.committed;
        self.retried += other.retried;
        self.uncolored += other.uncolored;
    }
}

/// Protocol parameters shared by every node in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepParams {
    pub max_degree: usize,
    pub seed: u64,
}

/// Apply one phase to a partition's nodes, producing the next generation of
/// those records.
pub fn run_phase(
    nodes: &[Node],
    inbox: &Inbox,
    phase: Phase,
    params: StepParams,
    round: usize,
) -> (Vec<Node>, PhaseStats) {
    let mut stats = PhaseStats::default();
    let next = join_map(nodes, inbox, |node, values| {
        let (next, outcome) = step(node, phase, values, params.max_degree, params.seed, round);
        stats.record(&next, outcome);
        next
    });
    (next, stats)
}

/// Result of a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// 1-based round number
    pub round: usize,
    /// Candidates drawn in the propose phase
    pub proposed: usize,
    /// Nodes that found no free color (should stay 0)
    pub empty_palette: usize,
    /// Nodes that committed this round
    pub committed: usize,
    /// Nodes that collided or lacked a candidate
    pub retried: usize,
    /// Nodes still uncolored after the round
    pub uncolored: usize,
}

impl RoundResult {
    pub fn from_phases(round: usize, propose: &PhaseStats, resolve: &PhaseStats) -> Self {
        Self {
            round,
            proposed: propose.proposed,
            empty_palette: propose.empty_palette,
            committed: resolve.committed,
            retried: resolve.retried,
            uncolored: resolve.uncolored,
        }
    }
}

/// A substrate able to run coloring supersteps over a loaded graph.
#[allow(async_fn_in_trait)]
pub trait Engine {
    /// Run one Propose→Resolve round. Returns only after every node finished
    /// both phases.
    async fn superstep(&mut self, round: usize) -> anyhow::Result<RoundResult>;

    /// Gather the current generation, sorted by id.
    async fn collect(&mut self) -> anyhow::Result<Vec<Node>>;

    /// Release the substrate.
    async fn shutdown(self) -> anyhow::Result<()>;
}

/// In-process engine: partitions are plain vectors processed one after the
/// other, with the shuffle done between them.
pub struct LocalEngine {
    partitioner: Partitioner,
    params: StepParams,
    partitions: Vec<Vec<Node>>,
    /// Generations retained for inspection, oldest first.
    history: Vec<Generation>,
    retain_history: bool,
}

impl LocalEngine {
    pub fn new(graph: &Graph, partitions: usize, seed: u64) -> Self {
        let partitioner = Partitioner::new(partitions);
        Self {
            partitions: partitioner.split(graph.nodes()),
            partitioner,
            params: StepParams {
                max_degree: graph.max_degree(),
                seed,
            },
            history: Vec::new(),
            retain_history: false,
        }
    }

    /// Keep a copy of every generation produced by a round.
    pub fn retaining_history(mut self) -> Self {
        self.retain_history = true;
        self
    }

    pub fn history(&self) -> &[Generation] {
        &self.history
    }

    fn phase(&mut self, phase: Phase, round: usize) -> PhaseStats {
        let messages = scatter(self.partitions.iter().flatten(), phase);
        let routed = self.partitioner.route(group_by_target(messages));
        trace!(%phase, round, "Shuffled neighbor messages");

        let mut total = PhaseStats::default();
        let next: Vec<Vec<Node>> = self
            .partitions
            .iter()
            .zip(&routed)
            .map(|(nodes, inbox)| {
                let (next, stats) = run_phase(nodes, inbox, phase, self.params, round);
                total.merge(&stats);
                next
            })
            .collect();
        self.partitions = next;
        total
    }

    fn snapshot(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.partitions.iter().flatten().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }
}

impl Engine for LocalEngine {
    async fn superstep(&mut self, round: usize) -> anyhow::Result<RoundResult> {
        let propose = self.phase(Phase::Propose, round);
        debug!(round, proposed = propose.proposed, "Propose phase complete");
        let resolve = self.phase(Phase::Resolve, round);
        debug!(round, committed = resolve.committed, "Resolve phase complete");

        if self.retain_history {
            let generation = Generation::new(round, self.snapshot());
            self.history.push(generation);
        }
        Ok(RoundResult::from_phases(round, &propose, &resolve))
    }

    async fn collect(&mut self) -> anyhow::Result<Vec<Node>> {
        Ok(self.snapshot())
    }

    async fn shutdown(self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    #[test]
    fn test_run_phase_counts_outcomes() {
        let nodes = vec![
            Node::new(NodeId(0), vec![NodeId(1)]).with_candidate(Some(1)),
            Node::new(NodeId(1), vec![NodeId(0)]).with_candidate(Some(1)),
        ];
        let inbox = group_by_target(scatter(&nodes, Phase::Resolve));
        let params = StepParams { max_degree: 1, seed: 0 };
        let (next, stats) = run_phase(&nodes, &inbox, Phase::Resolve, params, 1);

        assert_eq!(stats.retried, 2);
        assert_eq!(stats.uncolored, 2);
        assert!(next.iter().all(|n| n.candidate.is_none()));
    }

    #[test]
    fn test_merge_sums_counters() {
        let mut a = PhaseStats { committed: 2, uncolored: 1, ..Default::default() };
        a.merge(&PhaseStats { committed: 3, retried: 4, ..Default::default() });
        assert_eq!(a.committed, 5);
        assert_eq!(a.retried, 4);
        assert_eq!(a.uncolored, 1);
    }
}
