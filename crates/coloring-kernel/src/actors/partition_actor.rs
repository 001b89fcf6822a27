//! PartitionActor: owner of one partition's node generation.
//!
//! Each partition is represented by its own actor, providing:
//! - Local ownership of node records (no shared mutable state)
//! - Wholesale generation replacement on every applied phase
//! - Mailbox serialization of phase application

use std::sync::Arc;

use acton_reactive::prelude::*;
use tracing::trace;

use crate::dataflow::{scatter, PartitionId};
use crate::engine::{run_phase, StepParams};
use crate::graph::Node;
use crate::messages::{Gather, GatherResult, PartitionSnapshot, Scatter, ScatterResult, SnapshotPartition};

/// Actor state for a single partition.
#[derive(Clone)]
pub struct PartitionActorState {
    pub partition: PartitionId,
    /// Current generation of this partition's nodes, in id order
    pub nodes: Arc<Vec<Node>>,
    pub params: StepParams,
}

impl Default for PartitionActorState {
    fn default() -> Self {
        Self {
            partition: 0,
            nodes: Arc::new(Vec::new()),
            params: StepParams {
                max_degree: 0,
                seed: 0,
            },
        }
    }
}

impl std::fmt::Debug for PartitionActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionActorState")
            .field("partition", &self.partition)
            .field("nodes", &self.nodes.len())
            .field("uncolored", &self.nodes.iter().filter(|n| !n.is_colored()).count())
            .finish()
    }
}

/// Actor representing one partition of the node set.
///
/// Handles:
/// - `Scatter` - emit this partition's outgoing neighbor messages
/// - `Gather` - join nodes with their inbox, apply the phase, replace the generation
/// - `SnapshotPartition` - report the current generation
pub struct PartitionActor {
    pub partition: PartitionId,
    pub nodes: Vec<Node>,
    pub params: StepParams,
}

impl PartitionActor {
    pub fn new(partition: PartitionId, nodes: Vec<Node>, params: StepParams) -> Self {
        Self {
            partition,
            nodes,
            params,
        }
    }

    /// Spawn this partition actor in the given runtime.
    ///
    /// Responses are broadcast; the coordinator subscribes to them.
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<PartitionActorState>(format!("Partition:{}", self.partition));

        actor.model.partition = self.partition;
        actor.model.nodes = Arc::new(self.nodes);
        actor.model.params = self.params;

        // Scatter only reads the generation
        actor.act_on::<Scatter>(|actor, context| {
            let msg = context.message().clone();
            let broker = actor.broker().clone();
            let partition = actor.model.partition;
            let messages = scatter(actor.model.nodes.iter(), msg.phase);

            trace!(
                partition,
                round = msg.round,
                phase = %msg.phase,
                messages = messages.len(),
                "Scattered neighbor messages"
            );

            Reply::pending(async move {
                broker
                    .broadcast(ScatterResult {
                        correlation_id: msg.correlation_id,
                        partition,
                        messages,
                    })
                    .await;
            })
        });

        actor.mutate_on::<Gather>(|actor, context| {
            let msg = context.message().clone();
            let partition = actor.model.partition;
            let (next, stats) = run_phase(
                &actor.model.nodes,
                &msg.inbox,
                msg.phase,
                actor.model.params,
                msg.round,
            );
            actor.model.nodes = Arc::new(next);

            trace!(
                partition,
                round = msg.round,
                phase = %msg.phase,
                uncolored = stats.uncolored,
                "Applied phase"
            );

            let broker = actor.broker().clone();
            Reply::pending(async move {
                broker
                    .broadcast(GatherResult {
                        correlation_id: msg.correlation_id,
                        partition,
                        stats,
                    })
                    .await;
            })
        });

        actor.act_on::<SnapshotPartition>(|actor, context| {
            let correlation_id = context.message().correlation_id.clone();
            let snapshot = PartitionSnapshot {
                correlation_id,
                partition: actor.model.partition,
                nodes: actor.model.nodes.as_ref().clone(),
            };
            let broker = actor.broker().clone();
            Reply::pending(async move {
                broker.broadcast(snapshot).await;
            })
        });

        actor.start().await
    }
}
