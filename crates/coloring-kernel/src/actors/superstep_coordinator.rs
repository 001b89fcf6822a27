//! SuperstepCoordinator: drives the barriers of a round across partitions.
//!
//! A round is two phases, each run as scatter then gather:
//! 1. Superstep → Scatter(Propose) → PartitionActors
//! 2. ScatterResult × partitions → shuffle → Gather(Propose) → PartitionActors
//! 3. GatherResult × partitions → Scatter(Resolve) → PartitionActors
//! 4. ScatterResult × partitions → shuffle → Gather(Resolve) → PartitionActors
//! 5. GatherResult × partitions → SuperstepComplete (broadcast)
//!
//! Each barrier waits for exactly one response per partition before the next
//! step starts, so no partition ever sees messages from another phase or round.

use acton_reactive::prelude::*;
use dashmap::DashMap;
use mti::prelude::*;
use tracing::{debug, trace, warn};

use crate::dataflow::{Inbox, Partitioner};
use crate::engine::{PhaseStats, RoundResult};
use crate::graph::Node;
use crate::messages::{
    CollectNodes, Gather, GatherResult, NodesCollected, PartitionSnapshot, RegisterPartitions,
    Scatter, ScatterResult, SnapshotPartition, Superstep, SuperstepComplete,
};
use crate::protocol::Phase;

/// Tracks a scatter barrier.
#[derive(Debug, Clone)]
struct PendingScatter {
    round: usize,
    phase: Phase,
    /// Partitions that have not answered yet
    remaining: usize,
    inbox: Inbox,
    /// Propose counters, carried into the resolve phase
    propose: Option<PhaseStats>,
}

/// Tracks a gather barrier.
#[derive(Debug, Clone)]
struct PendingGather {
    round: usize,
    phase: Phase,
    remaining: usize,
    stats: PhaseStats,
    propose: Option<PhaseStats>,
}

/// Tracks a snapshot collection.
#[derive(Debug, Clone)]
struct PendingCollect {
    remaining: usize,
    nodes: Vec<Node>,
}

/// Actor state for SuperstepCoordinator.
#[derive(Default)]
pub struct SuperstepCoordinatorState {
    /// Handles to PartitionActors, indexed by partition id
    partitions: Vec<ActorHandle>,
    pending_scatters: DashMap<String, PendingScatter>,
    pending_gathers: DashMap<String, PendingGather>,
    pending_collects: DashMap<String, PendingCollect>,
    /// Last round started
    current_round: usize,
}

impl Clone for SuperstepCoordinatorState {
    fn clone(&self) -> Self {
        let pending_scatters = DashMap::new();
        for entry in self.pending_scatters.iter() {
            pending_scatters.insert(entry.key().clone(), entry.value().clone());
        }

        let pending_gathers = DashMap::new();
        for entry in self.pending_gathers.iter() {
            pending_gathers.insert(entry.key().clone(), entry.value().clone());
        }

        let pending_collects = DashMap::new();
        for entry in self.pending_collects.iter() {
            pending_collects.insert(entry.key().clone(), entry.value().clone());
        }

        Self {
            partitions: self.partitions.clone(),
            pending_scatters,
            pending_gathers,
            pending_collects,
            current_round: self.current_round,
        }
    }
}

impl std::fmt::Debug for SuperstepCoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperstepCoordinatorState")
            .field("partitions", &self.partitions.len())
            .field("pending_scatters", &self.pending_scatters.len())
            .field("pending_gathers", &self.pending_gathers.len())
            .field("pending_collects", &self.pending_collects.len())
            .field("current_round", &self.current_round)
            .finish()
    }
}

/// Central coordinator actor for supersteps.
///
/// Partitions are registered via `RegisterPartitions`. Partition responses
/// arrive as broker broadcasts keyed by correlation ID.
pub struct SuperstepCoordinator;

impl SuperstepCoordinator {
    /// Spawn the coordinator. Partitions must be registered before the first
    /// `Superstep`.
    pub async fn spawn(runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor = runtime
            .new_actor_with_name::<SuperstepCoordinatorState>("SuperstepCoordinator".to_string());

        // Subscribe to partition responses BEFORE starting
        actor.handle().subscribe::<ScatterResult>().await;
        actor.handle().subscribe::<GatherResult>().await;
        actor.handle().subscribe::<PartitionSnapshot>().await;

        configure_handlers(&mut actor);

        actor.start().await
    }
}

/// Open a scatter barrier and send `Scatter` to every partition.
fn begin_scatter(
    state: &mut SuperstepCoordinatorState,
    round: usize,
    phase: Phase,
    propose: Option<PhaseStats>,
) -> Vec<(ActorHandle, Scatter)> {
    let correlation_id = "scatter".create_type_id::<V7>().to_string();
    state.pending_scatters.insert(
        correlation_id.clone(),
        PendingScatter {
            round,
            phase,
            remaining: state.partitions.len(),
            inbox: Inbox::default(),
            propose,
        },
    );

    trace!(
        correlation_id = %correlation_id,
        round,
        %phase,
        partitions = state.partitions.len(),
        "Starting scatter"
    );

    state
        .partitions
        .iter()
        .map(|handle| {
            let msg = Scatter {
                correlation_id: correlation_id.clone(),
                round,
                phase,
            };
            (handle.clone(), msg)
        })
        .collect()
}

/// Configure all message handlers for the coordinator.
fn configure_handlers(actor: &mut ManagedActor<Idle, SuperstepCoordinatorState>) {
    actor.mutate_on::<RegisterPartitions>(|actor, context| {
        actor.model.partitions = context.message().actors.clone();
        debug!(partitions = actor.model.partitions.len(), "Registered partition actors");
        Reply::ready()
    });

    // Superstep - open the propose scatter barrier
    actor.mutate_on::<Superstep>(|actor, context| {
        let round = context.message().round;
        actor.model.current_round = round;

        if actor.model.partitions.is_empty() {
            warn!(round, "SuperstepCoordinator: no partitions registered");
            return Reply::ready();
        }

        let requests = begin_scatter(&mut actor.model, round, Phase::Propose, None);
        Reply::pending(async move {
            for (handle, msg) in requests {
                handle.send(msg).await;
            }
        })
    });

    // ScatterResult - accumulate messages, then shuffle to owners
    actor.mutate_on::<ScatterResult>(|actor, context| {
        let result = context.message().clone();
        let correlation_id = result.correlation_id.clone();

        let Some(mut pending) = actor.model.pending_scatters.get_mut(&correlation_id) else {
            warn!(
                correlation_id = %correlation_id,
                partition = result.partition,
                "Received scatter result for unknown correlation ID"
            );
            return Reply::ready();
        };

        pending.inbox.extend(result.messages);
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining > 0 {
            return Reply::ready();
        }
        drop(pending); // Release the lock before removing

        let Some((_, pending)) = actor.model.pending_scatters.remove(&correlation_id) else {
            return Reply::ready();
        };

        let partitioner = Partitioner::new(actor.model.partitions.len());
        let messages = pending.inbox.messages();
        let routed = partitioner.route(pending.inbox);

        let gather_id = "gather".create_type_id::<V7>().to_string();
        actor.model.pending_gathers.insert(
            gather_id.clone(),
            PendingGather {
                round: pending.round,
                phase: pending.phase,
                remaining: actor.model.partitions.len(),
                stats: PhaseStats::default(),
                propose: pending.propose,
            },
        );

        trace!(
            correlation_id = %gather_id,
            round = pending.round,
            phase = %pending.phase,
            messages,
            "Scatter barrier reached, delivering inboxes"
        );

        let requests: Vec<_> = actor
            .model
            .partitions
            .iter()
            .cloned()
            .zip(routed)
            .map(|(handle, inbox)| {
                let msg = Gather {
                    correlation_id: gather_id.clone(),
                    round: pending.round,
                    phase: pending.phase,
                    inbox,
                };
                (handle, msg)
            })
            .collect();

        Reply::pending(async move {
            for (handle, msg) in requests {
                handle.send(msg).await;
            }
        })
    });

    // GatherResult - merge counters, then advance the phase or finish the round
    actor.mutate_on::<GatherResult>(|actor, context| {
        let result = context.message().clone();
        let correlation_id = result.correlation_id.clone();

        let Some(mut pending) = actor.model.pending_gathers.get_mut(&correlation_id) else {
            warn!(
                correlation_id = %correlation_id,
                partition = result.partition,
                "Received gather result for unknown correlation ID"
            );
            return Reply::ready();
        };

        pending.stats.merge(&result.stats);
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining > 0 {
            return Reply::ready();
        }
        drop(pending); // Release the lock before removing

        let Some((_, pending)) = actor.model.pending_gathers.remove(&correlation_id) else {
            return Reply::ready();
        };

        match pending.phase {
            Phase::Propose => {
                debug!(
                    round = pending.round,
                    proposed = pending.stats.proposed,
                    "Propose phase complete"
                );
                let requests = begin_scatter(
                    &mut actor.model,
                    pending.round,
                    Phase::Resolve,
                    Some(pending.stats),
                );
                Reply::pending(async move {
                    for (handle, msg) in requests {
                        handle.send(msg).await;
                    }
                })
            }
            Phase::Resolve => {
                let propose = pending.propose.unwrap_or_default();
                let result = RoundResult::from_phases(pending.round, &propose, &pending.stats);
                debug!(
                    round = result.round,
                    committed = result.committed,
                    uncolored = result.uncolored,
                    "Resolve phase complete"
                );
                let broker = actor.broker().clone();
                Reply::pending(async move {
                    broker.broadcast(SuperstepComplete { result }).await;
                })
            }
        }
    });

    // CollectNodes - snapshot every partition
    actor.mutate_on::<CollectNodes>(|actor, _context| {
        let correlation_id = "collect".create_type_id::<V7>().to_string();
        actor.model.pending_collects.insert(
            correlation_id.clone(),
            PendingCollect {
                remaining: actor.model.partitions.len(),
                nodes: Vec::new(),
            },
        );

        let handles = actor.model.partitions.clone();
        Reply::pending(async move {
            for handle in handles {
                handle
                    .send(SnapshotPartition {
                        correlation_id: correlation_id.clone(),
                    })
                    .await;
            }
        })
    });

    actor.mutate_on::<PartitionSnapshot>(|actor, context| {
        let snapshot = context.message().clone();
        let correlation_id = snapshot.correlation_id.clone();

        let Some(mut pending) = actor.model.pending_collects.get_mut(&correlation_id) else {
            warn!(
                correlation_id = %correlation_id,
                partition = snapshot.partition,
                "Received snapshot for unknown correlation ID"
            );
            return Reply::ready();
        };

        pending.nodes.extend(snapshot.nodes);
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining > 0 {
            return Reply::ready();
        }
        drop(pending); // Release the lock before removing

        let Some((_, pending)) = actor.model.pending_collects.remove(&correlation_id) else {
            return Reply::ready();
        };

        let mut nodes = pending.nodes;
        nodes.sort_by_key(|n| n.id);
        let broker = actor.broker().clone();
        Reply::pending(async move {
            broker.broadcast(NodesCollected { nodes }).await;
        })
    });
}
