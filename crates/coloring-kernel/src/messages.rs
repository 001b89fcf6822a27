//! Message types for acton-reactive actor communication.
//!
//! Requests to partitions are sent directly to their handles. Partition
//! responses are broadcast through the broker and carry the correlation ID of
//! the phase they answer, so the coordinator can count them against a barrier.

use acton_reactive::prelude::ActorHandle;

use crate::dataflow::{Inbox, NeighborMessage, PartitionId};
use crate::engine::{PhaseStats, RoundResult};
use crate::graph::Node;
use crate::protocol::Phase;

/// Register partition actors with the coordinator.
///
/// The handle at index `i` owns partition `i`.
#[derive(Debug, Clone)]
pub struct RegisterPartitions {
    pub actors: Vec<ActorHandle>,
}

/// Start a round - sent to SuperstepCoordinator.
#[derive(Debug, Clone)]
pub struct Superstep {
    /// 1-based round number
    pub round: usize,
}

/// Round completion notification - broadcast by the coordinator.
#[derive(Debug, Clone)]
pub struct SuperstepComplete {
    pub result: RoundResult,
}

/// Ask a partition to emit its outgoing neighbor messages for a phase.
#[derive(Debug, Clone)]
pub struct Scatter {
    /// Correlation ID of this phase's scatter barrier
    pub correlation_id: String,
    pub round: usize,
    pub phase: Phase,
}

/// A partition's outgoing messages - broadcast back to the coordinator.
#[derive(Debug, Clone)]
pub struct ScatterResult {
    /// Correlation ID matching the original request
    pub correlation_id: String,
    pub partition: PartitionId,
    pub messages: Vec<NeighborMessage>,
}

/// Deliver the grouped messages addressed to a partition's nodes and apply
/// the phase.
#[derive(Debug, Clone)]
pub struct Gather {
    /// Correlation ID of this phase's gather barrier
    pub correlation_id: String,
    pub round: usize,
    pub phase: Phase,
    /// Values grouped by target; nodes without an entry received nothing
    pub inbox: Inbox,
}

/// Phase counters after a partition replaced its generation.
#[derive(Debug, Clone)]
pub struct GatherResult {
    /// Correlation ID matching the original request
    pub correlation_id: String,
    pub partition: PartitionId,
    pub stats: PhaseStats,
}

/// Request the current node records - sent to SuperstepCoordinator.
#[derive(Debug, Clone)]
pub struct CollectNodes;

/// Ask a partition for its current generation.
#[derive(Debug, Clone)]
pub struct SnapshotPartition {
    pub correlation_id: String,
}

/// A partition's current node records.
#[derive(Debug, Clone)]
pub struct PartitionSnapshot {
    /// Correlation ID matching the original request
    pub correlation_id: String,
    pub partition: PartitionId,
    pub nodes: Vec<Node>,
}

/// Every partition's records, sorted by id - broadcast by the coordinator.
#[derive(Debug, Clone)]
pub struct NodesCollected {
    pub nodes: Vec<Node>,
}
