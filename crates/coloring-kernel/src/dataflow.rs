//! Neighbor aggregation plumbing: scatter, shuffle, and join.
//!
//! A phase runs in three moves:
//! 1. every node emits one [`NeighborMessage`] per neighbor ([`scatter`])
//! 2. messages are grouped by target id ([`group_by_target`])
//! 3. each node is left-outer-joined with its group ([`Inbox::get`])
//!
//! A node nobody wrote to joins with an empty slice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::{Color, Node, NodeId};
use crate::protocol::{outgoing_value, Phase};

/// A value sent from one node to one neighbor during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborMessage {
    pub target: NodeId,
    pub color: Option<Color>,
}

/// Identifier for a partition of the node set.
pub type PartitionId = usize;

/// Hash partitioning of node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    partitions: usize,
}

impl Partitioner {
    /// At least one partition is always used.
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn partition_of(&self, node: NodeId) -> PartitionId {
        node.index() % self.partitions
    }

    /// Split nodes into per-partition vectors, preserving id order within each.
    pub fn split(&self, nodes: &[Node]) -> Vec<Vec<Node>> {
        let mut parts = vec![Vec::new(); self.partitions];
        for node in nodes {
            parts[self.partition_of(node.id)].push(node.clone());
        }
        parts
    }

    /// Route grouped messages to the partition owning each target.
    pub fn route(&self, inbox: Inbox) -> Vec<Inbox> {
        let mut routed = vec![Inbox::default(); self.partitions];
        for (target, values) in inbox.groups {
            routed[self.partition_of(target)].groups.insert(target, values);
        }
        routed
    }
}

/// Flat-map nodes into the messages they send in `phase`.
pub fn scatter<'a>(nodes: impl IntoIterator<Item = &'a Node>, phase: Phase) -> Vec<NeighborMessage> {
    nodes
        .into_iter()
        .filter_map(|node| outgoing_value(node, phase).map(|color| (node, color)))
        .flat_map(|(node, color)| {
            node.neighbors
                .iter()
                .map(move |&target| NeighborMessage { target, color })
        })
        .collect()
}

/// Per-target lists of received values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbox {
    groups: HashMap<NodeId, Vec<Option<Color>>>,
}

impl Inbox {
    /// Values delivered to `node`. Empty when nothing was sent.
    pub fn get(&self, node: NodeId) -> &[Option<Color>] {
        self.groups.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of targets that received at least one value.
    pub fn targets(&self) -> usize {
        self.groups.len()
    }

    pub fn messages(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = NeighborMessage>) {
        for msg in messages {
            self.groups.entry(msg.target).or_default().push(msg.color);
        }
    }
}

/// Group messages by target id.
pub fn group_by_target(messages: impl IntoIterator<Item = NeighborMessage>) -> Inbox {
    let mut inbox = Inbox::default();
    inbox.extend(messages);
    inbox
}

/// Left-outer-join `nodes` with `inbox` and map each pair through `f`.
pub fn join_map<T>(
    nodes: &[Node],
    inbox: &Inbox,
    mut f: impl FnMut(&Node, &[Option<Color>]) -> T,
) -> Vec<T> {
    nodes.iter().map(|node| f(node, inbox.get(node.id))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<Node> {
        // 0 - 1 - 2, node 1 colored
        vec![
            Node::new(NodeId(0), vec![NodeId(1)]).with_candidate(Some(0)),
            Node::new(NodeId(1), vec![NodeId(0), NodeId(2)]).committed(1),
            Node::new(NodeId(2), vec![NodeId(1)]),
        ]
    }

    #[test]
    fn test_propose_scatter_only_from_colored_nodes() {
        let messages = scatter(&path(), Phase::Propose);
        assert_eq!(
            messages,
            vec![
                NeighborMessage { target: NodeId(0), color: Some(1) },
                NeighborMessage { target: NodeId(2), color: Some(1) },
            ]
        );
    }

    #[test]
    fn test_resolve_scatter_only_from_uncolored_nodes() {
        let inbox = group_by_target(scatter(&path(), Phase::Resolve));
        assert_eq!(inbox.get(NodeId(1)), &[Some(0), None]);
        assert!(inbox.get(NodeId(0)).is_empty());
        assert_eq!(inbox.targets(), 1);
    }

    #[test]
    fn test_missing_group_joins_as_empty() {
        let nodes = path();
        let inbox = Inbox::default();
        let sizes = join_map(&nodes, &inbox, |_, values| values.len());
        assert_eq!(sizes, vec![0, 0, 0]);
    }

    #[test]
    fn test_partitioner_split_and_route() {
        let partitioner = Partitioner::new(2);
        let parts = partitioner.split(&path());
        assert_eq!(parts[0].iter().map(|n| n.id).collect::<Vec<_>>(), vec![NodeId(0), NodeId(2)]);
        assert_eq!(parts[1].iter().map(|n| n.id).collect::<Vec<_>>(), vec![NodeId(1)]);

        let routed = partitioner.route(group_by_target(scatter(&path(), Phase::Propose)));
        assert_eq!(routed[0].messages(), 2);
        assert_eq!(routed[1].messages(), 0);
    }

    #[test]
    fn test_zero_partitions_falls_back_to_one() {
        assert_eq!(Partitioner::new(0).partitions(), 1);
    }
}
