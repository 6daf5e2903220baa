//! Per-reroute allocation context

use super::metadata::IndexMetadata;
use super::nodes::{ClusterNodes, NodeId};
use super::routing::{RoutingNodes, ShardId};
use crate::decider::AllocationDeciders;
use std::collections::{HashMap, HashSet};

/// Everything one reroute needs: the cluster snapshot, the routing
/// tables, the decider chain, and the per-reroute ignore set
///
/// The context is owned by the caller; assignments written into it
/// survive even if the surrounding cluster-state publication aborts.
pub struct RoutingAllocation {
    nodes: ClusterNodes,
    indices: HashMap<String, IndexMetadata>,
    routing_nodes: RoutingNodes,
    deciders: AllocationDeciders,
    ignored_shard_nodes: HashMap<ShardId, HashSet<NodeId>>,
}

impl RoutingAllocation {
    /// Assemble the context for one reroute
    pub fn new(
        nodes: ClusterNodes,
        indices: HashMap<String, IndexMetadata>,
        routing_nodes: RoutingNodes,
        deciders: AllocationDeciders,
    ) -> Self {
        Self {
            nodes,
            indices,
            routing_nodes,
            deciders,
            ignored_shard_nodes: HashMap::new(),
        }
    }

    /// Cluster membership snapshot
    pub fn nodes(&self) -> &ClusterNodes {
        &self.nodes
    }

    /// Metadata for an index, if the index still exists
    pub fn index_metadata(&self, index: &str) -> Option<&IndexMetadata> {
        self.indices.get(index)
    }

    /// Routing tables
    pub fn routing_nodes(&self) -> &RoutingNodes {
        &self.routing_nodes
    }

    /// Mutable routing tables
    pub fn routing_nodes_mut(&mut self) -> &mut RoutingNodes {
        &mut self.routing_nodes
    }

    /// The installed decider chain
    pub fn deciders(&self) -> &AllocationDeciders {
        &self.deciders
    }

    /// Mark a node as off-limits for a shard during this reroute, e.g.
    /// because a copy just failed there
    pub fn add_ignore_shard_for_node(&mut self, shard_id: ShardId, node_id: &str) {
        self.ignored_shard_nodes
            .entry(shard_id)
            .or_default()
            .insert(node_id.to_string());
    }

    /// Whether a node is off-limits for a shard during this reroute
    pub fn should_ignore_shard_for_node(&self, shard_id: &ShardId, node_id: &str) -> bool {
        self.ignored_shard_nodes
            .get(shard_id)
            .is_some_and(|nodes| nodes.contains(node_id))
    }
}
