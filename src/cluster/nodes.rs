//! Cluster node snapshot
//!
//! Membership is owned by the cluster service; the allocator only reads a
//! per-reroute snapshot. Only data-bearing nodes participate in
//! allocation decisions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node identifier, stable across reconnects until the node is removed
/// from the cluster
pub type NodeId = String;

/// A member of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Node ID (unique identifier)
    pub id: NodeId,
    /// Human-readable node name
    pub name: String,
    /// Whether this node holds shard data
    pub data: bool,
}

impl ClusterNode {
    /// Create a data-bearing node
    pub fn data_node(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data: true,
        }
    }

    /// Create a coordinating-only node
    pub fn coordinating_node(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data: false,
        }
    }
}

/// Snapshot of cluster membership for one reroute
#[derive(Debug, Clone, Default)]
pub struct ClusterNodes {
    nodes: HashMap<NodeId, ClusterNode>,
}

impl ClusterNodes {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_node(mut self, node: ClusterNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Add a node to the snapshot
    pub fn add(&mut self, node: ClusterNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a node by ID
    pub fn get(&self, node_id: &str) -> Option<&ClusterNode> {
        self.nodes.get(node_id)
    }

    /// Whether a node with this ID is currently in the cluster
    pub fn node_exists(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Data-bearing nodes, ordered by node ID so that iteration-driven
    /// tie-breaks are stable across reroutes
    pub fn data_nodes(&self) -> Vec<&ClusterNode> {
        let mut nodes: Vec<&ClusterNode> = self.nodes.values().filter(|n| n.data).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }
}
