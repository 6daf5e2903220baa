//! Per-shard fan-out result cache
//!
//! The per-node queries feeding an allocation decision are expensive, so
//! their answers are cached per shard until a lifecycle event says the
//! shard moved on. A negative answer costs as much to obtain as a
//! positive one and is cached just the same.

use crate::cluster::{ClusterNodes, NodeId, ShardId};
use dashmap::DashMap;
use std::collections::HashMap;

/// Concurrent per-shard map of per-node fetch results
///
/// Insertions and removals are map-level atomic; compound sequences are
/// serialized by the cluster-update context that drives reroutes.
pub(crate) struct FetchCache<V> {
    entries: DashMap<ShardId, HashMap<NodeId, V>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Purge cached entries for nodes that left the cluster, then list
    /// the data nodes whose answer is not cached yet. An empty return
    /// means no fan-out is needed.
    pub fn missing_nodes(&self, shard_id: &ShardId, nodes: &ClusterNodes) -> Vec<NodeId> {
        let mut entry = self.entries.entry(shard_id.clone()).or_default();
        entry.retain(|node_id, _| nodes.node_exists(node_id));
        nodes
            .data_nodes()
            .into_iter()
            .filter(|node| !entry.contains_key(&node.id))
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn insert(&self, shard_id: &ShardId, node_id: NodeId, value: V) {
        self.entries
            .entry(shard_id.clone())
            .or_default()
            .insert(node_id, value);
    }

    /// Clone of the cached per-node map for a shard
    pub fn snapshot(&self, shard_id: &ShardId) -> HashMap<NodeId, V> {
        self.entries
            .get(shard_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Drop everything cached for a shard
    pub fn invalidate(&self, shard_id: &ShardId) {
        self.entries.remove(shard_id);
    }
}
