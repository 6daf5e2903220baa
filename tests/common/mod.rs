//! Shared fixtures for allocator integration tests
//!
//! Mock fan-out clients record every call they receive so tests can
//! assert what the caches actually fetched.

#![allow(dead_code)]

use async_trait::async_trait;
use lodestone::prelude::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lodestone=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Scripted shard-state fan-out client
#[derive(Default)]
pub struct MockShardStates {
    versions: Mutex<HashMap<NodeId, i64>>,
    failures: Mutex<HashMap<NodeId, TransportError>>,
    unavailable: Mutex<Option<String>>,
    /// node-id lists of every fan-out issued, in order
    pub calls: Mutex<Vec<Vec<NodeId>>>,
}

impl MockShardStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, node_id: &str, version: i64) -> Self {
        self.versions.lock().insert(node_id.to_string(), version);
        self
    }

    pub fn with_failure(self, node_id: &str, error: TransportError) -> Self {
        self.failures.lock().insert(node_id.to_string(), error);
        self
    }

    /// Make the whole transport fail
    pub fn make_unavailable(&self, reason: &str) {
        *self.unavailable.lock() = Some(reason.to_string());
    }

    /// Change a node's scripted answer between reroutes
    pub fn set_version(&self, node_id: &str, version: i64) {
        self.versions.lock().insert(node_id.to_string(), version);
        self.failures.lock().remove(node_id);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ListShardStates for MockShardStates {
    async fn list(
        &self,
        _shard_id: &ShardId,
        _index_uuid: &str,
        node_ids: &[NodeId],
        _timeout: Duration,
    ) -> Result<ShardStatesResponse> {
        if let Some(reason) = self.unavailable.lock().clone() {
            return Err(TransportError::Unavailable(reason).into());
        }

        let mut sorted_ids = node_ids.to_vec();
        sorted_ids.sort();
        self.calls.lock().push(sorted_ids);

        let versions = self.versions.lock();
        let failures = self.failures.lock();
        let mut response = ShardStatesResponse::default();
        for node_id in node_ids {
            if let Some(error) = failures.get(node_id) {
                response.failures.push(NodeFailure {
                    node_id: node_id.clone(),
                    error: error.clone(),
                });
            } else if let Some(&version) = versions.get(node_id) {
                response.states.push(NodeShardState {
                    node: ClusterNode::data_node(node_id, node_id),
                    version,
                });
            }
        }
        Ok(response)
    }
}

/// Scripted store-metadata fan-out client
#[derive(Default)]
pub struct MockStoreMetadata {
    stores: Mutex<HashMap<NodeId, Option<StoreFilesMetadata>>>,
    failures: Mutex<HashMap<NodeId, TransportError>>,
    /// node-id lists of every fan-out issued, in order
    pub calls: Mutex<Vec<Vec<NodeId>>>,
}

impl MockStoreMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(self, node_id: &str, store: StoreFilesMetadata) -> Self {
        self.stores.lock().insert(node_id.to_string(), Some(store));
        self
    }

    /// The node already hosts a live copy; it answers with the sentinel
    pub fn with_live_copy(self, node_id: &str) -> Self {
        self.stores.lock().insert(node_id.to_string(), None);
        self
    }

    pub fn with_failure(self, node_id: &str, error: TransportError) -> Self {
        self.failures.lock().insert(node_id.to_string(), error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ListStoreMetadata for MockStoreMetadata {
    async fn list(
        &self,
        _shard_id: &ShardId,
        _include_unallocated: bool,
        node_ids: &[NodeId],
        _timeout: Duration,
    ) -> Result<StoreMetadataResponse> {
        let mut sorted_ids = node_ids.to_vec();
        sorted_ids.sort();
        self.calls.lock().push(sorted_ids);

        let stores = self.stores.lock();
        let failures = self.failures.lock();
        let mut response = StoreMetadataResponse::default();
        for node_id in node_ids {
            if let Some(error) = failures.get(node_id) {
                response.failures.push(NodeFailure {
                    node_id: node_id.clone(),
                    error: error.clone(),
                });
            } else if let Some(store) = stores.get(node_id) {
                response
                    .stores
                    .push((ClusterNode::data_node(node_id, node_id), store.clone()));
            }
        }
        Ok(response)
    }
}

/// Decider that answers a fixed verdict per node
pub struct ScriptedDecider {
    default: Verdict,
    verdicts: HashMap<NodeId, Verdict>,
}

impl ScriptedDecider {
    pub fn answering(default: Verdict) -> Self {
        Self {
            default,
            verdicts: HashMap::new(),
        }
    }

    pub fn with_verdict(mut self, node_id: &str, verdict: Verdict) -> Self {
        self.verdicts.insert(node_id.to_string(), verdict);
        self
    }

    /// Wrap into a one-decider chain
    pub fn into_chain(self) -> AllocationDeciders {
        AllocationDeciders::new(vec![Box::new(self)])
    }
}

impl AllocationDecider for ScriptedDecider {
    fn can_allocate(
        &self,
        _shard: &ShardRouting,
        node: &ClusterNode,
        _allocation: &RoutingAllocation,
    ) -> Decision {
        match self.verdicts.get(&node.id).copied().unwrap_or(self.default) {
            Verdict::Yes => Decision::yes("scripted yes"),
            Verdict::No => Decision::no("scripted no"),
            Verdict::Throttle => Decision::throttle("scripted throttle"),
        }
    }
}

/// A cluster of data nodes with the given ids (names match the ids)
pub fn data_nodes(ids: &[&str]) -> ClusterNodes {
    let mut nodes = ClusterNodes::new();
    for id in ids {
        nodes.add(ClusterNode::data_node(id, id));
    }
    nodes
}

/// Index metadata map holding a single index
pub fn single_index(name: &str, metadata: IndexMetadata) -> HashMap<String, IndexMetadata> {
    let mut indices = HashMap::new();
    indices.insert(name.to_string(), metadata);
    indices
}

/// (node id, stamped version) of every copy placed by this reroute, in
/// placement order; pre-existing started copies are excluded
pub fn newly_assigned(allocation: &RoutingAllocation) -> Vec<(String, i64)> {
    allocation
        .routing_nodes()
        .assigned()
        .iter()
        .filter(|a| a.state == lodestone::cluster::AssignedState::Initializing)
        .map(|a| (a.node_id.clone(), a.routing.version))
        .collect()
}
