//! On-disk shard state listing

use super::NodeFailure;
use crate::cluster::{ClusterNode, NodeId, ShardId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One node's report of the shard state on its disk
///
/// A version of `-1` means the node holds no copy. On a shared
/// filesystem every node reports at least `0`, even for a shard it has
/// never opened, signalling that the copy is recoverable anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeShardState {
    /// The reporting node
    pub node: ClusterNode,
    /// Stored allocation generation, `-1` when no copy exists
    pub version: i64,
}

/// Fan-out result: per-node states plus per-node failures
#[derive(Debug, Clone, Default)]
pub struct ShardStatesResponse {
    /// Successful per-node reports
    pub states: Vec<NodeShardState>,
    /// Nodes that failed to answer
    pub failures: Vec<NodeFailure>,
}

/// Client that asks data nodes for their on-disk state of a shard
#[async_trait]
pub trait ListShardStates: Send + Sync {
    /// List the stored shard state on `node_ids`, waiting at most
    /// `timeout`. Nodes that fail or time out appear in
    /// [`ShardStatesResponse::failures`]; an `Err` means the fan-out
    /// itself could not run.
    async fn list(
        &self,
        shard_id: &ShardId,
        index_uuid: &str,
        node_ids: &[NodeId],
        timeout: Duration,
    ) -> Result<ShardStatesResponse>;
}
