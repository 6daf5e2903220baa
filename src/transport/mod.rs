//! Fan-out client contracts
//!
//! The allocator's per-node questions ("what version of this shard is on
//! your disk?", "what store files do you hold?") are answered by two
//! fan-out clients implemented by the node software. Only the contracts
//! live here: each call returns per-node successes alongside per-node
//! failures, and a call only fails as a whole when the transport itself
//! is unusable.

pub mod shard_state;
pub mod store_meta;

pub use shard_state::{ListShardStates, NodeShardState, ShardStatesResponse};
pub use store_meta::{
    ListStoreMetadata, StoreFileEntry, StoreFilesMetadata, StoreMetadataResponse,
};

use crate::cluster::NodeId;
use crate::error::TransportError;

/// One node's failure within an otherwise successful fan-out
#[derive(Debug, Clone)]
pub struct NodeFailure {
    /// The node that failed to answer
    pub node_id: NodeId,
    /// What went wrong
    pub error: TransportError,
}
