//! # Lodestone
//!
//! The unassigned-shard allocator of a distributed search cluster.
//!
//! On every cluster-state reroute, the routing service hands Lodestone
//! the list of shard copies that currently have no home. The allocator
//! decides, copy by copy, which data node should host each one — or that
//! no node should, yet.
//!
//! ## Key behaviors
//!
//! - **Primaries first**: a primary is placed on a node holding the
//!   freshest on-disk copy, and only once a configurable quorum of
//!   copies has been seen, so a newer copy that is merely offline is not
//!   silently discarded
//! - **Replicas near data**: a replica is placed on the node whose
//!   leftover segment files overlap the primary's store the most; a
//!   matching sync id proves identical segments and wins outright
//! - **Decider gated**: every placement is voted on by the pluggable
//!   decider chain (YES / NO / THROTTLE) — except that a primary with
//!   nothing but NO votes is force-assigned rather than risk data loss
//! - **Cached fan-outs**: the expensive per-node state and store
//!   listings are cached per shard and invalidated by shard lifecycle
//!   events
//!
//! ## Architecture
//!
//! - [`allocator`]: the reroute driver, placement policies, and caches
//! - [`cluster`]: the cluster-state slice the allocator consumes
//! - [`decider`]: the tri-state decider chain contract
//! - [`transport`]: the fan-out client contracts implemented by the
//!   node software

pub mod allocator;
pub mod cluster;
pub mod decider;
pub mod settings;
pub mod transport;

mod error;

pub use error::{Error, Result, TransportError};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::allocator::{InitialShards, ShardAllocator};
    pub use crate::cluster::{
        ClusterNode, ClusterNodes, IndexMetadata, NodeId, RestoreSource, RoutingAllocation,
        RoutingNodes, ShardId, ShardRouting,
    };
    pub use crate::decider::{AllocationDecider, AllocationDeciders, Decision, Verdict};
    pub use crate::settings::Settings;
    pub use crate::transport::{
        ListShardStates, ListStoreMetadata, NodeFailure, NodeShardState, ShardStatesResponse,
        StoreFileEntry, StoreFilesMetadata, StoreMetadataResponse,
    };
    pub use crate::{Error, Result, TransportError};
}
