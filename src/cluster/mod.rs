//! Cluster-state slice consumed by the allocator
//!
//! The allocator never owns cluster state. Each reroute hands it an
//! immutable snapshot of the data nodes, the index metadata, and the
//! routing tables, bundled into a mutable [`RoutingAllocation`] context.

pub mod allocation;
pub mod metadata;
pub mod nodes;
pub mod routing;

pub use allocation::RoutingAllocation;
pub use metadata::IndexMetadata;
pub use nodes::{ClusterNode, ClusterNodes, NodeId};
pub use routing::{
    AssignedShard, AssignedState, RestoreSource, RoutingNodes, ShardId, ShardRouting,
};
