//! Shard routing state
//!
//! Tracks where shard copies live and which copies still need a home.
//! The allocator consumes the unassigned list and moves entries either
//! into the assigned table or into the ignored list for this reroute.

use super::nodes::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one shard of one index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardId {
    /// Index name
    pub index: String,
    /// Shard number within the index
    pub shard: u32,
}

impl ShardId {
    /// Create a shard ID
    pub fn new(index: &str, shard: u32) -> Self {
        Self {
            index: index.to_string(),
            shard,
        }
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.index, self.shard)
    }
}

/// Repository snapshot a shard will be recovered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSource {
    /// Repository name
    pub repository: String,
    /// Snapshot name
    pub snapshot: String,
}

/// An unassigned shard copy waiting for a home
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardRouting {
    /// The shard this copy belongs to
    pub shard_id: ShardId,
    /// Whether this copy is the primary
    pub primary: bool,
    /// Set when the copy will be restored from a repository
    pub restore_source: Option<RestoreSource>,
    /// Whether any primary copy of this shard was ever live in the
    /// cluster; a freshly created shard has no on-disk data to recover
    pub primary_allocated_post_api: bool,
    /// On-disk allocation generation, stamped when a primary is placed
    pub version: i64,
}

impl ShardRouting {
    /// Create an unassigned copy; primaries start as allocated-post-api
    pub fn new(shard_id: ShardId, primary: bool) -> Self {
        Self {
            shard_id,
            primary,
            restore_source: None,
            primary_allocated_post_api: true,
            version: -1,
        }
    }

    /// Builder-style restore source
    pub fn with_restore_source(mut self, repository: &str, snapshot: &str) -> Self {
        self.restore_source = Some(RestoreSource {
            repository: repository.to_string(),
            snapshot: snapshot.to_string(),
        });
        self
    }

    /// Builder-style post-api flag
    pub fn with_primary_allocated_post_api(mut self, allocated: bool) -> Self {
        self.primary_allocated_post_api = allocated;
        self
    }
}

/// Lifecycle state of an assigned shard copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignedState {
    /// Recovery in progress on the target node
    Initializing,
    /// Copy is live and serving
    Started,
}

/// A shard copy placed on a node
#[derive(Debug, Clone)]
pub struct AssignedShard {
    /// The placed copy
    pub routing: ShardRouting,
    /// Node hosting it
    pub node_id: NodeId,
    /// Lifecycle state
    pub state: AssignedState,
}

/// Routing tables for one reroute: assigned copies plus the unassigned
/// backlog the allocator works through
#[derive(Debug, Clone, Default)]
pub struct RoutingNodes {
    unassigned: Vec<ShardRouting>,
    ignored_unassigned: Vec<ShardRouting>,
    assigned: Vec<AssignedShard>,
}

impl RoutingNodes {
    /// Create empty routing tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a copy for allocation
    pub fn add_unassigned(&mut self, shard: ShardRouting) {
        self.unassigned.push(shard);
    }

    /// Record a copy that is already live on a node (existing cluster
    /// state, not something this reroute produced)
    pub fn add_started(&mut self, routing: ShardRouting, node_id: &str) {
        self.assigned.push(AssignedShard {
            routing,
            node_id: node_id.to_string(),
            state: AssignedState::Started,
        });
    }

    /// Whether any copies still wait for a home
    pub fn has_unassigned(&self) -> bool {
        !self.unassigned.is_empty()
    }

    /// Copies still waiting for a home
    pub fn unassigned(&self) -> &[ShardRouting] {
        &self.unassigned
    }

    /// Take the unassigned backlog for in-place consumption; the caller
    /// puts back whatever it did not place via [`Self::set_unassigned`]
    pub fn take_unassigned(&mut self) -> Vec<ShardRouting> {
        std::mem::take(&mut self.unassigned)
    }

    /// Restore the unconsumed remainder of the backlog
    pub fn set_unassigned(&mut self, remaining: Vec<ShardRouting>) {
        self.unassigned = remaining;
    }

    /// Copies set aside until the next reroute
    pub fn ignored_unassigned(&self) -> &[ShardRouting] {
        &self.ignored_unassigned
    }

    /// Set a copy aside until the next reroute
    pub fn add_ignored(&mut self, shard: ShardRouting) {
        self.ignored_unassigned.push(shard);
    }

    /// Place a copy on a node; it starts recovering there
    pub fn assign(&mut self, routing: ShardRouting, node_id: &str) {
        self.assigned.push(AssignedShard {
            routing,
            node_id: node_id.to_string(),
            state: AssignedState::Initializing,
        });
    }

    /// Placed copies, in placement order
    pub fn assigned(&self) -> &[AssignedShard] {
        &self.assigned
    }

    /// Node hosting the live primary of a shard, if any
    pub fn active_primary_node(&self, shard_id: &ShardId) -> Option<&NodeId> {
        self.assigned
            .iter()
            .find(|a| {
                a.routing.primary
                    && a.state == AssignedState::Started
                    && a.routing.shard_id == *shard_id
            })
            .map(|a| &a.node_id)
    }
}
