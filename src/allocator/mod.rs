//! Unassigned-shard allocator
//!
//! The decision engine invoked on every cluster-state reroute. Primaries
//! are placed first, on the node holding the freshest on-disk copy once
//! a quorum of copies has been seen; replicas follow, placed where
//! existing on-disk data shortens recovery the most. Both phases lean on
//! per-shard caches of the expensive per-node fan-out answers, which are
//! dropped again when a shard starts or fails.

mod cache;
mod primary;
mod replica;

pub use primary::InitialShards;

use crate::cluster::{IndexMetadata, NodeId, RoutingAllocation, ShardId, ShardRouting};
use crate::error::Result;
use crate::settings::Settings;
use crate::transport::{ListShardStates, ListStoreMetadata, NodeFailure, StoreFilesMetadata};
use cache::FetchCache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Setting: fan-out timeout for the per-node listings
pub const SETTING_LIST_TIMEOUT: &str = "gateway.list_timeout";
/// Legacy alias of [`SETTING_LIST_TIMEOUT`]
pub const SETTING_LIST_TIMEOUT_LEGACY: &str = "gateway.local.list_timeout";
/// Setting: default quorum mode for recovering primaries
pub const SETTING_INITIAL_SHARDS: &str = "gateway.initial_shards";
/// Legacy alias of [`SETTING_INITIAL_SHARDS`]
pub const SETTING_INITIAL_SHARDS_LEGACY: &str = "gateway.local.initial_shards";

const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_INITIAL_SHARDS: &str = "quorum";

/// The unassigned-shard allocator
///
/// One instance lives for the lifetime of the node and is driven by the
/// cluster-update context: reroutes call
/// [`allocate_unassigned`](Self::allocate_unassigned), shard lifecycle
/// transitions call the two `apply_*` hooks.
pub struct ShardAllocator {
    list_shard_states: Arc<dyn ListShardStates>,
    list_store_metadata: Arc<dyn ListStoreMetadata>,
    state_cache: FetchCache<i64>,
    store_cache: FetchCache<Option<StoreFilesMetadata>>,
    list_timeout: Duration,
    initial_shards: String,
}

impl ShardAllocator {
    /// Create an allocator over the given fan-out clients
    pub fn new(
        settings: &Settings,
        list_shard_states: Arc<dyn ListShardStates>,
        list_store_metadata: Arc<dyn ListStoreMetadata>,
    ) -> Self {
        let list_timeout = settings.get_duration_first(
            &[SETTING_LIST_TIMEOUT, SETTING_LIST_TIMEOUT_LEGACY],
            DEFAULT_LIST_TIMEOUT,
        );
        let initial_shards = settings
            .get_first(&[SETTING_INITIAL_SHARDS, SETTING_INITIAL_SHARDS_LEGACY])
            .unwrap_or(DEFAULT_INITIAL_SHARDS)
            .to_string();

        debug!(
            "using initial_shards [{}], list_timeout [{:?}]",
            initial_shards, list_timeout
        );

        Self {
            list_shard_states,
            list_store_metadata,
            state_cache: FetchCache::new(),
            store_cache: FetchCache::new(),
            list_timeout,
            initial_shards,
        }
    }

    /// Shards that transitioned to STARTED: drop their cached fan-out
    /// answers, the on-disk picture has changed
    pub fn apply_started_shards(&self, started: &[ShardRouting]) {
        for shard in started {
            self.state_cache.invalidate(&shard.shard_id);
            self.store_cache.invalidate(&shard.shard_id);
        }
    }

    /// Shards that transitioned to FAILED: same invalidation as started
    pub fn apply_failed_shards(&self, failed: &[ShardRouting]) {
        for shard in failed {
            self.state_cache.invalidate(&shard.shard_id);
            self.store_cache.invalidate(&shard.shard_id);
        }
    }

    /// Attempt to place every unassigned shard copy in `allocation`.
    ///
    /// Runs two strict phases: primaries first (they must find a home
    /// before any replica is considered), then replicas. Returns whether
    /// any assignment was made. Deterministic given identical inputs and
    /// cache state.
    pub async fn allocate_unassigned(&self, allocation: &mut RoutingAllocation) -> Result<bool> {
        let mut changed = self.allocate_primaries(allocation).await?;

        if !allocation.routing_nodes().has_unassigned() {
            return Ok(changed);
        }

        changed |= self.allocate_replicas(allocation).await?;
        Ok(changed)
    }

    /// Per-node on-disk versions for a shard, served from the state
    /// cache and completed by a fan-out for the nodes not yet cached
    async fn shard_states(
        &self,
        shard: &ShardRouting,
        index_meta: &IndexMetadata,
        allocation: &RoutingAllocation,
    ) -> Result<HashMap<NodeId, i64>> {
        let missing = self
            .state_cache
            .missing_nodes(&shard.shard_id, allocation.nodes());

        if !missing.is_empty() {
            let response = self
                .list_shard_states
                .list(&shard.shard_id, &index_meta.uuid, &missing, self.list_timeout)
                .await?;
            log_fanout_failures(&shard.shard_id, "state", &response.failures);

            for state in response.states {
                trace!(
                    "{}: node [{}] has version [{}] on disk",
                    shard.shard_id, state.node.name, state.version
                );
                self.state_cache
                    .insert(&shard.shard_id, state.node.id, state.version);
            }
        }

        Ok(self.state_cache.snapshot(&shard.shard_id))
    }

    /// Per-node store metadata for a shard, served from the store cache
    /// and completed by a fan-out for the nodes not yet cached. Failed
    /// nodes stay absent so the next reroute retries them.
    async fn shard_stores(
        &self,
        shard: &ShardRouting,
        allocation: &RoutingAllocation,
    ) -> Result<HashMap<NodeId, Option<StoreFilesMetadata>>> {
        let missing = self
            .store_cache
            .missing_nodes(&shard.shard_id, allocation.nodes());

        if !missing.is_empty() {
            let response = self
                .list_store_metadata
                .list(&shard.shard_id, false, &missing, self.list_timeout)
                .await?;
            log_fanout_failures(&shard.shard_id, "stores", &response.failures);

            for (node, store) in response.stores {
                self.store_cache.insert(&shard.shard_id, node.id, store);
            }
        }

        Ok(self.store_cache.snapshot(&shard.shard_id))
    }
}

/// Per-node fan-out failures are recoverable; disconnects are expected
/// churn while nodes restart and stay out of the warn log
fn log_fanout_failures(shard_id: &ShardId, action: &str, failures: &[NodeFailure]) {
    for failure in failures {
        if failure.error.is_disconnect() {
            debug!(
                "{}: failed to list shard {} on node [{}]: {}",
                shard_id, action, failure.node_id, failure.error
            );
        } else {
            warn!(
                "{}: failed to list shard {} on node [{}]: {}",
                shard_id, action, failure.node_id, failure.error
            );
        }
    }
}
