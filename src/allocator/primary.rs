//! Primary shard placement
//!
//! A primary must come back on a node holding the freshest on-disk copy,
//! and only once enough copies have been seen to rule out that a newer
//! one is merely offline. Because the primary is the master data, a
//! unanimous NO from the deciders is overridden rather than risk losing
//! the shard.

use super::ShardAllocator;
use crate::cluster::metadata::SETTING_RECOVERY_INITIAL_SHARDS;
use crate::cluster::{IndexMetadata, NodeId, RoutingAllocation, ShardRouting};
use crate::decider::Verdict;
use crate::error::Result;
use tracing::{debug, trace, warn};

/// Quorum mode for recovering primaries, parsed from the
/// `initial_shards` settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialShards {
    /// Majority of configured copies, once three or more exist
    Quorum,
    /// Majority minus one (`quorum-1` / `half`)
    QuorumMinusOne,
    /// A single copy
    One,
    /// Every configured copy (`full` / `all`)
    Full,
    /// Every configured copy but one (`full-1` / `all-1`)
    FullMinusOne,
    /// An explicit copy count
    Exact(u32),
}

impl InitialShards {
    /// Parse a settings value; `None` for unrecognized input
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "quorum" => Some(InitialShards::Quorum),
            "quorum-1" | "half" => Some(InitialShards::QuorumMinusOne),
            "one" => Some(InitialShards::One),
            "full" | "all" => Some(InitialShards::Full),
            "full-1" | "all-1" => Some(InitialShards::FullMinusOne),
            _ => raw.parse::<u32>().ok().map(InitialShards::Exact),
        }
    }

    /// On-disk copies that must be visible before a primary may be
    /// allocated, for an index with `number_of_replicas` replicas
    pub fn required_copies(&self, number_of_replicas: u32) -> u32 {
        match self {
            InitialShards::Quorum => {
                if number_of_replicas + 1 >= 3 {
                    (1 + number_of_replicas) / 2 + 1
                } else {
                    1
                }
            }
            InitialShards::QuorumMinusOne => {
                if number_of_replicas >= 3 {
                    (1 + number_of_replicas) / 2
                } else {
                    1
                }
            }
            InitialShards::One => 1,
            InitialShards::Full => number_of_replicas + 1,
            InitialShards::FullMinusOne => {
                if number_of_replicas >= 2 {
                    number_of_replicas
                } else {
                    1
                }
            }
            InitialShards::Exact(count) => *count,
        }
    }
}

/// Outcome of placing one primary
pub(super) enum PrimaryDecision {
    /// Assign to this node, stamping the recovered version
    Assign { node_id: NodeId, version: i64 },
    /// Set aside until the next reroute
    Ignore,
    /// Leave unassigned; nothing can be done this reroute
    Defer,
}

impl ShardAllocator {
    /// Primary phase: walk the unassigned backlog and place every
    /// primary that can find a home. Replicas pass through untouched.
    pub(super) async fn allocate_primaries(
        &self,
        allocation: &mut RoutingAllocation,
    ) -> Result<bool> {
        let mut changed = false;
        let mut failure: Option<crate::error::Error> = None;
        let mut remaining = Vec::new();
        let unassigned = allocation.routing_nodes_mut().take_unassigned();

        for shard in unassigned {
            // an API-created shard has never held data, nothing to recover
            let eligible = shard.primary && shard.primary_allocated_post_api;
            if eligible && failure.is_none() {
                match self.place_primary(&shard, allocation).await {
                    Ok(PrimaryDecision::Assign { node_id, version }) => {
                        let mut placed = shard;
                        placed.version = version;
                        allocation.routing_nodes_mut().assign(placed, &node_id);
                        changed = true;
                        continue;
                    }
                    Ok(PrimaryDecision::Ignore) => {
                        allocation.routing_nodes_mut().add_ignored(shard);
                        continue;
                    }
                    Ok(PrimaryDecision::Defer) => {}
                    // the fan-out itself failed; keep the backlog intact
                    // and abort once the list is restored
                    Err(err) => failure = Some(err),
                }
            }
            remaining.push(shard);
        }

        allocation.routing_nodes_mut().set_unassigned(remaining);
        match failure {
            Some(err) => Err(err),
            None => Ok(changed),
        }
    }

    async fn place_primary(
        &self,
        shard: &ShardRouting,
        allocation: &RoutingAllocation,
    ) -> Result<PrimaryDecision> {
        let Some(index_meta) = allocation.index_metadata(&shard.shard_id.index) else {
            warn!(
                "{}: no metadata for index [{}], leaving primary unassigned",
                shard.shard_id, shard.shard_id.index
            );
            return Ok(PrimaryDecision::Defer);
        };

        let states = self.shard_states(shard, index_meta, allocation).await?;
        let recover_on_any_node = index_meta.recover_on_any_node();

        let mut found_count = 0u32;
        let mut highest_version = -1i64;
        let mut candidates: Vec<(NodeId, i64)> = Vec::new();

        // walk in node-id order so version ties resolve the same way on
        // every reroute
        for node in allocation.nodes().data_nodes() {
            let Some(&version) = states.get(&node.id) else {
                continue;
            };
            if allocation.should_ignore_shard_for_node(&shard.shard_id, &node.id) {
                continue;
            }
            if recover_on_any_node {
                // shared filesystem: every node can recover the copy
                found_count += 1;
                highest_version = highest_version.max(version);
                candidates.push((node.id.clone(), version));
            } else if version != -1 {
                found_count += 1;
                highest_version = highest_version.max(version);
                candidates.push((node.id.clone(), version));
            }
        }

        if !recover_on_any_node {
            candidates.retain(|(_, version)| *version == highest_version);
        }
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        debug!(
            "{}: found {} allocations, highest version [{}]",
            shard.shard_id, found_count, highest_version
        );
        trace!("{}: candidates for allocation: {:?}", shard.shard_id, candidates);

        // a shard restored from a repository needs no quorum, the
        // repository is authoritative
        if shard.restore_source.is_none() {
            let required = self.resolve_initial_shards(index_meta).required_copies(
                index_meta.number_of_replicas,
            );
            if found_count < required {
                debug!(
                    "{}: not allocating, number_of_allocated_shards_found [{}], required_number [{}]",
                    shard.shard_id, found_count, required
                );
                return Ok(PrimaryDecision::Ignore);
            }
        } else {
            debug!(
                "{}: restoring from {:?}, quorum check skipped",
                shard.shard_id, shard.restore_source
            );
        }

        let mut throttled: Vec<NodeId> = Vec::new();
        let mut denied: Vec<NodeId> = Vec::new();
        for (node_id, _version) in &candidates {
            let Some(node) = allocation.nodes().get(node_id) else {
                continue;
            };
            let decision = allocation.deciders().can_allocate(shard, node, allocation);
            match decision.verdict() {
                Verdict::Yes => {
                    debug!(
                        "{}: allocating primary to [{}] with version [{}]",
                        shard.shard_id, node.name, highest_version
                    );
                    return Ok(PrimaryDecision::Assign {
                        node_id: node_id.clone(),
                        version: highest_version,
                    });
                }
                Verdict::Throttle => throttled.push(node_id.clone()),
                Verdict::No => denied.push(node_id.clone()),
            }
        }

        if !throttled.is_empty() {
            debug!(
                "{}: throttling primary allocation on {:?}",
                shard.shard_id, throttled
            );
            return Ok(PrimaryDecision::Ignore);
        }
        if let Some(node_id) = denied.into_iter().next() {
            // every candidate said NO, but this is the master data:
            // refusing to allocate it risks losing the shard
            debug!(
                "{}: forcing primary allocation to [{}] with version [{}]",
                shard.shard_id, node_id, highest_version
            );
            return Ok(PrimaryDecision::Assign {
                node_id,
                version: highest_version,
            });
        }
        Ok(PrimaryDecision::Defer)
    }

    /// Resolve the quorum mode: the index-level override wins, then the
    /// allocator's node-level default; unparseable values fall back to a
    /// single required copy.
    fn resolve_initial_shards(&self, index_meta: &IndexMetadata) -> InitialShards {
        let raw = index_meta
            .settings
            .get(SETTING_RECOVERY_INITIAL_SHARDS)
            .unwrap_or(self.initial_shards.as_str());
        match InitialShards::parse(raw) {
            Some(mode) => mode,
            None => {
                warn!(
                    "failed to parse initial_shards value [{}], requiring a single copy",
                    raw
                );
                InitialShards::One
            }
        }
    }
}
