//! Replica shard placement
//!
//! Replicas recover by copying segments from the primary, so the best
//! home is the node whose leftover on-disk data overlaps the primary's
//! store the most. Identical sync ids prove identical segments and beat
//! any byte count.

use super::ShardAllocator;
use crate::cluster::{NodeId, RoutingAllocation, ShardRouting};
use crate::error::Result;
use tracing::{debug, trace};

/// Outcome of placing one replica
pub(super) enum ReplicaDecision {
    /// Assign to this node; replicas carry no recovered version
    Assign { node_id: NodeId },
    /// Set aside until the next reroute
    Ignore,
    /// Leave unassigned; nothing can be done this reroute
    Defer,
}

impl ShardAllocator {
    /// Replica phase: walk what the primary phase left behind and place
    /// every replica near reusable data. Primaries pass through
    /// untouched.
    pub(super) async fn allocate_replicas(
        &self,
        allocation: &mut RoutingAllocation,
    ) -> Result<bool> {
        let mut changed = false;
        let mut failure: Option<crate::error::Error> = None;
        let mut remaining = Vec::new();
        let unassigned = allocation.routing_nodes_mut().take_unassigned();

        for shard in unassigned {
            if !shard.primary && failure.is_none() {
                match self.place_replica(&shard, allocation).await {
                    Ok(ReplicaDecision::Assign { node_id }) => {
                        allocation.routing_nodes_mut().assign(shard, &node_id);
                        changed = true;
                        continue;
                    }
                    Ok(ReplicaDecision::Ignore) => {
                        allocation.routing_nodes_mut().add_ignored(shard);
                        continue;
                    }
                    Ok(ReplicaDecision::Defer) => {}
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

    async fn place_replica(
        &self,
        shard: &ShardRouting,
        allocation: &RoutingAllocation,
    ) -> Result<ReplicaDecision> {
        // if no node may take the copy at all, don't pay for the store
        // listing fan-out
        let can_allocate_somewhere = allocation.nodes().data_nodes().into_iter().any(|node| {
            allocation
                .deciders()
                .can_allocate(shard, node, allocation)
                .is_yes()
        });
        if !can_allocate_somewhere {
            trace!(
                "{}: no node can take this replica, skipping store listing",
                shard.shard_id
            );
            return Ok(ReplicaDecision::Defer);
        }

        let stores = self.shard_stores(shard, allocation).await?;

        let Some(primary_node_id) = allocation
            .routing_nodes()
            .active_primary_node(&shard.shard_id)
            .cloned()
        else {
            trace!(
                "{}: no active primary, store reuse cannot be scored",
                shard.shard_id
            );
            return Ok(ReplicaDecision::Defer);
        };
        let primary_store = match stores.get(&primary_node_id) {
            Some(Some(store)) if store.allocated => store.clone(),
            _ => {
                trace!(
                    "{}: primary store metadata unavailable on [{}]",
                    shard.shard_id, primary_node_id
                );
                return Ok(ReplicaDecision::Defer);
            }
        };

        let mut best_node: Option<NodeId> = None;
        let mut best_score: u64 = 0;

        for (node_id, store) in &stores {
            // sentinel for a node already holding a live copy
            let Some(store) = store else {
                continue;
            };
            if store.allocated {
                continue;
            }
            let Some(node) = allocation.nodes().get(node_id) else {
                continue;
            };
            // only NO disqualifies here; a THROTTLE node with enough
            // matching data is worth retrying next reroute
            if allocation
                .deciders()
                .can_allocate(shard, node, allocation)
                .is_no()
            {
                continue;
            }

            let score = if store.sync_id.is_some() && store.sync_id == primary_store.sync_id {
                trace!(
                    "{}: node [{}] has the same sync id as the primary",
                    shard.shard_id, node.name
                );
                u64::MAX
            } else {
                let matched = store.reusable_bytes_with(&primary_store);
                trace!(
                    "{}: node [{}] has [{}] bytes of re-usable data",
                    shard.shard_id, node.name, matched
                );
                matched
            };

            if score > best_score {
                best_score = score;
                best_node = Some(node_id.clone());
            }
        }

        let Some(node_id) = best_node else {
            return Ok(ReplicaDecision::Defer);
        };
        let Some(node) = allocation.nodes().get(&node_id) else {
            return Ok(ReplicaDecision::Defer);
        };

        // the scan skipped NO nodes, so only THROTTLE can stop us now
        let decision = allocation.deciders().can_allocate(shard, node, allocation);
        if decision.is_throttle() {
            debug!(
                "{}: throttling replica allocation to [{}] to reuse its store ([{}] matched bytes)",
                shard.shard_id, node.name, best_score
            );
            Ok(ReplicaDecision::Ignore)
        } else {
            debug!(
                "{}: allocating replica to [{}] to reuse its store ([{}] matched bytes)",
                shard.shard_id, node.name, best_score
            );
            Ok(ReplicaDecision::Assign { node_id })
        }
    }
}
