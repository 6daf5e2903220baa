//! Allocation decider chain
//!
//! Deciders are the pluggable policy layer: each one votes on placing a
//! specific shard copy on a specific node, and the chain folds the votes
//! into a single verdict. The allocator only consumes the verdict; it
//! never knows which policies are installed.

use crate::cluster::{ClusterNode, RoutingAllocation, ShardRouting};

/// Tri-state allocation verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The copy may be placed on the node
    Yes,
    /// The copy must not be placed on the node
    No,
    /// The node cannot take the copy right now; retry a later reroute
    Throttle,
}

/// A verdict with the human-readable reason that produced it
#[derive(Debug, Clone)]
pub struct Decision {
    verdict: Verdict,
    reason: String,
}

impl Decision {
    /// An allowing decision
    pub fn yes(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Yes,
            reason: reason.into(),
        }
    }

    /// A denying decision
    pub fn no(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::No,
            reason: reason.into(),
        }
    }

    /// A throttling decision
    pub fn throttle(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Throttle,
            reason: reason.into(),
        }
    }

    /// The verdict
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Why the verdict was reached
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether the verdict allows allocation
    pub fn is_yes(&self) -> bool {
        self.verdict == Verdict::Yes
    }

    /// Whether the verdict denies allocation
    pub fn is_no(&self) -> bool {
        self.verdict == Verdict::No
    }

    /// Whether the verdict asks for a retry later
    pub fn is_throttle(&self) -> bool {
        self.verdict == Verdict::Throttle
    }
}

/// A single allocation policy
pub trait AllocationDecider: Send + Sync {
    /// Vote on placing `shard` on `node` within the given allocation
    fn can_allocate(
        &self,
        shard: &ShardRouting,
        node: &ClusterNode,
        allocation: &RoutingAllocation,
    ) -> Decision;
}

/// The installed decider chain
///
/// Votes fold with NO taking precedence over THROTTLE, which takes
/// precedence over YES. An empty chain allows everything.
#[derive(Default)]
pub struct AllocationDeciders {
    deciders: Vec<Box<dyn AllocationDecider>>,
}

impl AllocationDeciders {
    /// Build a chain from individual deciders
    pub fn new(deciders: Vec<Box<dyn AllocationDecider>>) -> Self {
        Self { deciders }
    }

    /// Fold every decider's vote into one verdict
    pub fn can_allocate(
        &self,
        shard: &ShardRouting,
        node: &ClusterNode,
        allocation: &RoutingAllocation,
    ) -> Decision {
        let mut throttle: Option<Decision> = None;
        for decider in &self.deciders {
            let decision = decider.can_allocate(shard, node, allocation);
            match decision.verdict() {
                Verdict::No => return decision,
                Verdict::Throttle => throttle = throttle.or(Some(decision)),
                Verdict::Yes => {}
            }
        }
        throttle.unwrap_or_else(|| Decision::yes("all deciders allow the allocation"))
    }
}
