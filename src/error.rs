//! Error types for Lodestone

use crate::cluster::NodeId;
use std::time::Duration;

/// Result type alias for Lodestone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Lodestone
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport errors (fan-out unavailable or timed out as a whole)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Transport-level failures reported by the fan-out clients
///
/// Per-node entries of this type accompany an otherwise successful
/// fan-out; a reroute is aborted only when the fan-out call itself
/// returns one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The node dropped off the transport; expected churn during restarts
    #[error("node {node_id} disconnected")]
    NodeDisconnected { node_id: NodeId },
    /// The node did not answer within the fan-out timeout
    #[error("request to node {node_id} timed out after {timeout:?}")]
    NodeTimeout { node_id: NodeId, timeout: Duration },
    /// The node answered with a failure
    #[error("node {node_id} failed: {reason}")]
    NodeFailed { node_id: NodeId, reason: String },
    /// The transport itself is unusable; aborts the current reroute
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// Disconnects are routine while nodes restart and are logged at a
    /// lower level than genuine failures.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::NodeDisconnected { .. })
    }
}
