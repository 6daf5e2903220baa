//! Store file metadata listing

use super::NodeFailure;
use crate::cluster::{ClusterNode, NodeId, ShardId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One segment file in a shard store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFileEntry {
    /// File name within the store
    pub name: String,
    /// File length in bytes
    pub length: u64,
    /// Content checksum
    pub checksum: String,
}

impl StoreFileEntry {
    /// Create a file entry
    pub fn new(name: &str, length: u64, checksum: &str) -> Self {
        Self {
            name: name.to_string(),
            length,
            checksum: checksum.to_string(),
        }
    }

    /// Whether two entries describe the same bytes
    pub fn is_same(&self, other: &StoreFileEntry) -> bool {
        self.name == other.name && self.length == other.length && self.checksum == other.checksum
    }
}

/// Metadata of a shard store on one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreFilesMetadata {
    /// The node already hosts a live copy of the shard
    pub allocated: bool,
    /// Commit marker; two stores sharing it hold identical segments
    pub sync_id: Option<String>,
    /// Segment files present in the store
    pub files: Vec<StoreFileEntry>,
}

impl StoreFilesMetadata {
    /// Metadata of an unallocated store holding the given files
    pub fn unallocated(files: Vec<StoreFileEntry>) -> Self {
        Self {
            allocated: false,
            sync_id: None,
            files,
        }
    }

    /// Metadata of the store backing a live copy
    pub fn allocated(files: Vec<StoreFileEntry>) -> Self {
        Self {
            allocated: true,
            sync_id: None,
            files,
        }
    }

    /// Builder-style sync id
    pub fn with_sync_id(mut self, sync_id: &str) -> Self {
        self.sync_id = Some(sync_id.to_string());
        self
    }

    /// Look up a file by name
    pub fn file(&self, name: &str) -> Option<&StoreFileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Bytes of this store that are identical in `other` and could be
    /// reused instead of copied during recovery
    pub fn reusable_bytes_with(&self, other: &StoreFilesMetadata) -> u64 {
        self.files
            .iter()
            .filter(|file| other.file(&file.name).is_some_and(|peer| peer.is_same(file)))
            .map(|file| file.length)
            .sum()
    }
}

/// Fan-out result: per-node stores plus per-node failures
///
/// A node that already hosts a live copy of the shard answers with
/// `None` so the caller can rule it out without a second call.
#[derive(Debug, Clone, Default)]
pub struct StoreMetadataResponse {
    /// Successful per-node reports
    pub stores: Vec<(ClusterNode, Option<StoreFilesMetadata>)>,
    /// Nodes that failed to answer
    pub failures: Vec<NodeFailure>,
}

/// Client that asks data nodes for the store files they hold for a shard
#[async_trait]
pub trait ListStoreMetadata: Send + Sync {
    /// List store metadata on `node_ids`, waiting at most `timeout`.
    /// Nodes that fail or time out appear in
    /// [`StoreMetadataResponse::failures`]; an `Err` means the fan-out
    /// itself could not run.
    async fn list(
        &self,
        shard_id: &ShardId,
        include_unallocated: bool,
        node_ids: &[NodeId],
        timeout: Duration,
    ) -> Result<StoreMetadataResponse>;
}
