//! Per-index metadata consumed by the allocator

use crate::settings::Settings;
use serde::{Deserialize, Serialize};

/// Index setting: the index lives on a shared filesystem, so every data
/// node sees the same files
pub const SETTING_SHARED_FILESYSTEM: &str = "index.shared_filesystem";

/// Index setting: a shared-filesystem index may recover its primary on
/// any node, not just nodes that held a copy
pub const SETTING_SHARED_FS_RECOVER_ON_ANY_NODE: &str =
    "index.shared_filesystem.recover_on_any_node";

/// Index setting: per-index override of the quorum mode used when
/// recovering primaries
pub const SETTING_RECOVERY_INITIAL_SHARDS: &str = "index.recovery.initial_shards";

/// The slice of index metadata the allocator consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index UUID, passed through to the shard-state fan-out so stale
    /// on-disk copies of a re-created index are not mistaken for data
    pub uuid: String,
    /// Configured number of replica copies per shard
    pub number_of_replicas: u32,
    /// Per-index settings
    pub settings: Settings,
}

impl IndexMetadata {
    /// Create index metadata with empty settings
    pub fn new(uuid: &str, number_of_replicas: u32) -> Self {
        Self {
            uuid: uuid.to_string(),
            number_of_replicas,
            settings: Settings::new(),
        }
    }

    /// Builder-style settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Whether the index lives on a shared filesystem
    pub fn on_shared_filesystem(&self) -> bool {
        self.settings.get_bool(SETTING_SHARED_FILESYSTEM, false)
    }

    /// Whether the primary may recover on any node. Only meaningful on a
    /// shared filesystem; both settings must be set.
    pub fn recover_on_any_node(&self) -> bool {
        self.on_shared_filesystem()
            && self
                .settings
                .get_bool(SETTING_SHARED_FS_RECOVER_ON_ANY_NODE, false)
    }
}
