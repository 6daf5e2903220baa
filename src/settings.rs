//! Hierarchical key-value settings
//!
//! Cluster and index configuration reaches the allocator as a flat bag of
//! dotted string keys. Several knobs kept their legacy aliases when they
//! were renamed, so lookups walk a prioritized key list and the first
//! key present wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Flat bag of dotted string settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Create an empty settings bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Insert or overwrite a setting
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Get a raw setting value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get the first present value among `keys`
    pub fn get_first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Get a boolean setting, falling back to `default` when the key is
    /// absent or unparseable
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(raw) => match parse_bool(raw) {
                Some(value) => value,
                None => {
                    warn!("ignoring non-boolean setting {} [{}]", key, raw);
                    default
                }
            },
        }
    }

    /// Get a duration from the first present key, falling back to
    /// `default` when no key is set or the value is unparseable
    pub fn get_duration_first(&self, keys: &[&str], default: Duration) -> Duration {
        for key in keys {
            let Some(raw) = self.get(key) else {
                continue;
            };
            match parse_duration(raw) {
                Some(value) => return value,
                None => {
                    warn!("ignoring non-duration setting {} [{}]", key, raw);
                    return default;
                }
            }
        }
        default
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a human-readable duration: `30s`, `500ms`, `5m`, or a bare
/// number of seconds.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(millis) = raw.strip_suffix("ms") {
        return millis.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(secs) = raw.strip_suffix('s') {
        return secs.trim().parse::<u64>().ok().map(Duration::from_secs);
    }
    if let Some(mins) = raw.strip_suffix('m') {
        return mins
            .trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60));
    }
    raw.parse::<u64>().ok().map(Duration::from_secs)
}
