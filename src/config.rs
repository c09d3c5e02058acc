//! Store configuration
//!
//! Loaded from an optional JSON document; every field has a default so an
//! empty object (or no file at all) yields a working store.

use serde::Deserialize;
use std::path::Path;

/// Largest string value accepted by default (512 MiB).
pub const DEFAULT_MAX_STRING_LEN: usize = 512 * 1024 * 1024;

/// Default batch size for SCAN, HSCAN and SSCAN.
pub const DEFAULT_SCAN_COUNT: usize = 10;

/// Tunables for a [`Keyspace`](crate::store::Keyspace).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of lock shards. Rounded up to a power of two.
    pub shards: usize,

    /// Batch size used by the SCAN family when the caller gives no COUNT.
    pub scan_count: usize,

    /// Maximum length in bytes of a string value.
    pub max_string_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        // One group of shards per CPU core (min 1, max 16 cores)
        let cores = num_cpus::get().clamp(1, 16);
        StoreConfig {
            shards: cores * 4,
            scan_count: DEFAULT_SCAN_COUNT,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(&raw)?)
    }

    /// Shard count actually used: a power of two, at least 1
    pub fn shard_count(&self) -> usize {
        self.shards.max(1).next_power_of_two()
    }
}
