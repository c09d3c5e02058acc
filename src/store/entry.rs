//! Entry structure for key-value pairs

use super::value::Value;
use bytes::Bytes;

/// Represents a single entry in the store
#[derive(Debug, Clone)]
pub struct Entry {
    /// The key
    pub key: Bytes,

    /// The value
    pub value: Value,
}

impl Entry {
    /// Create a new entry
    pub fn new(key: impl Into<Bytes>, value: Value) -> Self {
        Entry {
            key: key.into(),
            value,
        }
    }

    /// Calculate approximate memory usage of this entry in bytes
    pub fn memory_usage(&self) -> usize {
        self.key.len() + self.value.memory_usage() + std::mem::size_of::<Entry>()
    }
}
