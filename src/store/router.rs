//! Key hashing and shard routing
//!
//! Keys are hashed with SipHash-1-3. The high bits of the hash pick the
//! shard, so walking shards in index order and each shard in hash order
//! visits the whole hash space in ascending order. SCAN cursors rely on
//! this.

use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Hash a key or collection field
///
/// Fixed SipHash keys: the same bytes always land on the same hash, which
/// keeps cursors valid across calls.
pub fn slot_hash(key: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write(key);
    hasher.finish()
}

/// Routes hashes to shards
#[derive(Debug, Clone)]
pub struct ShardRouter {
    num_shards: usize,
    bits: u32,
}

impl ShardRouter {
    /// Create a new shard router
    pub fn new(num_shards: usize) -> Self {
        assert!(
            num_shards.is_power_of_two(),
            "Number of shards must be a power of two"
        );
        ShardRouter {
            num_shards,
            bits: num_shards.trailing_zeros(),
        }
    }

    /// Route a key to a shard ID
    pub fn route_key(&self, key: &[u8]) -> usize {
        self.route_hash(slot_hash(key))
    }

    /// Route an already computed hash to a shard ID
    pub fn route_hash(&self, hash: u64) -> usize {
        if self.bits == 0 {
            0
        } else {
            (hash >> (64 - self.bits)) as usize
        }
    }

    /// Smallest hash owned by a shard
    pub fn shard_start(&self, shard: usize) -> u64 {
        if self.bits == 0 {
            0
        } else {
            (shard as u64) << (64 - self.bits)
        }
    }

    /// Get the number of shards
    pub fn num_shards(&self) -> usize {
        self.num_shards
    }
}
