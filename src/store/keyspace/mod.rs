//! Sharded keyspace
//!
//! The keyspace owns every entry. Keys are spread over a power-of-two
//! number of shards, each behind its own `parking_lot::Mutex`, so
//! commands on unrelated keys rarely contend. A command holds exactly one
//! shard lock at a time: single-key commands are atomic, multi-key
//! commands (MSET, SINTER, PFMERGE, DEL with many keys...) are atomic per
//! key only.
//!
//! Per-type operations live in the sibling files as further
//! `impl Keyspace` blocks.

mod hash;
mod list;
mod set;
mod sketch;
mod stream;
mod string;
mod zset;

pub use string::SetCondition;
pub(crate) use string::format_float;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::blocking::WaitQueues;
use super::entry::Entry;
use super::pattern::glob_match;
use super::router::ShardRouter;
use super::scan::{ScanKey, ScanMap, ScanPage};
use super::value::{Value, ValueKind};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// One lock domain: its entries plus the blocked poppers on its keys
#[derive(Debug, Default)]
pub(crate) struct Shard {
    pub(crate) entries: ScanMap<Entry>,
    pub(crate) waiters: WaitQueues,
}

/// Typed read of a slot: `Ok(None)` when absent, `TypeMismatch` when the
/// stored value is of another kind.
pub(crate) fn typed<'a, T: ?Sized>(
    entries: &'a ScanMap<Entry>,
    slot: &ScanKey,
    view: impl FnOnce(&'a Value) -> Option<&'a T>,
) -> StoreResult<Option<&'a T>> {
    match entries.get_slot(slot) {
        None => Ok(None),
        Some(entry) => view(&entry.value).map(Some).ok_or(StoreError::TypeMismatch),
    }
}

/// Mutable counterpart of [`typed`]
pub(crate) fn typed_mut<'a, T: ?Sized>(
    entries: &'a mut ScanMap<Entry>,
    slot: &ScanKey,
    view: impl FnOnce(&'a mut Value) -> Option<&'a mut T>,
) -> StoreResult<Option<&'a mut T>> {
    match entries.get_slot_mut(slot) {
        None => Ok(None),
        Some(entry) => view(&mut entry.value)
            .map(Some)
            .ok_or(StoreError::TypeMismatch),
    }
}

/// Get the value in `slot`, creating an empty `kind` when absent
///
/// Fails with `TypeMismatch` and changes nothing when the key holds
/// another kind.
pub(crate) fn get_or_create<'a>(
    entries: &'a mut ScanMap<Entry>,
    slot: &ScanKey,
    kind: ValueKind,
) -> StoreResult<&'a mut Value> {
    if let Some(entry) = entries.get_slot(slot) {
        if entry.value.kind() != kind {
            return Err(StoreError::TypeMismatch);
        }
    }
    let entry = entries.get_or_insert_with(slot, || Entry::new(slot.key().clone(), Value::empty(kind)));
    Ok(&mut entry.value)
}

/// Drop `slot` if it holds an emptied list, set or sorted set
pub(crate) fn remove_if_vacant(entries: &mut ScanMap<Entry>, slot: &ScanKey) {
    if entries
        .get_slot(slot)
        .map_or(false, |entry| entry.value.is_vacant())
    {
        entries.remove_slot(slot);
    }
}

/// Statistics about the keyspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceStats {
    pub keys: usize,
    pub used_memory_bytes: usize,
    pub shards: usize,
    pub blocked_waiters: usize,
}

/// In-memory multi-type keyspace
///
/// `Keyspace` is `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Keyspace {
    shards: Box<[Mutex<Shard>]>,
    router: ShardRouter,
    config: StoreConfig,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Keyspace {
    /// Create a keyspace from a configuration
    pub fn new(config: StoreConfig) -> Self {
        let count = config.shard_count();
        let shards = (0..count)
            .map(|_| Mutex::new(Shard::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        info!("Keyspace created with {} shards", count);
        Keyspace {
            shards,
            router: ShardRouter::new(count),
            config,
        }
    }

    /// Create a keyspace with default settings and an explicit shard count
    pub fn with_shards(shards: usize) -> Self {
        Self::new(StoreConfig {
            shards,
            ..StoreConfig::default()
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `f` under the lock of the shard owning `key`
    pub(crate) fn with_shard<T>(&self, key: &Bytes, f: impl FnOnce(&mut Shard, &ScanKey) -> T) -> T {
        let slot = ScanKey::new(key.clone());
        let mut shard = self.shards[self.router.route_hash(slot.hash())].lock();
        f(&mut shard, &slot)
    }

    /// Snapshot of the entry stored under `key`
    pub fn get(&self, key: &Bytes) -> Option<Entry> {
        self.with_shard(key, |shard, slot| shard.entries.get_slot(slot).cloned())
    }

    /// Run `f` on the entry for `key`, creating an empty `kind` first if absent
    ///
    /// An entry created here and left empty by `f` is removed again when
    /// its kind is delete-on-empty.
    pub fn get_or_create<T>(
        &self,
        key: &Bytes,
        kind: ValueKind,
        f: impl FnOnce(&mut Value) -> T,
    ) -> StoreResult<T> {
        self.with_shard(key, |shard, slot| {
            let out = f(get_or_create(&mut shard.entries, slot, kind)?);
            remove_if_vacant(&mut shard.entries, slot);
            Ok(out)
        })
    }

    /// Delete a key, returns true if the key existed
    pub fn delete(&self, key: &Bytes) -> bool {
        self.with_shard(key, |shard, slot| shard.entries.remove_slot(slot).is_some())
    }

    /// Delete several keys, returning how many existed
    pub fn delete_many(&self, keys: &[Bytes]) -> usize {
        keys.iter().filter(|key| self.delete(key)).count()
    }

    /// Check if a key exists
    pub fn exists(&self, key: &Bytes) -> bool {
        self.with_shard(key, |shard, slot| shard.entries.get_slot(slot).is_some())
    }

    /// Count existing keys; a key named twice counts twice
    pub fn exists_many(&self, keys: &[Bytes]) -> usize {
        keys.iter().filter(|key| self.exists(key)).count()
    }

    pub fn type_of(&self, key: &Bytes) -> Option<ValueKind> {
        self.with_shard(key, |shard, slot| {
            shard.entries.get_slot(slot).map(|entry| entry.value.kind())
        })
    }

    /// Approximate bytes used by a key and its value
    pub fn memory_usage(&self, key: &Bytes) -> Option<usize> {
        self.with_shard(key, |shard, slot| {
            shard.entries.get_slot(slot).map(Entry::memory_usage)
        })
    }

    /// All keys matching a glob pattern
    ///
    /// O(n) over the whole keyspace; prefer [`Keyspace::scan`] on large
    /// data sets.
    pub fn keys(&self, pattern: &[u8]) -> Vec<Bytes> {
        let mut out = Vec::new();
        for shard in self.shards.iter() {
            let shard = shard.lock();
            out.extend(
                shard
                    .entries
                    .keys()
                    .filter(|key| glob_match(pattern, key))
                    .cloned(),
            );
        }
        out
    }

    /// One step of an incremental keyspace walk
    ///
    /// Start with cursor 0 and feed back the returned cursor until it is 0
    /// again. `count` bounds how many keys are visited (before pattern
    /// filtering) and defaults to the configured `scan_count`.
    pub fn scan(&self, cursor: u64, pattern: Option<&[u8]>, count: Option<usize>) -> ScanPage<Bytes> {
        let count = count.unwrap_or(self.config.scan_count).max(1);
        let mut cursor = cursor;
        let mut visited = 0;
        let mut items = Vec::new();

        loop {
            let index = self.router.route_hash(cursor);
            let next = {
                let shard = self.shards[index].lock();
                let (batch, next) = shard.entries.scan_from(cursor, count.saturating_sub(visited));
                visited += batch.len();
                items.extend(
                    batch
                        .into_iter()
                        .map(|(key, _)| key)
                        .filter(|key| pattern.map_or(true, |p| glob_match(p, key)))
                        .cloned(),
                );
                next
            };

            cursor = match next {
                Some(next) => next,
                None if index + 1 < self.shards.len() => self.router.shard_start(index + 1),
                None => return ScanPage { cursor: 0, items },
            };
            if visited >= count {
                return ScanPage { cursor, items };
            }
        }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all keys
    ///
    /// Blocked poppers stay queued and are served by later pushes.
    pub fn flush(&self) {
        for shard in self.shards.iter() {
            shard.lock().entries.clear();
        }
        debug!("Keyspace flushed");
    }

    /// Get statistics about the keyspace
    pub fn stats(&self) -> KeyspaceStats {
        let mut stats = KeyspaceStats {
            keys: 0,
            used_memory_bytes: 0,
            shards: self.shards.len(),
            blocked_waiters: 0,
        };
        for shard in self.shards.iter() {
            let shard = shard.lock();
            stats.keys += shard.entries.len();
            stats.used_memory_bytes += shard.entries.values().map(Entry::memory_usage).sum::<usize>();
            stats.blocked_waiters += shard.waiters.len();
        }
        stats
    }

    /// Collect a collection's members one scan step at a time
    pub(crate) fn scan_collection<V, T>(
        map: &ScanMap<V>,
        cursor: u64,
        pattern: Option<&[u8]>,
        count: usize,
        item: impl Fn(&Bytes, &V) -> T,
    ) -> ScanPage<T> {
        let (batch, next) = map.scan_from(cursor, count);
        let items = batch
            .into_iter()
            .filter(|(key, _)| pattern.map_or(true, |p| glob_match(p, key)))
            .map(|(key, value)| item(key, value))
            .collect();
        ScanPage {
            cursor: next.unwrap_or(0),
            items,
        }
    }
}

/// Turn `start`/`stop` (negative = from the end) into an inclusive window
///
/// Returns `None` when the window is empty.
pub(crate) fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_exists_and_delete_any_type() {
        let ks = Keyspace::with_shards(4);
        ks.set(b("str"), b("v")).unwrap();
        ks.hset(b("hash"), b("f"), b("v")).unwrap();
        ks.pfadd(b("hll"), &[b("a")]).unwrap();

        assert_eq!(ks.exists_many(&[b("str"), b("hash"), b("hll"), b("nope")]), 3);
        assert_eq!(ks.delete_many(&[b("str"), b("hash"), b("hll"), b("nope")]), 3);
        assert!(ks.is_empty());
    }

    #[test]
    fn test_type_of() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("s"), b("v")).unwrap();
        ks.hset(b("h"), b("f"), b("v")).unwrap();
        ks.sadd(b("set"), vec![b("m")]).unwrap();
        ks.zadd(b("z"), vec![(1.0, b("m"))]).unwrap();
        ks.rpush(b("l"), vec![b("x")]).unwrap();
        ks.pfadd(b("p"), &[b("x")]).unwrap();

        assert_eq!(ks.type_of(&b("s")).map(ValueKind::type_name), Some("string"));
        assert_eq!(ks.type_of(&b("h")).map(ValueKind::type_name), Some("hash"));
        assert_eq!(ks.type_of(&b("set")).map(ValueKind::type_name), Some("set"));
        assert_eq!(ks.type_of(&b("z")).map(ValueKind::type_name), Some("zset"));
        assert_eq!(ks.type_of(&b("l")).map(ValueKind::type_name), Some("list"));
        assert_eq!(ks.type_of(&b("p")).map(ValueKind::type_name), Some("string"));
        assert_eq!(ks.type_of(&b("missing")), None);
    }

    #[test]
    fn test_get_or_create_type_mismatch() {
        let ks = Keyspace::with_shards(1);
        ks.set(b("k"), b("v")).unwrap();
        let result = ks.get_or_create(&b("k"), ValueKind::Hash, |_| ());
        assert_eq!(result, Err(StoreError::TypeMismatch));
        assert_eq!(ks.get(&b("k")).and_then(|e| e.value.as_string().cloned()), Some(b("v")));

        // A created-but-empty list is cleaned up again
        ks.get_or_create(&b("l"), ValueKind::List, |_| ()).unwrap();
        assert!(!ks.exists(&b("l")));
    }

    #[test]
    fn test_keys_pattern() {
        let ks = Keyspace::with_shards(4);
        for key in ["user:1", "user:2", "session:1"] {
            ks.set(b(key), b("v")).unwrap();
        }
        let mut keys = ks.keys(b"user:*");
        keys.sort();
        assert_eq!(keys, vec![b("user:1"), b("user:2")]);
        assert_eq!(ks.keys(b"*").len(), 3);
    }

    #[test]
    fn test_scan_full_cycle() {
        let ks = Keyspace::with_shards(8);
        for i in 0..500 {
            ks.set(b(&format!("key:{}", i)), b("v")).unwrap();
        }

        let mut seen = HashSet::new();
        let mut cursor = 0;
        let mut calls = 0;
        loop {
            let page = ks.scan(cursor, None, Some(20));
            assert!(page.items.len() <= 40);
            seen.extend(page.items);
            calls += 1;
            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 500);
        assert!(calls >= 25);
    }

    #[test]
    fn test_scan_pattern_filters_after_visit() {
        let ks = Keyspace::with_shards(2);
        for i in 0..50 {
            ks.set(b(&format!("a:{}", i)), b("v")).unwrap();
            ks.set(b(&format!("b:{}", i)), b("v")).unwrap();
        }
        let mut found = Vec::new();
        let mut cursor = 0;
        loop {
            let page = ks.scan(cursor, Some(b"a:*"), None);
            found.extend(page.items);
            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(found.len(), 50);
        assert!(found.iter().all(|k| k.starts_with(b"a:")));
    }

    #[test]
    fn test_scan_empty_keyspace() {
        let ks = Keyspace::with_shards(4);
        let page = ks.scan(0, None, None);
        assert_eq!(page.cursor, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_flush_and_stats() {
        let ks = Keyspace::with_shards(4);
        ks.set(b("a"), b("1")).unwrap();
        ks.set(b("b"), b("2")).unwrap();
        let stats = ks.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.shards, 4);
        assert!(stats.used_memory_bytes > 0);

        ks.flush();
        assert_eq!(ks.len(), 0);
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(0, -1, 4), Some((0, 3)));
        assert_eq!(normalize_range(-2, -1, 4), Some((2, 3)));
        assert_eq!(normalize_range(1, 100, 4), Some((1, 3)));
        assert_eq!(normalize_range(-100, 1, 4), Some((0, 1)));
        assert_eq!(normalize_range(3, 1, 4), None);
        assert_eq!(normalize_range(5, 10, 4), None);
        assert_eq!(normalize_range(0, -1, 0), None);
        assert_eq!(normalize_range(0, -5, 4), None);
    }
}
