//! Hash-ordered maps and resumable scan cursors
//!
//! A [`ScanMap`] keeps its entries sorted by `(hash(key), key)`. A cursor is
//! simply a hash value: a scan call visits entries whose hash is at or past
//! the cursor and hands back the hash of the first entry it did not visit.
//! Entries never move in hash space, so anything present for a whole scan
//! cycle is returned, while entries inserted or removed mid-scan may or may
//! not show up. Cost per call is O(log n + count).
//!
//! Groups of entries sharing a 64-bit hash are never split across calls, so
//! a returned cursor is always non-zero and 0 keeps meaning "start" / "done".

use bytes::Bytes;
use std::collections::BTreeMap;

use super::router::slot_hash;

/// A key tagged with its scan hash
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanKey {
    hash: u64,
    key: Bytes,
}

impl ScanKey {
    /// Hash a key into its slot
    pub fn new(key: Bytes) -> Self {
        ScanKey {
            hash: slot_hash(&key),
            key,
        }
    }

    /// The scan hash
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The key bytes
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Lowest possible slot for a hash (the empty key sorts first)
    fn floor(hash: u64) -> Self {
        ScanKey {
            hash,
            key: Bytes::new(),
        }
    }
}

/// One step of a scan: the next cursor (0 when done) and the visited items
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage<T> {
    pub cursor: u64,
    pub items: Vec<T>,
}

/// Map from byte keys to values, ordered by key hash
#[derive(Debug, Clone)]
pub struct ScanMap<V> {
    map: BTreeMap<ScanKey, V>,
}

impl<V> Default for ScanMap<V> {
    fn default() -> Self {
        ScanMap {
            map: BTreeMap::new(),
        }
    }
}

impl<V> ScanMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &Bytes) -> Option<&V> {
        self.map.get(&ScanKey::new(key.clone()))
    }

    pub fn get_mut(&mut self, key: &Bytes) -> Option<&mut V> {
        self.map.get_mut(&ScanKey::new(key.clone()))
    }

    pub fn contains_key(&self, key: &Bytes) -> bool {
        self.get(key).is_some()
    }

    /// Insert, returning the previous value for the key
    pub fn insert(&mut self, key: Bytes, value: V) -> Option<V> {
        self.map.insert(ScanKey::new(key), value)
    }

    pub fn remove(&mut self, key: &Bytes) -> Option<V> {
        self.map.remove(&ScanKey::new(key.clone()))
    }

    /// Lookup with a precomputed slot
    pub fn get_slot(&self, slot: &ScanKey) -> Option<&V> {
        self.map.get(slot)
    }

    pub fn get_slot_mut(&mut self, slot: &ScanKey) -> Option<&mut V> {
        self.map.get_mut(slot)
    }

    pub fn remove_slot(&mut self, slot: &ScanKey) -> Option<V> {
        self.map.remove(slot)
    }

    /// Get the value for a slot, inserting `default()` first when absent
    pub fn get_or_insert_with(&mut self, slot: &ScanKey, default: impl FnOnce() -> V) -> &mut V {
        self.map.entry(slot.clone()).or_insert_with(default)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Iterate in hash order
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &V)> {
        self.map.iter().map(|(slot, value)| (&slot.key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.map.keys().map(|slot| &slot.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values()
    }

    /// Visit up to `count` entries starting at hash `cursor`
    ///
    /// Returns the visited entries and the cursor to resume from, or `None`
    /// when the end of the map was reached.
    pub fn scan_from(&self, cursor: u64, count: usize) -> (Vec<(&Bytes, &V)>, Option<u64>) {
        let count = count.max(1);
        let mut batch = Vec::new();
        let mut last_hash = None;

        for (slot, value) in self.map.range(ScanKey::floor(cursor)..) {
            if batch.len() >= count && last_hash != Some(slot.hash) {
                return (batch, Some(slot.hash));
            }
            last_hash = Some(slot.hash);
            batch.push((&slot.key, value));
        }

        (batch, None)
    }
}

impl<V: PartialEq> PartialEq for ScanMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<V> FromIterator<(Bytes, V)> for ScanMap<V> {
    fn from_iter<I: IntoIterator<Item = (Bytes, V)>>(iter: I) -> Self {
        ScanMap {
            map: iter
                .into_iter()
                .map(|(key, value)| (ScanKey::new(key), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample(n: usize) -> ScanMap<usize> {
        (0..n)
            .map(|i| (Bytes::from(format!("field:{}", i)), i))
            .collect()
    }

    fn full_cycle(map: &ScanMap<usize>, count: usize) -> Vec<Bytes> {
        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let (batch, next) = map.scan_from(cursor, count);
            seen.extend(batch.into_iter().map(|(k, _)| k.clone()));
            match next {
                Some(next) => {
                    assert_ne!(next, 0);
                    cursor = next;
                }
                None => return seen,
            }
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let mut map = ScanMap::new();
        assert!(map.insert(Bytes::from("a"), 1).is_none());
        assert_eq!(map.insert(Bytes::from("a"), 2), Some(1));
        assert_eq!(map.get(&Bytes::from("a")), Some(&2));
        assert_eq!(map.remove(&Bytes::from("a")), Some(2));
        assert!(map.is_empty());
    }

    #[test]
    fn test_scan_visits_everything_once() {
        let map = sample(1000);
        let seen = full_cycle(&map, 7);
        assert_eq!(seen.len(), 1000);
        let unique: HashSet<_> = seen.into_iter().collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn test_scan_single_call_when_count_covers_all() {
        let map = sample(5);
        let (batch, next) = map.scan_from(0, 10);
        assert_eq!(batch.len(), 5);
        assert!(next.is_none());
    }

    #[test]
    fn test_scan_survives_concurrent_mutation() {
        let mut map = sample(200);
        let (first, next) = map.scan_from(0, 50);
        let mut seen: HashSet<Bytes> = first.into_iter().map(|(k, _)| k.clone()).collect();
        let mut cursor = next.unwrap();

        // Mutate between calls: drop a visited key, add new ones
        let visited = seen.iter().next().cloned().unwrap();
        map.remove(&visited);
        for i in 0..50 {
            map.insert(Bytes::from(format!("late:{}", i)), i);
        }

        loop {
            let (batch, next) = map.scan_from(cursor, 50);
            seen.extend(batch.into_iter().map(|(k, _)| k.clone()));
            match next {
                Some(n) => cursor = n,
                None => break,
            }
        }

        // Every original key that stayed for the whole cycle was returned
        for i in 0..200 {
            let key = Bytes::from(format!("field:{}", i));
            if key != visited {
                assert!(seen.contains(&key), "missing {:?}", key);
            }
        }
    }

    #[test]
    fn test_scan_empty_map() {
        let map: ScanMap<()> = ScanMap::new();
        let (batch, next) = map.scan_from(0, 10);
        assert!(batch.is_empty());
        assert!(next.is_none());
    }
}
