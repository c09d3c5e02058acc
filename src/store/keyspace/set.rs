//! Set operations
//!
//! Sets are delete-on-empty: SREM or SPOP removing the last member removes
//! the key.

use bytes::Bytes;
use rand::seq::SliceRandom;

use super::{get_or_create, remove_if_vacant, typed, typed_mut, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::scan::ScanPage;
use crate::store::value::{Value, ValueKind};

impl Keyspace {
    /// Add members, returning how many were new
    pub fn sadd(&self, key: Bytes, members: Vec<Bytes>) -> StoreResult<usize> {
        self.with_shard(&key, |shard, slot| {
            let set = get_or_create(&mut shard.entries, slot, ValueKind::Set)?
                .as_set_mut()
                .ok_or(StoreError::TypeMismatch)?;
            let added = members
                .into_iter()
                .filter(|m| set.insert(m.clone(), ()).is_none())
                .count();
            remove_if_vacant(&mut shard.entries, slot);
            Ok(added)
        })
    }

    /// Remove members, returning how many existed
    pub fn srem(&self, key: &Bytes, members: &[Bytes]) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            let removed = match typed_mut(&mut shard.entries, slot, Value::as_set_mut)? {
                Some(set) => members.iter().filter(|m| set.remove(m).is_some()).count(),
                None => 0,
            };
            remove_if_vacant(&mut shard.entries, slot);
            Ok(removed)
        })
    }

    pub fn scard(&self, key: &Bytes) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_set)?.map_or(0, |set| set.len()))
        })
    }

    pub fn sismember(&self, key: &Bytes, member: &Bytes) -> StoreResult<bool> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_set)?.map_or(false, |set| set.contains_key(member)))
        })
    }

    pub fn smembers(&self, key: &Bytes) -> StoreResult<Vec<Bytes>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_set)?
                .map(|set| set.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    /// Members present in every named set; a missing key is an empty set
    ///
    /// Each input set is read under its own shard lock, one after the other.
    pub fn sinter(&self, keys: &[Bytes]) -> StoreResult<Vec<Bytes>> {
        let Some((first, rest)) = keys.split_first() else {
            return Ok(Vec::new());
        };

        let mut result = self.smembers(first)?;
        for key in rest {
            let snapshot = self.with_shard(key, |shard, slot| {
                Ok::<_, StoreError>(typed(&shard.entries, slot, Value::as_set)?.cloned())
            })?;
            match snapshot {
                Some(set) => result.retain(|member| set.contains_key(member)),
                None => result.clear(),
            }
        }
        Ok(result)
    }

    /// Remove and return up to `count` random members
    pub fn spop(&self, key: &Bytes, count: usize) -> StoreResult<Vec<Bytes>> {
        self.with_shard(key, |shard, slot| {
            let popped = match typed_mut(&mut shard.entries, slot, Value::as_set_mut)? {
                Some(set) => {
                    let members: Vec<Bytes> = set.keys().cloned().collect();
                    let chosen: Vec<Bytes> = members
                        .choose_multiple(&mut rand::thread_rng(), count)
                        .cloned()
                        .collect();
                    for member in &chosen {
                        set.remove(member);
                    }
                    chosen
                }
                None => Vec::new(),
            };
            remove_if_vacant(&mut shard.entries, slot);
            Ok(popped)
        })
    }

    /// One step of a member walk
    pub fn sscan(
        &self,
        key: &Bytes,
        cursor: u64,
        pattern: Option<&[u8]>,
        count: Option<usize>,
    ) -> StoreResult<ScanPage<Bytes>> {
        let count = count.unwrap_or(self.config().scan_count);
        self.with_shard(key, |shard, slot| {
            Ok(match typed(&shard.entries, slot, Value::as_set)? {
                Some(set) => Keyspace::scan_collection(set, cursor, pattern, count, |m, _| m.clone()),
                None => ScanPage {
                    cursor: 0,
                    items: Vec::new(),
                },
            })
        })
    }
}
