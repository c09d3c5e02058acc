//! Hash operations
//!
//! Hashes are not delete-on-empty: HDEL of the last field leaves an empty
//! hash behind until the key itself is deleted.

use bytes::Bytes;

use super::string::parse_i64;
use super::{get_or_create, typed, typed_mut, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::scan::ScanPage;
use crate::store::value::{Value, ValueKind};

impl Keyspace {
    /// Upsert one field, returning true if it is new
    pub fn hset(&self, key: Bytes, field: Bytes, value: Bytes) -> StoreResult<bool> {
        self.hset_many(key, vec![(field, value)]).map(|added| added == 1)
    }

    /// Upsert many fields, returning how many were new
    pub fn hset_many(&self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> StoreResult<usize> {
        self.with_shard(&key, |shard, slot| {
            let value = get_or_create(&mut shard.entries, slot, ValueKind::Hash)?;
            let hash = value.as_hash_mut().ok_or(StoreError::TypeMismatch)?;
            Ok(pairs
                .into_iter()
                .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
                .count())
        })
    }

    /// Insert a field only if absent
    pub fn hsetnx(&self, key: Bytes, field: Bytes, value: Bytes) -> StoreResult<bool> {
        self.with_shard(&key, |shard, slot| {
            let hash = get_or_create(&mut shard.entries, slot, ValueKind::Hash)?
                .as_hash_mut()
                .ok_or(StoreError::TypeMismatch)?;
            if hash.contains_key(&field) {
                return Ok(false);
            }
            hash.insert(field, value);
            Ok(true)
        })
    }

    pub fn hget(&self, key: &Bytes, field: &Bytes) -> StoreResult<Option<Bytes>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_hash)?.and_then(|hash| hash.get(field).cloned()))
        })
    }

    /// One slot per requested field, `None` for missing ones
    pub fn hmget(&self, key: &Bytes, fields: &[Bytes]) -> StoreResult<Vec<Option<Bytes>>> {
        self.with_shard(key, |shard, slot| {
            let hash = typed(&shard.entries, slot, Value::as_hash)?;
            Ok(fields
                .iter()
                .map(|field| hash.and_then(|h| h.get(field).cloned()))
                .collect())
        })
    }

    /// Add to an integer field (absent = 0), returning the result
    pub fn hincr_by(&self, key: &Bytes, field: Bytes, delta: i64) -> StoreResult<i64> {
        self.with_shard(key, |shard, slot| {
            let current = match typed(&shard.entries, slot, Value::as_hash)?.and_then(|h| h.get(&field)) {
                Some(bytes) => parse_i64(bytes).ok_or(StoreError::NotAnInteger)?,
                None => 0,
            };
            let next = current.checked_add(delta).ok_or(StoreError::Overflow)?;
            let hash = get_or_create(&mut shard.entries, slot, ValueKind::Hash)?
                .as_hash_mut()
                .ok_or(StoreError::TypeMismatch)?;
            hash.insert(field, Bytes::from(next.to_string()));
            Ok(next)
        })
    }

    /// Snapshot of every field
    pub fn hgetall(&self, key: &Bytes) -> StoreResult<Vec<(Bytes, Bytes)>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_hash)?
                .map(|hash| hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
                .unwrap_or_default())
        })
    }

    /// Remove fields, returning how many existed
    pub fn hdel(&self, key: &Bytes, fields: &[Bytes]) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(match typed_mut(&mut shard.entries, slot, Value::as_hash_mut)? {
                Some(hash) => fields.iter().filter(|f| hash.remove(f).is_some()).count(),
                None => 0,
            })
        })
    }

    pub fn hkeys(&self, key: &Bytes) -> StoreResult<Vec<Bytes>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_hash)?
                .map(|hash| hash.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    pub fn hlen(&self, key: &Bytes) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_hash)?.map_or(0, |hash| hash.len()))
        })
    }

    pub fn hexists(&self, key: &Bytes, field: &Bytes) -> StoreResult<bool> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_hash)?.map_or(false, |hash| hash.contains_key(field)))
        })
    }

    /// One step of a field walk; items are `(field, value)`
    pub fn hscan(
        &self,
        key: &Bytes,
        cursor: u64,
        pattern: Option<&[u8]>,
        count: Option<usize>,
    ) -> StoreResult<ScanPage<(Bytes, Bytes)>> {
        let count = count.unwrap_or(self.config().scan_count);
        self.with_shard(key, |shard, slot| {
            Ok(match typed(&shard.entries, slot, Value::as_hash)? {
                Some(hash) => Keyspace::scan_collection(hash, cursor, pattern, count, |f, v| {
                    (f.clone(), v.clone())
                }),
                None => ScanPage {
                    cursor: 0,
                    items: Vec::new(),
                },
            })
        })
    }
}
