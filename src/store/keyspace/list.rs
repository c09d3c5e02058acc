//! List operations and blocking pops
//!
//! Lists are delete-on-empty. Pushes hand elements straight to blocked
//! poppers registered on the key before the list becomes visible to
//! anyone else.

use bytes::Bytes;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{get_or_create, normalize_range, remove_if_vacant, typed, typed_mut, Keyspace, Shard};
use crate::error::{StoreError, StoreResult};
use crate::store::blocking::{ListEnd, Waiter};
use crate::store::value::{Value, ValueKind};

/// Outcome of preparing one key for a blocking pop
enum Prepared {
    /// The waiter got an element (possibly from an earlier key)
    Done,
    Registered,
    /// The key changed type since validation; not watched
    Skipped,
}

impl Keyspace {
    /// Prepend values (the last value ends up first), returning the length
    pub fn lpush(&self, key: Bytes, values: Vec<Bytes>) -> StoreResult<usize> {
        self.push(key, values, ListEnd::Left)
    }

    /// Append values, returning the length
    pub fn rpush(&self, key: Bytes, values: Vec<Bytes>) -> StoreResult<usize> {
        self.push(key, values, ListEnd::Right)
    }

    /// Push and serve blocked poppers
    ///
    /// The reported length is taken after the push and before any element
    /// is handed to a waiter.
    fn push(&self, key: Bytes, values: Vec<Bytes>, end: ListEnd) -> StoreResult<usize> {
        if values.is_empty() {
            return self.llen(&key);
        }
        self.with_shard(&key, |shard, slot| {
            let Shard { entries, waiters } = shard;
            let list = get_or_create(entries, slot, ValueKind::List)?
                .as_list_mut()
                .ok_or(StoreError::TypeMismatch)?;
            for value in values {
                end.push(list, value);
            }
            let len = list.len();

            let served = waiters.serve(&key, list);
            if served > 0 {
                debug!("Served {} blocked pop(s) on push", served);
            }
            remove_if_vacant(entries, slot);
            Ok(len)
        })
    }

    pub fn lpop(&self, key: &Bytes) -> StoreResult<Option<Bytes>> {
        self.pop(key, ListEnd::Left)
    }

    pub fn rpop(&self, key: &Bytes) -> StoreResult<Option<Bytes>> {
        self.pop(key, ListEnd::Right)
    }

    fn pop(&self, key: &Bytes, end: ListEnd) -> StoreResult<Option<Bytes>> {
        self.with_shard(key, |shard, slot| {
            let popped = typed_mut(&mut shard.entries, slot, Value::as_list_mut)?.and_then(|list| end.pop(list));
            remove_if_vacant(&mut shard.entries, slot);
            Ok(popped)
        })
    }

    /// Elements between two indices (inclusive), `-1` being the last
    pub fn lrange(&self, key: &Bytes, start: i64, stop: i64) -> StoreResult<Vec<Bytes>> {
        self.with_shard(key, |shard, slot| {
            let Some(list) = typed(&shard.entries, slot, Value::as_list)? else {
                return Ok(Vec::new());
            };
            Ok(match normalize_range(start, stop, list.len()) {
                Some((start, stop)) => list.range(start..=stop).cloned().collect(),
                None => Vec::new(),
            })
        })
    }

    /// Keep only the elements between two indices
    pub fn ltrim(&self, key: &Bytes, start: i64, stop: i64) -> StoreResult<()> {
        self.with_shard(key, |shard, slot| {
            if let Some(list) = typed_mut(&mut shard.entries, slot, Value::as_list_mut)? {
                match normalize_range(start, stop, list.len()) {
                    Some((start, stop)) => {
                        list.truncate(stop + 1);
                        list.drain(..start);
                    }
                    None => list.clear(),
                }
            }
            remove_if_vacant(&mut shard.entries, slot);
            Ok(())
        })
    }

    pub fn llen(&self, key: &Bytes) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_list)?.map_or(0, |list| list.len()))
        })
    }

    /// Pop from the tail of the first non-empty list, waiting up to `timeout`
    ///
    /// Returns `(key, value)`, or `None` once the timeout elapses. A zero
    /// timeout waits indefinitely.
    pub fn brpop(&self, keys: &[Bytes], timeout: Duration) -> StoreResult<Option<(Bytes, Bytes)>> {
        self.blocking_pop(keys, timeout, ListEnd::Right)
    }

    /// Head-side counterpart of [`Keyspace::brpop`]
    pub fn blpop(&self, keys: &[Bytes], timeout: Duration) -> StoreResult<Option<(Bytes, Bytes)>> {
        self.blocking_pop(keys, timeout, ListEnd::Left)
    }

    fn blocking_pop(
        &self,
        keys: &[Bytes],
        timeout: Duration,
        end: ListEnd,
    ) -> StoreResult<Option<(Bytes, Bytes)>> {
        // Type errors are reported before the caller is queued anywhere
        for key in keys {
            if matches!(self.type_of(key), Some(kind) if kind != ValueKind::List) {
                return Err(StoreError::TypeMismatch);
            }
        }

        let waiter = Waiter::new(end);
        let mut watched = Vec::new();
        for key in keys {
            let prepared = self.with_shard(key, |shard, slot| {
                let Shard { entries, waiters } = shard;
                match entries.get_slot_mut(slot).map(|entry| &mut entry.value) {
                    Some(Value::List(list)) if !list.is_empty() => {
                        waiter.offer(key, list);
                        remove_if_vacant(entries, slot);
                        Prepared::Done
                    }
                    Some(Value::List(_)) | None => {
                        if !waiter.is_waiting() {
                            return Prepared::Done;
                        }
                        waiters.register(key.clone(), waiter.clone());
                        Prepared::Registered
                    }
                    Some(_) => Prepared::Skipped,
                }
            });
            match prepared {
                Prepared::Done => break,
                Prepared::Registered => watched.push(key),
                Prepared::Skipped => {}
            }
        }

        // A deadline past what `Instant` can represent waits forever
        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };
        if !watched.is_empty() {
            debug!("Blocking pop waiting on {} key(s)", watched.len());
        }
        let result = if watched.is_empty() && waiter.is_waiting() {
            // Every key changed type under us: nothing to wait on
            waiter.wait(Some(Instant::now()))
        } else {
            waiter.wait(deadline)
        };

        for key in watched {
            self.with_shard(key, |shard, _| shard.waiters.remove(key, &waiter));
        }
        if result.is_none() {
            debug!("Blocking pop timed out");
        }
        Ok(result)
    }
}
