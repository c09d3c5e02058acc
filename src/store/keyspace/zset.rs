//! Sorted set operations

use bytes::Bytes;

use super::{get_or_create, normalize_range, remove_if_vacant, typed, typed_mut, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::value::{Value, ValueKind};

impl Keyspace {
    /// Add or update `(score, member)` pairs, returning how many were new
    ///
    /// A NaN score rejects the whole call before anything is written.
    pub fn zadd(&self, key: Bytes, pairs: Vec<(f64, Bytes)>) -> StoreResult<usize> {
        if pairs.iter().any(|(score, _)| score.is_nan()) {
            return Err(StoreError::NotAFloat);
        }
        self.with_shard(&key, |shard, slot| {
            let zset = get_or_create(&mut shard.entries, slot, ValueKind::SortedSet)?
                .as_sorted_set_mut()
                .ok_or(StoreError::TypeMismatch)?;
            let added = pairs
                .into_iter()
                .filter(|(score, member)| zset.add(member.clone(), *score))
                .count();
            remove_if_vacant(&mut shard.entries, slot);
            Ok(added)
        })
    }

    /// Members by ascending rank, `-1` being the last
    pub fn zrange(&self, key: &Bytes, start: i64, stop: i64) -> StoreResult<Vec<(Bytes, f64)>> {
        self.with_shard(key, |shard, slot| {
            let Some(zset) = typed(&shard.entries, slot, Value::as_sorted_set)? else {
                return Ok(Vec::new());
            };
            Ok(match normalize_range(start, stop, zset.len()) {
                Some((start, stop)) => zset.range_by_rank(start, stop),
                None => Vec::new(),
            })
        })
    }

    pub fn zrank(&self, key: &Bytes, member: &Bytes) -> StoreResult<Option<usize>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_sorted_set)?.and_then(|z| z.rank(member)))
        })
    }

    pub fn zrevrank(&self, key: &Bytes, member: &Bytes) -> StoreResult<Option<usize>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_sorted_set)?.and_then(|z| z.rev_rank(member)))
        })
    }

    pub fn zscore(&self, key: &Bytes, member: &Bytes) -> StoreResult<Option<f64>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_sorted_set)?.and_then(|z| z.score(member)))
        })
    }

    pub fn zcard(&self, key: &Bytes) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_sorted_set)?.map_or(0, |z| z.len()))
        })
    }

    /// Remove members, returning how many existed
    pub fn zrem(&self, key: &Bytes, members: &[Bytes]) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            let removed = match typed_mut(&mut shard.entries, slot, Value::as_sorted_set_mut)? {
                Some(zset) => members.iter().filter(|m| zset.remove(m)).count(),
                None => 0,
            };
            remove_if_vacant(&mut shard.entries, slot);
            Ok(removed)
        })
    }

    /// Remove members between two ranks (inclusive), returning how many
    pub fn zremrangebyrank(&self, key: &Bytes, start: i64, stop: i64) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            let removed = match typed_mut(&mut shard.entries, slot, Value::as_sorted_set_mut)? {
                Some(zset) => match normalize_range(start, stop, zset.len()) {
                    Some((start, stop)) => zset.remove_range_by_rank(start, stop),
                    None => 0,
                },
                None => 0,
            };
            remove_if_vacant(&mut shard.entries, slot);
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn names(range: Vec<(Bytes, f64)>) -> Vec<Bytes> {
        range.into_iter().map(|(m, _)| m).collect()
    }

    fn seeded() -> Keyspace {
        let ks = Keyspace::with_shards(2);
        ks.zadd(
            b("z"),
            vec![(1.0, b("one")), (3.0, b("three")), (5.0, b("five")), (2.0, b("two"))],
        )
        .unwrap();
        ks
    }

    #[test]
    fn test_zadd_and_zrange() {
        let ks = seeded();
        assert_eq!(
            names(ks.zrange(&b("z"), 0, -1).unwrap()),
            vec![b("one"), b("two"), b("three"), b("five")]
        );
        assert_eq!(names(ks.zrange(&b("z"), -2, -1).unwrap()), vec![b("three"), b("five")]);
        assert!(ks.zrange(&b("z"), 10, 20).unwrap().is_empty());
        assert!(ks.zrange(&b("missing"), 0, -1).unwrap().is_empty());
    }

    #[test]
    fn test_ranks_and_score() {
        let ks = seeded();
        assert_eq!(ks.zrank(&b("z"), &b("three")).unwrap(), Some(2));
        assert_eq!(ks.zrevrank(&b("z"), &b("five")).unwrap(), Some(0));
        assert_eq!(ks.zscore(&b("z"), &b("five")).unwrap(), Some(5.0));
        assert_eq!(ks.zscore(&b("z"), &b("nope")).unwrap(), None);
    }

    #[test]
    fn test_zadd_updates_position() {
        let ks = seeded();
        assert_eq!(ks.zadd(b("z"), vec![(10.0, b("one"))]).unwrap(), 0);
        assert_eq!(ks.zrevrank(&b("z"), &b("one")).unwrap(), Some(0));
        assert_eq!(ks.zcard(&b("z")).unwrap(), 4);
    }

    #[test]
    fn test_ties_break_by_member() {
        let ks = Keyspace::with_shards(1);
        ks.zadd(b("z"), vec![(1.0, b("b")), (1.0, b("a")), (1.0, b("c"))]).unwrap();
        assert_eq!(names(ks.zrange(&b("z"), 0, -1).unwrap()), vec![b("a"), b("b"), b("c")]);
        assert_eq!(ks.zrevrank(&b("z"), &b("c")).unwrap(), Some(0));
    }

    #[test]
    fn test_zremrangebyrank() {
        let ks = seeded();
        assert_eq!(ks.zremrangebyrank(&b("z"), 0, 1).unwrap(), 2);
        assert_eq!(names(ks.zrange(&b("z"), 0, -1).unwrap()), vec![b("three"), b("five")]);
        assert_eq!(ks.zremrangebyrank(&b("z"), 0, -1).unwrap(), 2);
        assert!(!ks.exists(&b("z")));
    }

    #[test]
    fn test_zrem() {
        let ks = seeded();
        assert_eq!(ks.zrem(&b("z"), &[b("one"), b("zzz")]).unwrap(), 1);
        assert_eq!(ks.zcard(&b("z")).unwrap(), 3);
    }

    #[test]
    fn test_nan_rejected_without_mutation() {
        let ks = seeded();
        let result = ks.zadd(b("z"), vec![(7.0, b("seven")), (f64::NAN, b("bad"))]);
        assert_eq!(result, Err(StoreError::NotAFloat));
        assert_eq!(ks.zcard(&b("z")).unwrap(), 4);
    }
}
