//! Cardinality sketch operations (PFADD / PFCOUNT / PFMERGE)

use bytes::Bytes;

use super::{get_or_create, typed, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::sketch::Sketch;
use crate::store::value::{Value, ValueKind};

impl Keyspace {
    /// Observe elements, returning true if the sketch changed or was created
    pub fn pfadd(&self, key: Bytes, elements: &[Bytes]) -> StoreResult<bool> {
        self.with_shard(&key, |shard, slot| {
            let created = shard.entries.get_slot(slot).is_none();
            let sketch = get_or_create(&mut shard.entries, slot, ValueKind::Sketch)?
                .as_sketch_mut()
                .ok_or(StoreError::TypeMismatch)?;
            let mut changed = created;
            for element in elements {
                changed |= sketch.add(element);
            }
            Ok(changed)
        })
    }

    /// Estimated distinct count of the union of the named sketches
    ///
    /// Missing keys count as empty sketches; nothing is written.
    pub fn pfcount(&self, keys: &[Bytes]) -> StoreResult<u64> {
        if let [key] = keys {
            return self.with_shard(key, |shard, slot| {
                Ok(typed(&shard.entries, slot, Value::as_sketch)?.map_or(0, Sketch::count))
            });
        }
        Ok(self.union_of(keys)?.count())
    }

    /// Store at `dest` the union of `dest` (if present) and every source
    pub fn pfmerge(&self, dest: Bytes, sources: &[Bytes]) -> StoreResult<()> {
        let union = self.union_of(sources)?;
        self.with_shard(&dest, |shard, slot| {
            let sketch = get_or_create(&mut shard.entries, slot, ValueKind::Sketch)?
                .as_sketch_mut()
                .ok_or(StoreError::TypeMismatch)?;
            sketch.merge(&union);
            Ok(())
        })
    }

    /// Register-wise maximum over several keys, each read under its own lock
    fn union_of(&self, keys: &[Bytes]) -> StoreResult<Sketch> {
        let mut union = Sketch::new();
        for key in keys {
            self.with_shard(key, |shard, slot| {
                if let Some(sketch) = typed(&shard.entries, slot, Value::as_sketch)? {
                    union.merge(sketch);
                }
                Ok::<_, StoreError>(())
            })?;
        }
        Ok(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn elements(range: std::ops::Range<u32>) -> Vec<Bytes> {
        range.map(|i| Bytes::from(i.to_string())).collect()
    }

    #[test]
    fn test_pfadd_pfcount() {
        let ks = Keyspace::with_shards(2);
        assert!(ks.pfadd(b("hll"), &[b("1"), b("2"), b("3")]).unwrap());
        assert_eq!(ks.pfcount(&[b("hll")]).unwrap(), 3);
        assert!(!ks.pfadd(b("hll"), &[b("1")]).unwrap());
        assert_eq!(ks.pfcount(&[b("missing")]).unwrap(), 0);
    }

    #[test]
    fn test_pfadd_without_elements_creates_key() {
        let ks = Keyspace::with_shards(2);
        assert!(ks.pfadd(b("hll"), &[]).unwrap());
        assert!(!ks.pfadd(b("hll"), &[]).unwrap());
        assert!(ks.exists(&b("hll")));
    }

    #[test]
    fn test_pfmerge_union() {
        let ks = Keyspace::with_shards(4);
        ks.pfadd(b("a"), &[b("1"), b("2")]).unwrap();
        ks.pfadd(b("b"), &[b("3"), b("4"), b("5")]).unwrap();
        ks.pfmerge(b("dest"), &[b("a"), b("b")]).unwrap();
        assert_eq!(ks.pfcount(&[b("dest")]).unwrap(), 5);
        assert_eq!(ks.pfcount(&[b("a"), b("b")]).unwrap(), 5);
        // Sources untouched
        assert_eq!(ks.pfcount(&[b("a")]).unwrap(), 2);
    }

    #[test]
    fn test_pfmerge_keeps_dest_registers() {
        let ks = Keyspace::with_shards(4);
        ks.pfadd(b("dest"), &[b("x")]).unwrap();
        ks.pfadd(b("src"), &[b("y")]).unwrap();
        ks.pfmerge(b("dest"), &[b("src")]).unwrap();
        assert_eq!(ks.pfcount(&[b("dest")]).unwrap(), 2);
    }

    #[test]
    fn test_large_union_accuracy() {
        let ks = Keyspace::with_shards(4);
        ks.pfadd(b("left"), &elements(0..60_000)).unwrap();
        ks.pfadd(b("right"), &elements(40_000..100_000)).unwrap();
        ks.pfmerge(b("all"), &[b("left"), b("right")]).unwrap();
        let estimate = ks.pfcount(&[b("all")]).unwrap() as f64;
        assert!((estimate - 100_000.0).abs() / 100_000.0 < 0.03, "estimate {}", estimate);
    }

    #[test]
    fn test_sketch_type_errors() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("s"), b("v")).unwrap();
        assert_eq!(ks.pfadd(b("s"), &[b("x")]), Err(StoreError::TypeMismatch));
        assert_eq!(ks.pfcount(&[b("s")]), Err(StoreError::TypeMismatch));
        assert_eq!(ks.pfmerge(b("d"), &[b("s")]), Err(StoreError::TypeMismatch));
        assert!(!ks.exists(&b("d")));
    }

    #[test]
    fn test_sketch_memory_bounded() {
        let ks = Keyspace::with_shards(2);
        ks.pfadd(b("small"), &elements(0..10)).unwrap();
        ks.pfadd(b("big"), &elements(0..50_000)).unwrap();
        let small = ks.memory_usage(&b("small")).unwrap() - "small".len();
        let big = ks.memory_usage(&b("big")).unwrap() - "big".len();
        assert_eq!(small, big);
    }
}
