//! String operations: SET/GET family, batch writes and counters

use bytes::Bytes;
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::{get_or_create, typed, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::entry::Entry;
use crate::store::value::{Value, ValueKind};

/// Write condition for [`Keyspace::set_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetCondition {
    #[default]
    Always,
    /// NX: only when the key is absent
    IfNotExists,
    /// XX: only when the key is present
    IfExists,
}

impl Keyspace {
    fn check_len(&self, value: &Bytes) -> StoreResult<()> {
        if value.len() > self.config().max_string_len {
            Err(StoreError::ValueTooLarge)
        } else {
            Ok(())
        }
    }

    /// Set a string value
    pub fn set(&self, key: Bytes, value: Bytes) -> StoreResult<()> {
        self.set_with(key, value, SetCondition::Always).map(|_| ())
    }

    /// Set a string value under a condition
    ///
    /// Returns false, without touching anything, when the condition does
    /// not hold. A key of another type is a `TypeMismatch`.
    pub fn set_with(&self, key: Bytes, value: Bytes, condition: SetCondition) -> StoreResult<bool> {
        self.check_len(&value)?;
        self.with_shard(&key, |shard, slot| {
            let current = typed(&shard.entries, slot, Value::as_string)?;
            let allowed = match condition {
                SetCondition::Always => true,
                SetCondition::IfNotExists => current.is_none(),
                SetCondition::IfExists => current.is_some(),
            };
            if allowed {
                shard
                    .entries
                    .insert(key.clone(), Entry::new(key.clone(), Value::String(value)));
            }
            Ok(allowed)
        })
    }

    /// Get a string value
    pub fn get_string(&self, key: &Bytes) -> StoreResult<Option<Bytes>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_string)?.cloned())
        })
    }

    /// Set several keys
    ///
    /// Duplicate keys, oversized values and keys of another type are all
    /// rejected before the first write. The writes themselves are atomic
    /// per key only.
    pub fn mset(&self, pairs: Vec<(Bytes, Bytes)>) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(pairs.len());
        for (key, value) in &pairs {
            if !seen.insert(key) {
                return Err(StoreError::DuplicateKey);
            }
            self.check_len(value)?;
        }
        for (key, _) in &pairs {
            if matches!(self.type_of(key), Some(kind) if kind != ValueKind::String) {
                return Err(StoreError::TypeMismatch);
            }
        }
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Get several string values; missing keys and other types read as `None`
    pub fn mget(&self, keys: &[Bytes]) -> Vec<Option<Bytes>> {
        keys.iter()
            .map(|key| self.get_string(key).ok().flatten())
            .collect()
    }

    /// Add to the integer stored at `key` (absent = 0), returning the result
    pub fn incr_by(&self, key: &Bytes, delta: i64) -> StoreResult<i64> {
        self.with_shard(key, |shard, slot| {
            let current = match typed(&shard.entries, slot, Value::as_string)? {
                Some(bytes) => parse_i64(bytes).ok_or(StoreError::NotAnInteger)?,
                None => 0,
            };
            let next = current.checked_add(delta).ok_or(StoreError::Overflow)?;
            let value = get_or_create(&mut shard.entries, slot, ValueKind::String)?;
            *value = Value::String(Bytes::from(next.to_string()));
            Ok(next)
        })
    }

    /// Subtract from the integer stored at `key`
    pub fn decr_by(&self, key: &Bytes, delta: i64) -> StoreResult<i64> {
        let delta = delta.checked_neg().ok_or(StoreError::Overflow)?;
        self.incr_by(key, delta)
    }

    /// Add a float to the number stored at `key`, returning the stored text
    ///
    /// Decimal arithmetic is used when both operands fit, so `80 + 0.5`
    /// stores `80.5` and `0.1 + 0.2` stores `0.3`.
    pub fn incr_by_float(&self, key: &Bytes, delta: f64) -> StoreResult<Bytes> {
        if !delta.is_finite() {
            return Err(StoreError::NotAFloat);
        }
        self.with_shard(key, |shard, slot| {
            let current = typed(&shard.entries, slot, Value::as_string)?;
            let next = add_float(current.map(|b| b.as_ref()), delta)?;
            let value = get_or_create(&mut shard.entries, slot, ValueKind::String)?;
            *value = Value::String(next.clone());
            Ok(next)
        })
    }
}

pub(crate) fn parse_i64(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn parse_finite(text: &str) -> StoreResult<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(StoreError::NotAFloat),
    }
}

fn add_float(current: Option<&[u8]>, delta: f64) -> StoreResult<Bytes> {
    let text = match current {
        Some(bytes) => std::str::from_utf8(bytes).map_err(|_| StoreError::NotAFloat)?,
        None => "0",
    };
    let base = parse_finite(text)?;

    // Operands with more digits than a Decimal holds take the f64 path
    if let (Ok(a), Ok(b)) = (
        Decimal::from_str_exact(text),
        Decimal::from_str_exact(&delta.to_string()),
    ) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Bytes::from(sum.normalize().to_string()));
        }
    }

    let sum = base + delta;
    if !sum.is_finite() {
        return Err(StoreError::NotAFloat);
    }
    Ok(Bytes::from(format_float(sum)))
}

/// Shortest round-trip text for a float, without exponent notation
pub(crate) fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_set_get() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("key"), b("value")).unwrap();
        assert_eq!(ks.get_string(&b("key")).unwrap(), Some(b("value")));
        assert_eq!(ks.get_string(&b("missing")).unwrap(), None);
    }

    #[test]
    fn test_set_conditions() {
        let ks = Keyspace::with_shards(2);
        assert!(!ks.set_with(b("k"), b("x"), SetCondition::IfExists).unwrap());
        assert!(!ks.exists(&b("k")));

        assert!(ks.set_with(b("k"), b("v1"), SetCondition::IfNotExists).unwrap());
        assert!(!ks.set_with(b("k"), b("v2"), SetCondition::IfNotExists).unwrap());
        assert_eq!(ks.get_string(&b("k")).unwrap(), Some(b("v1")));

        assert!(ks.set_with(b("k"), b("v3"), SetCondition::IfExists).unwrap());
        assert_eq!(ks.get_string(&b("k")).unwrap(), Some(b("v3")));
    }

    #[test]
    fn test_string_ops_on_other_types() {
        let ks = Keyspace::with_shards(2);
        ks.hset(b("h"), b("f"), b("v")).unwrap();
        assert_eq!(ks.get_string(&b("h")), Err(StoreError::TypeMismatch));
        assert_eq!(ks.set(b("h"), b("x")), Err(StoreError::TypeMismatch));
        assert_eq!(ks.incr_by(&b("h"), 1), Err(StoreError::TypeMismatch));
        assert_eq!(ks.type_of(&b("h")), Some(ValueKind::Hash));

        ks.pfadd(b("hll"), &[b("a")]).unwrap();
        assert_eq!(ks.get_string(&b("hll")), Err(StoreError::TypeMismatch));
    }

    #[test]
    fn test_mset_mget() {
        let ks = Keyspace::with_shards(4);
        ks.mset(vec![(b("a"), b("1")), (b("b"), b("2"))]).unwrap();
        assert_eq!(
            ks.mget(&[b("a"), b("missing"), b("b")]),
            vec![Some(b("1")), None, Some(b("2"))]
        );
    }

    #[test]
    fn test_mset_duplicate_changes_nothing() {
        let ks = Keyspace::with_shards(4);
        ks.set(b("a"), b("old")).unwrap();
        let result = ks.mset(vec![(b("a"), b("1")), (b("c"), b("2")), (b("a"), b("3"))]);
        assert_eq!(result, Err(StoreError::DuplicateKey));
        assert_eq!(ks.get_string(&b("a")).unwrap(), Some(b("old")));
        assert!(!ks.exists(&b("c")));
    }

    #[test]
    fn test_value_too_large() {
        let ks = Keyspace::new(crate::config::StoreConfig {
            max_string_len: 4,
            ..Default::default()
        });
        assert_eq!(ks.set(b("k"), b("12345")), Err(StoreError::ValueTooLarge));
        assert!(ks.set(b("k"), b("1234")).is_ok());
    }

    #[test]
    fn test_incr_family() {
        let ks = Keyspace::with_shards(2);
        assert_eq!(ks.incr_by(&b("n"), 1).unwrap(), 1);
        assert_eq!(ks.incr_by(&b("n"), 10).unwrap(), 11);
        assert_eq!(ks.decr_by(&b("n"), 1).unwrap(), 10);
        assert_eq!(ks.decr_by(&b("n"), 20).unwrap(), -10);
        assert_eq!(ks.get_string(&b("n")).unwrap(), Some(b("-10")));
    }

    #[test]
    fn test_incr_errors_leave_value() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("s"), b("abc")).unwrap();
        assert_eq!(ks.incr_by(&b("s"), 1), Err(StoreError::NotAnInteger));
        assert_eq!(ks.get_string(&b("s")).unwrap(), Some(b("abc")));

        ks.set(b("max"), Bytes::from(i64::MAX.to_string())).unwrap();
        assert_eq!(ks.incr_by(&b("max"), 1), Err(StoreError::Overflow));
        assert_eq!(ks.decr_by(&b("x"), i64::MIN), Err(StoreError::Overflow));
        assert!(!ks.exists(&b("x")));
    }

    #[test]
    fn test_incr_by_float() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("f"), b("80")).unwrap();
        assert_eq!(ks.incr_by_float(&b("f"), 0.5).unwrap(), b("80.5"));

        assert_eq!(ks.incr_by_float(&b("g"), 0.1).unwrap(), b("0.1"));
        assert_eq!(ks.incr_by_float(&b("g"), 0.2).unwrap(), b("0.3"));
        assert_eq!(ks.incr_by_float(&b("g"), -0.3).unwrap(), b("0"));

        ks.set(b("bad"), b("abc")).unwrap();
        assert_eq!(ks.incr_by_float(&b("bad"), 1.0), Err(StoreError::NotAFloat));
        assert_eq!(ks.incr_by_float(&b("f"), f64::NAN), Err(StoreError::NotAFloat));
    }

    #[test]
    fn test_incr_by_float_tiny_delta() {
        let ks = Keyspace::with_shards(2);
        for (key, delta) in [("tiny", 1e-30), ("small", 1.5e-29)] {
            let stored = ks.incr_by_float(&b(key), delta).unwrap();
            let value: f64 = std::str::from_utf8(&stored).unwrap().parse().unwrap();
            assert_eq!(value, delta, "{} kept {:?}", key, stored);
        }
    }

    #[test]
    fn test_concurrent_incr() {
        let ks = Arc::new(Keyspace::with_shards(8));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let ks = Arc::clone(&ks);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        ks.incr_by(&Bytes::from("counter"), 1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ks.get_string(&b("counter")).unwrap(), Some(b("10000")));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float(1e21), "1000000000000000000000");
    }
}
