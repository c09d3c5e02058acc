//! Stream operations (XADD / XLEN / XRANGE)

use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{get_or_create, typed, Keyspace};
use crate::error::{StoreError, StoreResult};
use crate::store::stream::{IdRequest, StreamFields, StreamId};
use crate::store::value::{Value, ValueKind};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Keyspace {
    /// Append an entry, returning its id
    ///
    /// The id is checked before the stream is created, so a rejected id
    /// never leaves an empty stream behind.
    pub fn xadd(&self, key: Bytes, id: IdRequest, fields: StreamFields) -> StoreResult<StreamId> {
        if fields.is_empty() {
            return Err(StoreError::Syntax);
        }
        let now = now_ms();
        self.with_shard(&key, |shard, slot| {
            if let Some(stream) = typed(&shard.entries, slot, Value::as_stream)? {
                stream.resolve_id(id, now)?;
            } else if id == IdRequest::Explicit(StreamId::MIN) {
                return Err(StoreError::StreamIdTooSmall);
            }
            get_or_create(&mut shard.entries, slot, ValueKind::Stream)?
                .as_stream_mut()
                .ok_or(StoreError::TypeMismatch)?
                .append(id, now, fields)
        })
    }

    pub fn xlen(&self, key: &Bytes) -> StoreResult<usize> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_stream)?.map_or(0, |s| s.len()))
        })
    }

    /// Entries with ids in `[start, end]`, oldest first
    pub fn xrange(
        &self,
        key: &Bytes,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    ) -> StoreResult<Vec<(StreamId, StreamFields)>> {
        self.with_shard(key, |shard, slot| {
            Ok(typed(&shard.entries, slot, Value::as_stream)?
                .map(|s| s.range(start, end, count))
                .unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn reading(value: &str) -> StreamFields {
        vec![(b("temp"), b(value))]
    }

    #[test]
    fn test_xadd_xlen_xrange() {
        let ks = Keyspace::with_shards(2);
        let first = ks.xadd(b("s"), IdRequest::Auto, reading("20")).unwrap();
        let second = ks.xadd(b("s"), IdRequest::Auto, reading("21")).unwrap();
        assert!(second > first);
        assert_eq!(ks.xlen(&b("s")).unwrap(), 2);
        assert_eq!(ks.type_of(&b("s")), Some(ValueKind::Stream));

        let entries = ks.xrange(&b("s"), StreamId::MIN, StreamId::MAX, Some(1)).unwrap();
        assert_eq!(entries, vec![(first, reading("20"))]);
    }

    #[test]
    fn test_rejected_id_creates_nothing() {
        let ks = Keyspace::with_shards(2);
        let result = ks.xadd(b("s"), IdRequest::Explicit(StreamId::MIN), reading("1"));
        assert_eq!(result, Err(StoreError::StreamIdTooSmall));
        assert!(!ks.exists(&b("s")));
        assert_eq!(ks.xadd(b("s"), IdRequest::Auto, vec![]), Err(StoreError::Syntax));
        assert!(!ks.exists(&b("s")));
    }

    #[test]
    fn test_stream_on_string_key() {
        let ks = Keyspace::with_shards(2);
        ks.set(b("k"), b("v")).unwrap();
        assert_eq!(
            ks.xadd(b("k"), IdRequest::Auto, reading("1")),
            Err(StoreError::TypeMismatch)
        );
    }
}
