//! Value types for the key-value store

use bytes::Bytes;
use std::collections::VecDeque;

use super::scan::ScanMap;
use super::sketch::Sketch;
use super::sorted_set::SortedSet;
use super::stream::StreamLog;

/// Represents the different types of values that can be stored
#[derive(Debug, Clone)]
pub enum Value {
    /// String value (binary-safe)
    String(Bytes),

    /// List of values (ordered, duplicates allowed)
    List(VecDeque<Bytes>),

    /// Set of unique members, kept in scan order
    Set(ScanMap<()>),

    /// Hash map (field -> value), kept in scan order
    Hash(ScanMap<Bytes>),

    /// Members ordered by score
    SortedSet(SortedSet),

    /// Cardinality sketch
    Sketch(Sketch),

    /// Append-only log
    Stream(StreamLog),
}

/// The type tag of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Set,
    Hash,
    SortedSet,
    Sketch,
    Stream,
}

impl ValueKind {
    /// Name reported by TYPE
    ///
    /// Sketches report "string", matching the usual client expectation.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::String | ValueKind::Sketch => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Hash => "hash",
            ValueKind::SortedSet => "zset",
            ValueKind::Stream => "stream",
        }
    }
}

impl Value {
    /// Create a string value
    pub fn string(bytes: impl Into<Bytes>) -> Self {
        Value::String(bytes.into())
    }

    /// Create an empty value of the given kind
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::String => Value::String(Bytes::new()),
            ValueKind::List => Value::List(VecDeque::new()),
            ValueKind::Set => Value::Set(ScanMap::new()),
            ValueKind::Hash => Value::Hash(ScanMap::new()),
            ValueKind::SortedSet => Value::SortedSet(SortedSet::new()),
            ValueKind::Sketch => Value::Sketch(Sketch::new()),
            ValueKind::Stream => Value::Stream(StreamLog::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Hash(_) => ValueKind::Hash,
            Value::SortedSet(_) => ValueKind::SortedSet,
            Value::Sketch(_) => ValueKind::Sketch,
            Value::Stream(_) => ValueKind::Stream,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    /// True for an emptied list, set or sorted set
    ///
    /// Those kinds disappear from the keyspace once empty. Hashes and
    /// streams stay until deleted.
    pub fn is_vacant(&self) -> bool {
        match self {
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::SortedSet(zset) => zset.is_empty(),
            _ => false,
        }
    }

    /// Try to get as string bytes
    pub fn as_string(&self) -> Option<&Bytes> {
        match self {
            Value::String(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as list reference
    pub fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get as mutable list
    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get as set reference
    pub fn as_set(&self) -> Option<&ScanMap<()>> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Try to get as mutable set
    pub fn as_set_mut(&mut self) -> Option<&mut ScanMap<()>> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Try to get as hash reference
    pub fn as_hash(&self) -> Option<&ScanMap<Bytes>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    /// Try to get as mutable hash
    pub fn as_hash_mut(&mut self) -> Option<&mut ScanMap<Bytes>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn as_sorted_set(&self) -> Option<&SortedSet> {
        match self {
            Value::SortedSet(zset) => Some(zset),
            _ => None,
        }
    }

    pub fn as_sorted_set_mut(&mut self) -> Option<&mut SortedSet> {
        match self {
            Value::SortedSet(zset) => Some(zset),
            _ => None,
        }
    }

    pub fn as_sketch(&self) -> Option<&Sketch> {
        match self {
            Value::Sketch(sketch) => Some(sketch),
            _ => None,
        }
    }

    pub fn as_sketch_mut(&mut self) -> Option<&mut Sketch> {
        match self {
            Value::Sketch(sketch) => Some(sketch),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&StreamLog> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_stream_mut(&mut self) -> Option<&mut StreamLog> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Calculate approximate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let payload = match self {
            Value::String(bytes) => bytes.len(),
            Value::List(list) => {
                let items_size: usize = list.iter().map(|b| b.len()).sum();
                items_size + list.len() * std::mem::size_of::<Bytes>()
            }
            Value::Set(set) => {
                let items_size: usize = set.keys().map(|b| b.len()).sum();
                items_size + set.len() * std::mem::size_of::<(u64, Bytes)>()
            }
            Value::Hash(hash) => {
                let items_size: usize = hash.iter().map(|(k, v)| k.len() + v.len()).sum();
                items_size + hash.len() * std::mem::size_of::<(u64, Bytes, Bytes)>()
            }
            Value::SortedSet(zset) => zset.memory_usage(),
            Value::Sketch(sketch) => sketch.memory_usage(),
            Value::Stream(stream) => stream.memory_usage(),
        };
        payload + std::mem::size_of::<Value>()
    }
}
