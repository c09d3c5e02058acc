//! In-memory storage module
//!
//! Provides the core data structures for storing typed values in memory.
//! This module is independent of protocol and command handling (loose coupling).

mod blocking;
mod entry;
mod keyspace;
mod pattern;
mod router;
mod scan;
mod sketch;
mod sorted_set;
mod stream;
mod value;

pub use blocking::ListEnd;
pub use entry::Entry;
pub use keyspace::{Keyspace, KeyspaceStats, SetCondition};
pub use pattern::glob_match;
pub use router::{slot_hash, ShardRouter};
pub use scan::{ScanKey, ScanMap, ScanPage};
pub use sketch::{Sketch, SKETCH_PRECISION, SKETCH_REGISTERS};
pub use sorted_set::SortedSet;
pub use stream::{IdRequest, StreamFields, StreamId, StreamLog};
pub use value::{Value, ValueKind};

pub(crate) use keyspace::format_float;
