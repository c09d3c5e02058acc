//! Append-only stream log
//!
//! Entries are keyed by a `ms-seq` id that strictly increases.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Stream entry id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        StreamId { ms, seq }
    }

    /// Parse a range bound: `-`, `+`, `ms` or `ms-seq`
    ///
    /// A bare `ms` covers the whole millisecond: seq 0 as a start bound,
    /// the maximum seq as an end bound.
    pub fn parse_bound(raw: &[u8], is_start: bool) -> StoreResult<Self> {
        match raw {
            b"-" => Ok(StreamId::MIN),
            b"+" => Ok(StreamId::MAX),
            _ => {
                let (ms, seq) = split_id(raw)?;
                let seq = match seq {
                    Some(seq) => parse_u64(seq)?,
                    None if is_start => 0,
                    None => u64::MAX,
                };
                Ok(StreamId::new(parse_u64(ms)?, seq))
            }
        }
    }

    /// Smallest id strictly greater than `self` within millisecond `ms` or later
    fn next_at(self, ms: u64) -> Option<StreamId> {
        if ms > self.ms {
            return Some(StreamId::new(ms, 0));
        }
        match self.seq.checked_add(1) {
            Some(seq) => Some(StreamId::new(self.ms, seq)),
            None => self.ms.checked_add(1).map(|ms| StreamId::new(ms, 0)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// How XADD picks the id of a new entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRequest {
    /// `*`: current time, sequence as needed
    Auto,
    /// `ms-*`: given millisecond, next free sequence
    AutoSeq(u64),
    /// `ms-seq` or `ms` (sequence 0)
    Explicit(StreamId),
}

impl IdRequest {
    pub fn parse(raw: &[u8]) -> StoreResult<Self> {
        if raw == b"*" {
            return Ok(IdRequest::Auto);
        }
        let (ms, seq) = split_id(raw)?;
        let ms = parse_u64(ms)?;
        match seq {
            Some(b"*") => Ok(IdRequest::AutoSeq(ms)),
            Some(seq) => Ok(IdRequest::Explicit(StreamId::new(ms, parse_u64(seq)?))),
            None => Ok(IdRequest::Explicit(StreamId::new(ms, 0))),
        }
    }
}

fn split_id(raw: &[u8]) -> StoreResult<(&[u8], Option<&[u8]>)> {
    match raw.iter().position(|&b| b == b'-') {
        Some(pos) => Ok((&raw[..pos], Some(&raw[pos + 1..]))),
        None if !raw.is_empty() => Ok((raw, None)),
        None => Err(StoreError::InvalidStreamId),
    }
}

fn parse_u64(raw: &[u8]) -> StoreResult<u64> {
    std::str::from_utf8(raw)
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
        .ok_or(StoreError::InvalidStreamId)
}

/// Field/value pairs of one entry
pub type StreamFields = Vec<(Bytes, Bytes)>;

/// Stream value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamLog {
    entries: BTreeMap<StreamId, StreamFields>,
    last_id: StreamId,
}

impl StreamLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// Resolve the id an append would use, without appending
    pub fn resolve_id(&self, request: IdRequest, now_ms: u64) -> StoreResult<StreamId> {
        let id = match request {
            IdRequest::Auto => self.last_id.next_at(now_ms),
            IdRequest::AutoSeq(ms) if ms < self.last_id.ms => None,
            IdRequest::AutoSeq(ms) => self.last_id.next_at(ms),
            IdRequest::Explicit(id) if id > self.last_id => Some(id),
            IdRequest::Explicit(_) => None,
        };
        id.ok_or(StoreError::StreamIdTooSmall)
    }

    /// Append an entry, returning its id
    pub fn append(
        &mut self,
        request: IdRequest,
        now_ms: u64,
        fields: StreamFields,
    ) -> StoreResult<StreamId> {
        if fields.is_empty() {
            return Err(StoreError::Syntax);
        }
        let id = self.resolve_id(request, now_ms)?;
        self.entries.insert(id, fields);
        self.last_id = id;
        Ok(id)
    }

    /// Entries with `start <= id <= end`, oldest first
    pub fn range(
        &self,
        start: StreamId,
        end: StreamId,
        count: Option<usize>,
    ) -> Vec<(StreamId, StreamFields)> {
        if start > end {
            return Vec::new();
        }
        self.entries
            .range(start..=end)
            .take(count.unwrap_or(usize::MAX))
            .map(|(id, fields)| (*id, fields.clone()))
            .collect()
    }

    pub fn memory_usage(&self) -> usize {
        let payload: usize = self
            .entries
            .values()
            .flat_map(|fields| fields.iter())
            .map(|(f, v)| f.len() + v.len())
            .sum();
        payload + self.entries.len() * std::mem::size_of::<(StreamId, StreamFields)>()
    }
}
