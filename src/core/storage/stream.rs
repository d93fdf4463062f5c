// src/core/storage/stream.rs

use crate::core::CitrineError;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

// --- Stream ID ---

/// A stream entry identifier: a `(milliseconds, sequence)` pair rendered as
/// `"<ms>-<seq>"` and ordered pairwise with numeric comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Default)]
pub struct StreamId {
    pub timestamp_ms: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId {
        timestamp_ms: 0,
        sequence: 0,
    };
    pub const MAX: StreamId = StreamId {
        timestamp_ms: u64::MAX,
        sequence: u64::MAX,
    };

    pub fn new(timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            timestamp_ms,
            sequence,
        }
    }
}

impl FromStr for StreamId {
    type Err = CitrineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.len() {
            1 => {
                let timestamp_ms = parts[0].parse().map_err(|_| CitrineError::SyntaxError)?;
                Ok(StreamId::new(timestamp_ms, 0))
            }
            2 => {
                let timestamp_ms = parts[0].parse().map_err(|_| CitrineError::SyntaxError)?;
                let sequence = parts[1].parse().map_err(|_| CitrineError::SyntaxError)?;
                Ok(StreamId::new(timestamp_ms, sequence))
            }
            _ => Err(CitrineError::SyntaxError),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.timestamp_ms, self.sequence)
    }
}

/// An entry id as given to `XADD`: fully explicit, auto-sequence (`<ms>-*`),
/// or fully automatic (`*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamIdSpec {
    Auto,
    AutoSequence(u64),
    Explicit(StreamId),
}

impl StreamIdSpec {
    pub fn parse(s: &str) -> Result<Self, CitrineError> {
        if s == "*" {
            return Ok(StreamIdSpec::Auto);
        }
        if let Some(ms_part) = s.strip_suffix("-*") {
            let ms = ms_part.parse().map_err(|_| CitrineError::SyntaxError)?;
            return Ok(StreamIdSpec::AutoSequence(ms));
        }
        Ok(StreamIdSpec::Explicit(s.parse()?))
    }
}

// --- Stream Entry ---

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: IndexMap<Bytes, Bytes>,
    /// Wall-clock instant the entry was appended, used by `XREAD`'s `$` filter.
    pub ts: SystemTime,
}

// --- Main Stream Struct ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    pub entries: BTreeMap<StreamId, StreamEntry>,
    pub last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry, resolving the id spec against the stream head.
    ///
    /// Resolution:
    /// - `*` takes the current wall clock, bumping the sequence on a
    ///   millisecond collision so the id stays strictly monotone.
    /// - `<ms>-*` continues the sequence when `ms` equals the head's
    ///   millisecond, otherwise starts at 0. With an empty stream and
    ///   `ms == 0` this yields `0-1`, since `0-0` is forbidden.
    /// - Explicit ids are used verbatim and then validated.
    pub fn append(
        &mut self,
        spec: StreamIdSpec,
        fields: IndexMap<Bytes, Bytes>,
    ) -> Result<StreamId, CitrineError> {
        let new_id = match spec {
            StreamIdSpec::Explicit(id) => {
                if id == StreamId::ZERO {
                    return Err(CitrineError::StreamIdZero);
                }
                if id <= self.last_id {
                    return Err(CitrineError::StreamIdTooSmall);
                }
                id
            }
            StreamIdSpec::AutoSequence(ms) => {
                let sequence = if ms == self.last_id.timestamp_ms {
                    self.last_id.sequence + 1
                } else {
                    0
                };
                let id = StreamId::new(ms, sequence);
                if id <= self.last_id {
                    return Err(CitrineError::StreamIdTooSmall);
                }
                id
            }
            StreamIdSpec::Auto => {
                let mut timestamp_ms = super::data_types::now_ms();
                if timestamp_ms <= self.last_id.timestamp_ms {
                    timestamp_ms = self.last_id.timestamp_ms;
                }
                let sequence = if timestamp_ms == self.last_id.timestamp_ms {
                    self.last_id.sequence + 1
                } else {
                    0
                };
                StreamId::new(timestamp_ms, sequence)
            }
        };

        let entry = StreamEntry {
            id: new_id,
            fields,
            ts: SystemTime::now(),
        };
        self.entries.insert(new_id, entry);
        self.last_id = new_id;

        Ok(new_id)
    }

    /// Returns the entries whose id lies in `[start, end]`, in id order.
    /// An inverted range is empty.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<&StreamEntry> {
        if start > end {
            return Vec::new();
        }
        self.entries.range(start..=end).map(|(_, e)| e).collect()
    }

    /// Returns the entries with `id > start`, in id order.
    pub fn entries_after(&self, start: StreamId) -> Vec<&StreamEntry> {
        self.entries
            .values()
            .filter(|e| e.id > start)
            .collect()
    }

    /// Returns the entries appended strictly after the given wall-clock instant.
    pub fn entries_newer_than(&self, ts: SystemTime) -> Vec<&StreamEntry> {
        self.entries.values().filter(|e| e.ts > ts).collect()
    }
}
