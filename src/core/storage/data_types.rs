// src/core/storage/data_types.rs

//! Defines the core data structures for storing values in the database,
//! such as `StoredValue` and the `DataValue` enum.

use crate::core::storage::stream::Stream;
use crate::core::storage::zset::SortedSet;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A wrapper for all values stored in the database, containing the data and
/// its absolute expiry timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub data: DataValue,
    /// Absolute expiry in Unix milliseconds. `None` means the key never expires.
    pub expires_at_ms: Option<u64>,
}

impl StoredValue {
    /// Creates a new `StoredValue` without an expiry.
    pub fn new(data: DataValue) -> Self {
        Self {
            data,
            expires_at_ms: None,
        }
    }

    /// Creates a new `StoredValue` with an absolute expiry timestamp.
    pub fn with_expiry(data: DataValue, expires_at_ms: Option<u64>) -> Self {
        Self {
            data,
            expires_at_ms,
        }
    }

    /// Checks whether the value is expired at the given wall-clock instant.
    pub fn is_expired(&self, at_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|expiry| expiry <= at_ms)
    }
}

/// An enum representing the different data types that can be stored.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    String(Bytes),
    List(VecDeque<Bytes>),
    Hash(IndexMap<Bytes, Bytes>),
    SortedSet(SortedSet),
    Stream(Stream),
}

impl DataValue {
    /// The type name reported by the `TYPE` command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::List(_) => "list",
            DataValue::Hash(_) => "hash",
            DataValue::SortedSet(_) => "zset",
            DataValue::Stream(_) => "stream",
        }
    }

    /// True if the container holds no elements. Strings are never considered empty
    /// for keyspace purposes.
    pub fn is_empty_container(&self) -> bool {
        match self {
            DataValue::String(_) => false,
            DataValue::List(l) => l.is_empty(),
            DataValue::Hash(h) => h.is_empty(),
            DataValue::SortedSet(z) => z.is_empty(),
            DataValue::Stream(s) => s.is_empty(),
        }
    }
}
