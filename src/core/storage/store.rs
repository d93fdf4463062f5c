// src/core/storage/store.rs

//! The keyspace: a single-owner map from key to `StoredValue` with lazy,
//! access-time TTL expiration.

use crate::core::CitrineError;
use crate::core::storage::data_types::{DataValue, StoredValue, now_ms};
use crate::core::storage::snapshot::SnapshotEntry;
use crate::core::storage::stream::Stream;
use crate::core::storage::zset::SortedSet;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// The in-memory keyspace. There is no background sweeper: an expired key is
/// deleted the first time it is touched after its deadline.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<Bytes, StoredValue>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value for `key`, deleting it first if it has expired.
    pub fn get(&mut self, key: &Bytes) -> Option<&StoredValue> {
        if self.expire_if_needed(key) {
            return None;
        }
        self.entries.get(key)
    }

    /// Mutable access to the live value for `key`.
    pub fn get_mut(&mut self, key: &Bytes) -> Option<&mut StoredValue> {
        if self.expire_if_needed(key) {
            return None;
        }
        self.entries.get_mut(key)
    }

    /// Stores `data` under `key`. `ttl_ms` is relative to now; `None` clears
    /// any existing TTL.
    pub fn set(&mut self, key: Bytes, data: DataValue, ttl_ms: Option<u64>) {
        let expires_at_ms = ttl_ms.map(|ttl| now_ms() + ttl);
        self.entries
            .insert(key, StoredValue::with_expiry(data, expires_at_ms));
    }

    /// Stores `data` with an absolute expiry timestamp (snapshot loading path).
    pub fn set_with_absolute_expiry(
        &mut self,
        key: Bytes,
        data: DataValue,
        expires_at_ms: Option<u64>,
    ) {
        self.entries
            .insert(key, StoredValue::with_expiry(data, expires_at_ms));
    }

    pub fn remove(&mut self, key: &Bytes) -> Option<StoredValue> {
        self.entries.remove(key)
    }

    /// Returns all non-expired keys. Expired entries encountered on the way
    /// are deleted.
    pub fn keys(&mut self) -> Vec<Bytes> {
        let now = now_ms();
        self.entries.retain(|_, value| !value.is_expired(now));
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key` if it holds an empty container (a popped-dry list, etc.).
    pub fn drop_if_empty(&mut self, key: &Bytes) {
        if self
            .entries
            .get(key)
            .is_some_and(|v| v.data.is_empty_container())
        {
            self.entries.remove(key);
        }
    }

    // --- Typed accessors ---

    /// Returns the mutable list under `key`, creating a fresh empty one if the
    /// key is absent. Errors if the key holds another type.
    pub fn list_entry(&mut self, key: &Bytes) -> Result<&mut VecDeque<Bytes>, CitrineError> {
        self.expire_if_needed(key);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| StoredValue::new(DataValue::List(VecDeque::new())));
        match &mut entry.data {
            DataValue::List(list) => Ok(list),
            _ => Err(CitrineError::WrongType),
        }
    }

    /// Returns the mutable list under `key` if one exists.
    pub fn list_entry_opt(
        &mut self,
        key: &Bytes,
    ) -> Result<Option<&mut VecDeque<Bytes>>, CitrineError> {
        match self.get_mut(key) {
            None => Ok(None),
            Some(entry) => match &mut entry.data {
                DataValue::List(list) => Ok(Some(list)),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// Returns `list[start..=end]` with negative indices normalized from the
    /// tail. Inclusive on both ends; an inverted range yields an empty list.
    pub fn get_list_range(
        &mut self,
        key: &Bytes,
        start: i64,
        end: i64,
    ) -> Result<Vec<Bytes>, CitrineError> {
        let Some(list) = self.list_entry_opt(key)? else {
            return Ok(Vec::new());
        };
        let n = list.len() as i64;
        let start = if start < 0 { (n + start).max(0) } else { start };
        let end = if end < 0 { n + end } else { end };
        let end = end.min(n - 1);
        if start > end || start >= n {
            return Ok(Vec::new());
        }
        Ok(list
            .iter()
            .skip(start as usize)
            .take((end - start + 1) as usize)
            .cloned()
            .collect())
    }

    /// Returns the mutable stream under `key`, creating a fresh empty one if
    /// the key is absent.
    pub fn stream_entry(&mut self, key: &Bytes) -> Result<&mut Stream, CitrineError> {
        self.expire_if_needed(key);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| StoredValue::new(DataValue::Stream(Stream::new())));
        match &mut entry.data {
            DataValue::Stream(stream) => Ok(stream),
            _ => Err(CitrineError::WrongType),
        }
    }

    /// Returns the stream under `key` if one exists.
    pub fn stream_entry_opt(&mut self, key: &Bytes) -> Result<Option<&Stream>, CitrineError> {
        match self.get(key) {
            None => Ok(None),
            Some(entry) => match &entry.data {
                DataValue::Stream(stream) => Ok(Some(stream)),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// Returns the mutable hash under `key`, creating a fresh empty one if the
    /// key is absent.
    pub fn hash_entry(&mut self, key: &Bytes) -> Result<&mut IndexMap<Bytes, Bytes>, CitrineError> {
        self.expire_if_needed(key);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| StoredValue::new(DataValue::Hash(IndexMap::new())));
        match &mut entry.data {
            DataValue::Hash(hash) => Ok(hash),
            _ => Err(CitrineError::WrongType),
        }
    }

    /// Returns the hash under `key` if one exists.
    pub fn hash_entry_opt(
        &mut self,
        key: &Bytes,
    ) -> Result<Option<&IndexMap<Bytes, Bytes>>, CitrineError> {
        match self.get(key) {
            None => Ok(None),
            Some(entry) => match &entry.data {
                DataValue::Hash(hash) => Ok(Some(hash)),
                _ => Err(CitrineError::WrongType),
            },
        }
    }

    /// Inserts or updates a sorted-set member. Returns true iff the member was
    /// newly inserted.
    pub fn add_to_sorted_set(
        &mut self,
        key: &Bytes,
        score: f64,
        member: Bytes,
    ) -> Result<bool, CitrineError> {
        self.expire_if_needed(key);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| StoredValue::new(DataValue::SortedSet(SortedSet::new())));
        match &mut entry.data {
            DataValue::SortedSet(zset) => Ok(zset.add(score, member)),
            _ => Err(CitrineError::WrongType),
        }
    }

    /// Merges loader output into the keyspace, skipping entries whose expiry
    /// has already passed.
    pub fn load_snapshot_entries(&mut self, entries: Vec<SnapshotEntry>) {
        let now = now_ms();
        for entry in entries {
            if entry.expires_at_ms.is_some_and(|expiry| expiry <= now) {
                continue;
            }
            self.set_with_absolute_expiry(entry.key, entry.value, entry.expires_at_ms);
        }
    }

    /// Deletes `key` if expired. Returns true if a deletion happened.
    fn expire_if_needed(&mut self, key: &Bytes) -> bool {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(now_ms()))
        {
            self.entries.remove(key);
            return true;
        }
        false
    }
}
