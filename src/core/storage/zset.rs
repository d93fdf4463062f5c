// src/core/storage/zset.rs

//! A sorted set: a mapping from member to score.

use bytes::Bytes;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortedSet {
    members: IndexMap<Bytes, f64>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a member. Returns true iff the member was newly inserted.
    pub fn add(&mut self, score: f64, member: Bytes) -> bool {
        self.members.insert(member, score).is_none()
    }

    pub fn score(&self, member: &Bytes) -> Option<f64> {
        self.members.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
