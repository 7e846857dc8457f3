//! Batch - unit of delivery
//!
//! Ordered group of records emitted together in one request.

use serde::Serialize;

use crate::{Record, Sanitize};

/// Ordered, append-only group of records
///
/// Serializes as a plain JSON array of records. The creation time is the
/// accumulator clock reading (milliseconds) taken at the first insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    records: Vec<Record>,
    #[serde(skip)]
    created_at_ms: u64,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from records (creation time 0)
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            created_at_ms: 0,
        }
    }

    /// Append a record, stamping the creation time when the batch is empty
    pub fn push_at(&mut self, record: Record, now_ms: u64) {
        if self.records.is_empty() {
            self.created_at_ms = now_ms;
        }
        self.records.push(record);
    }

    /// Number of records
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Clock reading of the first insertion
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Age relative to a clock reading, zero if the clock went backwards
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }
}

impl Sanitize for Batch {
    fn sanitize(&self) -> Self {
        Self {
            records: self.records.sanitize(),
            created_at_ms: self.created_at_ms,
        }
    }
}

impl IntoIterator for Batch {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
