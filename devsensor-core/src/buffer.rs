//! Ordered, thread-safe accumulation of event records
//!
//! Every append and drain goes through one lock, and each critical section
//! is a single push or swap, so observation threads never wait on anything
//! slower than another thread's push.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::event::EventRecord;

/// Insertion-ordered buffer of records awaiting delivery
#[derive(Debug, Default)]
pub struct EventBuffer {
    records: Mutex<VecDeque<EventRecord>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the tail
    pub fn append(&self, record: EventRecord) {
        self.records.lock().push_back(record);
    }

    /// Take everything currently buffered, leaving the buffer empty
    ///
    /// An append racing with a drain lands either in the returned batch or
    /// in the buffer for the next drain, never both.
    pub fn drain_all(&self) -> Vec<EventRecord> {
        let taken = std::mem::take(&mut *self.records.lock());
        taken.into()
    }

    /// Put a batch back ahead of anything appended since it was drained
    ///
    /// If the buffer would then hold more than `capacity` records, the
    /// oldest are discarded. Returns how many records were discarded.
    pub fn requeue_front(&self, batch: Vec<EventRecord>, capacity: usize) -> usize {
        let mut records = self.records.lock();
        for record in batch.into_iter().rev() {
            records.push_front(record);
        }
        let excess = records.len().saturating_sub(capacity);
        records.drain(..excess);
        excess
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}
