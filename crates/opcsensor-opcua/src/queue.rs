// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Readings queue bridging pushed notifications to pulled readings.
//!
//! The monitor appends one entry per changed item. Readers either peek at
//! the newest entry ([`snapshot`](ReadingsQueue::snapshot)) or consume the
//! oldest ([`drain`](ReadingsQueue::drain)). All access goes through one
//! mutex, so an empty queue is never confused with one being appended to.
//!
//! ```text
//!   monitor ──push──▶ [ oldest … newest ] ──snapshot──▶ newest (kept)
//!                          │
//!                          └──────drain──────▶ oldest (removed)
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;

use crate::types::NodeId;

/// One buffered notification.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedReading {
    /// Node that produced the value.
    pub node_id: NodeId,

    /// Value as JSON.
    pub value: Value,

    /// Source timestamp.
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Server timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl QueuedReading {
    /// Creates an entry without timestamps.
    pub fn new(node_id: NodeId, value: Value) -> Self {
        Self {
            node_id,
            value,
            source_timestamp: None,
            server_timestamp: None,
        }
    }
}

/// FIFO buffer of notifications, optionally bounded.
#[derive(Debug, Default)]
pub struct ReadingsQueue {
    entries: Mutex<VecDeque<QueuedReading>>,
    capacity: Option<usize>,
    dropped: AtomicU64,
}

impl ReadingsQueue {
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue that drops the oldest entry beyond `capacity`.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Appends an entry.
    pub fn push(&self, reading: QueuedReading) {
        let mut entries = self.entries.lock();
        if let Some(capacity) = self.capacity {
            while entries.len() >= capacity {
                entries.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        entries.push_back(reading);
    }

    /// Returns a copy of the newest entry without removing it.
    pub fn snapshot(&self) -> Option<QueuedReading> {
        self.entries.lock().back().cloned()
    }

    /// Removes and returns the oldest entry.
    pub fn drain(&self) -> Option<QueuedReading> {
        self.entries.lock().pop_front()
    }

    /// Returns the number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the number of entries dropped by the capacity bound.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn reading(v: i64) -> QueuedReading {
        QueuedReading::new(NodeId::numeric(2, 2), json!(v))
    }

    #[test]
    fn test_drain_is_fifo() {
        let queue = ReadingsQueue::new();
        for v in [1, 2, 3] {
            queue.push(reading(v));
        }

        assert_eq!(queue.drain().unwrap().value, json!(1));
        assert_eq!(queue.drain().unwrap().value, json!(2));
        assert_eq!(queue.drain().unwrap().value, json!(3));
        assert!(queue.drain().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_is_latest_and_non_destructive() {
        let queue = ReadingsQueue::new();
        assert!(queue.snapshot().is_none());

        queue.push(reading(1));
        queue.push(reading(2));
        assert_eq!(queue.snapshot().unwrap().value, json!(2));
        assert_eq!(queue.snapshot().unwrap().value, json!(2));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let queue = ReadingsQueue::with_capacity(Some(2));
        for v in [1, 2, 3] {
            queue.push(reading(v));
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.drain().unwrap().value, json!(2));
    }

    #[test]
    fn test_concurrent_producers_keep_every_entry() {
        let queue = Arc::new(ReadingsQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(reading(t * 1000 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 1000);
        let mut last_per_thread = [-1_i64; 4];
        while let Some(entry) = queue.drain() {
            let v = entry.value.as_i64().unwrap();
            let (t, i) = ((v / 1000) as usize, v % 1000);
            assert!(i > last_per_thread[t]);
            last_per_thread[t] = i;
        }
    }
}
