// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Sensor operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the read path, the write path and the monitor.
#[derive(Debug, Default)]
pub struct SensorStats {
    connections: AtomicU64,
    reads: AtomicU64,
    read_retries: AtomicU64,
    writes: AtomicU64,
    notifications_enqueued: AtomicU64,
    notification_errors: AtomicU64,
    capture_empty: AtomicU64,
}

impl SensorStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an established session.
    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed poll read.
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a retried read attempt.
    pub fn record_read_retry(&self) {
        self.read_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed write batch.
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a value appended to the queue.
    pub fn record_notification(&self) {
        self.notifications_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an error event on the notification stream.
    pub fn record_notification_error(&self) {
        self.notification_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a capture read that found nothing to drain.
    pub fn record_capture_empty(&self) {
        self.capture_empty.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of retried read attempts.
    pub fn read_retries(&self) -> u64 {
        self.read_retries.load(Ordering::Relaxed)
    }

    /// Returns a point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            read_retries: self.read_retries.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            notifications_enqueued: self.notifications_enqueued.load(Ordering::Relaxed),
            notification_errors: self.notification_errors.load(Ordering::Relaxed),
            capture_empty: self.capture_empty.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`SensorStats`] at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Sessions established.
    pub connections: u64,
    /// Poll reads completed.
    pub reads: u64,
    /// Read attempts retried after a transient error.
    pub read_retries: u64,
    /// Write batches completed.
    pub writes: u64,
    /// Values appended to the readings queue.
    pub notifications_enqueued: u64,
    /// Error events seen on the notification stream.
    pub notification_errors: u64,
    /// Capture reads that found the queue empty.
    pub capture_empty: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = SensorStats::new();
        stats.record_read();
        stats.record_read_retry();
        stats.record_read_retry();
        stats.record_capture_empty();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.reads, 1);
        assert_eq!(snapshot.read_retries, 2);
        assert_eq!(snapshot.capture_empty, 1);
        assert_eq!(snapshot.writes, 0);
        assert_eq!(stats.read_retries(), 2);
    }
}
