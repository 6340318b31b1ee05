use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared by every ingest worker
#[derive(Debug, Clone, Default)]
pub struct IngestMetrics {
    /// Lines parsed, tokenized and accumulated
    lines_processed: Arc<AtomicU64>,
    /// Lines dropped for a malformed time tag
    lines_dropped: Arc<AtomicU64>,
    /// Batched flushes handed to the aggregator
    batches_flushed: Arc<AtomicU64>,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.lines_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_processed(&self) -> u64 {
        self.lines_processed.load(Ordering::Relaxed)
    }

    pub fn total_dropped(&self) -> u64 {
        self.lines_dropped.load(Ordering::Relaxed)
    }

    pub fn total_flushes(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_processed: self.total_processed(),
            lines_dropped: self.total_dropped(),
            batches_flushed: self.total_flushes(),
        }
    }
}

/// A snapshot of ingest counters at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub lines_processed: u64,
    pub lines_dropped: u64,
    pub batches_flushed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = IngestMetrics::new();
        for _ in 0..100 {
            metrics.record_processed();
        }
        metrics.record_dropped();
        metrics.record_flush();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lines_processed, 100);
        assert_eq!(snapshot.lines_dropped, 1);
        assert_eq!(snapshot.batches_flushed, 1);
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = IngestMetrics::new();
        let clone = metrics.clone();
        clone.record_processed();
        assert_eq!(metrics.total_processed(), 1);
    }
}
