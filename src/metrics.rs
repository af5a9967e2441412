use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing document processing activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    documents_failed: AtomicU64,
    segments_produced: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully processed document and its segment count.
    pub fn record_document(&self, segment_count: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.segments_produced
            .fetch_add(segment_count, Ordering::Relaxed);
    }

    /// Record a document that failed anywhere in the pipeline.
    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            segments_produced: self.segments_produced.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of processing counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents processed end to end since startup.
    pub documents_processed: u64,
    /// Number of documents that failed during processing.
    pub documents_failed: u64,
    /// Total segment count produced across all processed documents.
    pub segments_produced: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_segments() {
        let metrics = PipelineMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 2);
        assert_eq!(snapshot.documents_failed, 1);
        assert_eq!(snapshot.segments_produced, 5);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = PipelineMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 0);
        assert_eq!(snapshot.documents_failed, 0);
        assert_eq!(snapshot.segments_produced, 0);
    }
}
