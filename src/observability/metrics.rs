//! Per-database operation counters
//!
//! - Counters only, monotonic
//! - Reset when the database is opened
//! - Relaxed atomics; values are exact once the writer is done

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    documents_inserted: AtomicU64,
    documents_deleted: AtomicU64,
    writes_rejected: AtomicU64,
    collections_created: AtomicU64,
    indexes_created: AtomicU64,
    bytes_written: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_documents_inserted(&self) {
        self.documents_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_deleted(&self) {
        self.documents_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_collections_created(&self) {
        self.collections_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_indexes_created(&self) {
        self.indexes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_written(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_inserted: self.documents_inserted.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
            collections_created: self.collections_created.load(Ordering::Relaxed),
            indexes_created: self.indexes_created.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub documents_inserted: u64,
    pub documents_deleted: u64,
    pub writes_rejected: u64,
    pub collections_created: u64,
    pub indexes_created: u64,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.documents_inserted, 0);
        assert_eq!(snapshot.writes_rejected, 0);
        assert_eq!(snapshot.bytes_written, 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_documents_inserted();
        registry.increment_documents_inserted();
        registry.increment_documents_deleted();
        registry.increment_writes_rejected();
        registry.increment_collections_created();
        registry.increment_indexes_created();
        registry.add_bytes_written(64);
        registry.add_bytes_written(36);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.documents_inserted, 2);
        assert_eq!(snapshot.documents_deleted, 1);
        assert_eq!(snapshot.writes_rejected, 1);
        assert_eq!(snapshot.collections_created, 1);
        assert_eq!(snapshot.indexes_created, 1);
        assert_eq!(snapshot.bytes_written, 100);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_writes_rejected();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["writes_rejected"], 1);
        assert_eq!(json["documents_inserted"], 0);
    }
}
