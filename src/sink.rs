//! AuditSink — the outbound persistence seam
//!
//! The core produces records; a collaborator writes them. The trait is
//! synchronous and object-safe so hosts can persist inside the same
//! transaction as the triggering mutation. Real storage (tables, retries,
//! batching) lives on the host side; the shipped implementations here are
//! storage-free.

use std::sync::Mutex;

use crate::error::PersistError;
use crate::record::AuditRecord;

/// Persistence collaborator for finished audit records.
pub trait AuditSink: Send + Sync {
    fn persist(&self, record: &AuditRecord) -> Result<(), PersistError>;
}

/// Collects records in memory. For tests and small hosts.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn persist(&self, record: &AuditRecord) -> Result<(), PersistError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// Accepts and drops everything. For disabled environments.
#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for NullSink {
    fn persist(&self, _record: &AuditRecord) -> Result<(), PersistError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffOutcome, SnapshotSide};
    use crate::event::AuditEvent;
    use crate::record::RecordBuilder;
    use serde_json::json;

    fn sample_record() -> AuditRecord {
        RecordBuilder::new("users", "1", AuditEvent::Created)
            .build(DiffOutcome::Snapshot {
                side: SnapshotSide::After,
                attributes: json!({"name": "A"}).as_object().unwrap().clone(),
            })
            .unwrap()
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.persist(&sample_record()).unwrap();
        sink.persist(&sample_record()).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[0].entity_type, "users");
    }

    #[test]
    fn test_null_sink_drops() {
        let sink = NullSink::new();
        sink.persist(&sample_record()).unwrap();
    }
}
