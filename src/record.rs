//! AuditRecord — the persisted artifact — and its pure builder
//!
//! A record is created exactly once per qualifying mutation and never
//! mutated afterwards; ownership passes to the host's persistence layer.
//! The builder does pure assembly only: it copies already-resolved actor and
//! request values next to the engine outcome and never invokes a capability
//! itself, keeping this module free of I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::{Actor, RequestMetadata};
use crate::diff::{AttributeMap, ChangeSet, DiffOutcome, SnapshotSide};
use crate::event::AuditEvent;

/// One audit log row. Serialized field names match the persistence columns
/// (`auditable_type`, `auditable_id`, …); diff/before/after serialize as
/// nested JSON with masked values as the literal `"***"` marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Assigned at build time, v4.
    pub id: Uuid,

    #[serde(rename = "auditable_type")]
    pub entity_type: String,
    #[serde(rename = "auditable_id")]
    pub entity_id: String,

    pub event: AuditEvent,

    pub actor_id: Option<String>,
    pub actor_type: Option<String>,

    /// Per-field before/after pairs; `None` for created/deleted.
    pub diff: Option<ChangeSet>,
    /// State before the mutation; `None` for created.
    pub before: Option<AttributeMap>,
    /// State after the mutation; `None` for deleted.
    pub after: Option<AttributeMap>,

    pub url: Option<String>,
    pub method: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Pure assembly of an [`AuditRecord`] from already-computed parts.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    entity_type: String,
    entity_id: String,
    event: AuditEvent,
    actor: Actor,
    request: RequestMetadata,
    created_at: DateTime<Utc>,
}

impl RecordBuilder {
    /// Start a record for one mutation. Stamps `Utc::now()`; use [`at`](Self::at)
    /// to override for deterministic output.
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        event: AuditEvent,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            event,
            actor: Actor::anonymous(),
            request: RequestMetadata::none(),
            created_at: Utc::now(),
        }
    }

    /// Attach the resolved actor. Empty-string id/kind sanitize to `None`.
    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = actor.sanitized();
        self
    }

    /// Attach the resolved request context.
    pub fn request(mut self, request: RequestMetadata) -> Self {
        self.request = request;
        self
    }

    /// Override the creation timestamp.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Assemble the record. A suppressed outcome yields `None` and no
    /// further work (fail closed).
    pub fn build(self, outcome: DiffOutcome) -> Option<AuditRecord> {
        let (diff, before, after) = match outcome {
            DiffOutcome::Suppressed(_) => return None,
            DiffOutcome::Snapshot {
                side: SnapshotSide::After,
                attributes,
            } => (None, None, Some(attributes)),
            DiffOutcome::Snapshot {
                side: SnapshotSide::Before,
                attributes,
            } => (None, Some(attributes), None),
            DiffOutcome::Diff {
                before,
                after,
                changes,
            } => (Some(changes), Some(before), Some(after)),
        };

        Some(AuditRecord {
            id: Uuid::new_v4(),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            event: self.event,
            actor_id: self.actor.id,
            actor_type: self.actor.kind,
            diff,
            before,
            after,
            url: self.request.url,
            method: self.request.method,
            ip: self.request.ip,
            user_agent: self.request.user_agent,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{FieldChange, SuppressReason};
    use serde_json::json;

    #[test]
    fn test_suppressed_builds_nothing() {
        let record = RecordBuilder::new("users", "1", AuditEvent::Updated)
            .actor(Actor::new("u1", "user"))
            .build(DiffOutcome::Suppressed(SuppressReason::NoRawChanges));
        assert!(record.is_none());
    }

    #[test]
    fn test_snapshot_sides_map_to_columns() {
        let attrs = json!({"name": "A"}).as_object().unwrap().clone();

        let created = RecordBuilder::new("users", "1", AuditEvent::Created)
            .build(DiffOutcome::Snapshot {
                side: SnapshotSide::After,
                attributes: attrs.clone(),
            })
            .unwrap();
        assert!(created.before.is_none());
        assert!(created.diff.is_none());
        assert_eq!(created.after.unwrap()["name"], json!("A"));

        let deleted = RecordBuilder::new("users", "1", AuditEvent::Deleted)
            .build(DiffOutcome::Snapshot {
                side: SnapshotSide::Before,
                attributes: attrs,
            })
            .unwrap();
        assert!(deleted.after.is_none());
        assert!(deleted.before.is_some());
    }

    #[test]
    fn test_actor_sanitized_and_serialized_columns() {
        let mut changes = ChangeSet::new();
        changes.insert(
            "name".into(),
            FieldChange {
                before: json!("A"),
                after: json!("B"),
            },
        );
        let record = RecordBuilder::new("users", "42", AuditEvent::Updated)
            .actor(Actor {
                id: Some("u1".into()),
                kind: Some(String::new()),
            })
            .request(RequestMetadata::none().with_ip("10.0.0.1"))
            .build(DiffOutcome::Diff {
                before: json!({"name": "A"}).as_object().unwrap().clone(),
                after: json!({"name": "B"}).as_object().unwrap().clone(),
                changes,
            })
            .unwrap();

        assert_eq!(record.actor_id, Some("u1".into()));
        assert_eq!(record.actor_type, None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["auditable_type"], "users");
        assert_eq!(json["auditable_id"], "42");
        assert_eq!(json["event"], "updated");
        assert_eq!(json["ip"], "10.0.0.1");
        assert_eq!(json["diff"]["name"]["before"], "A");
        assert_eq!(json["diff"]["name"]["after"], "B");
    }
}
