//! DiffEngine — decides what gets recorded, and in what shape
//!
//! One invocation per mutation event, three possible outcomes: the event is
//! suppressed, it yields a single-sided snapshot (created/deleted), or it
//! yields a before/after/diff triple (updated). Exclusion, normalization,
//! timestamp suppression, and masking are applied in that order; the diff is
//! re-derived from the masked snapshots so the two can never disagree on a
//! redacted field. Pure value transformation, no I/O, no shared state.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::config::AuditConfig;
use crate::event::AuditEvent;
use crate::mask::mask_attributes;
use crate::normalize::{normalize_attributes, normalize_value};

/// An entity's field state at one instant. Values may be scalars or nested
/// arrays/objects; the engine never mutates a map it was handed.
pub type AttributeMap = serde_json::Map<String, Value>;

/// One changed field's normalized pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Value,
    pub after: Value,
}

/// Only the fields that semantically changed. Ordered so serialized diffs
/// are deterministic. Invariant: no entry has `before == after` under the
/// active normalization rule.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// Which side a created/deleted snapshot occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    Before,
    After,
}

/// Why an update produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The host reported no raw changes at all.
    NoRawChanges,
    /// Every raw change was excluded or normalized away.
    NoEffectiveChanges,
    /// Every effective change was a timestamp field.
    TimestampsOnly,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRawChanges => "no_raw_changes",
            Self::NoEffectiveChanges => "no_effective_changes",
            Self::TimestampsOnly => "timestamps_only",
        }
    }
}

/// Terminal outcome of one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    /// No record warranted. Not an error.
    Suppressed(SuppressReason),
    /// Created/deleted: one full snapshot, no diff.
    Snapshot {
        side: SnapshotSide,
        attributes: AttributeMap,
    },
    /// Updated: before/after per the storage strategy, diff always partial.
    Diff {
        before: AttributeMap,
        after: AttributeMap,
        changes: ChangeSet,
    },
}

impl DiffOutcome {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }
}

/// The diff/normalization/redaction core.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    config: Arc<AuditConfig>,
}

impl DiffEngine {
    pub fn new(config: Arc<AuditConfig>) -> Self {
        Self { config }
    }

    /// Compute the outcome for one mutation event.
    ///
    /// `old` is ignored for created events, `new` for deleted events.
    pub fn compute(&self, event: AuditEvent, old: &AttributeMap, new: &AttributeMap) -> DiffOutcome {
        match event {
            AuditEvent::Created => DiffOutcome::Snapshot {
                side: SnapshotSide::After,
                attributes: self.prepare_snapshot(new),
            },
            AuditEvent::Deleted => DiffOutcome::Snapshot {
                side: SnapshotSide::Before,
                attributes: self.prepare_snapshot(old),
            },
            AuditEvent::Updated => self.compute_update(old, new),
        }
    }

    /// Full snapshot for a created/deleted event: exclusions removed,
    /// normalized, masked. `store_full_snapshot` does not change this shape;
    /// a creation or deletion has no partial form.
    fn prepare_snapshot(&self, attributes: &AttributeMap) -> AttributeMap {
        let cfg = &self.config;
        let snapshot = exclude_keys(attributes.clone(), &cfg.exclude_keys);
        let snapshot = normalize_attributes(snapshot, cfg.null_equals_empty_string);
        mask_attributes(snapshot, &cfg.mask_keys)
    }

    fn compute_update(&self, old: &AttributeMap, new: &AttributeMap) -> DiffOutcome {
        let cfg = &self.config;

        // 1. raw change keys: fields of old ∪ new whose raw values differ.
        // A field absent on one side compares as Null.
        let mut raw_changed: Vec<&String> = old
            .keys()
            .chain(new.keys().filter(|k| !old.contains_key(*k)))
            .filter(|k| raw_value(old, k) != raw_value(new, k))
            .collect();
        if raw_changed.is_empty() {
            return DiffOutcome::Suppressed(SuppressReason::NoRawChanges);
        }

        // 2. drop excluded keys before normalization; they never appear in
        // diff/before/after.
        raw_changed.retain(|k| !cfg.exclude_keys.contains(*k));

        // 3. normalize both sides per field; drop fields whose normalized
        // values are deeply equal (raw-level change, semantically none).
        let mut changes = ChangeSet::new();
        for key in raw_changed {
            let before = normalize_value(raw_value(old, key), cfg.null_equals_empty_string);
            let after = normalize_value(raw_value(new, key), cfg.null_equals_empty_string);
            if before == after {
                trace!(field = %key, "change normalized away");
                continue;
            }
            changes.insert(key.clone(), FieldChange { before, after });
        }

        // 4. everything excluded or normalized away.
        if changes.is_empty() {
            return DiffOutcome::Suppressed(SuppressReason::NoEffectiveChanges);
        }

        // 5. timestamp-only update.
        if cfg.skip_if_only_timestamps_changed
            && changes.keys().all(|k| cfg.timestamp_fields.contains(k))
        {
            return DiffOutcome::Suppressed(SuppressReason::TimestampsOnly);
        }

        // 6. projected partial snapshots from the same key set.
        let before_partial: AttributeMap = changes
            .iter()
            .map(|(k, c)| (k.clone(), c.before.clone()))
            .collect();
        let after_partial: AttributeMap = changes
            .iter()
            .map(|(k, c)| (k.clone(), c.after.clone()))
            .collect();

        // 7. storage strategy decides the snapshot shape; the diff is
        // always partial (step 8) — diff answers "what changed", snapshot
        // answers "what was the full state".
        let (before, after) = if cfg.store_full_snapshot {
            (
                normalize_attributes(
                    exclude_keys(old.clone(), &cfg.exclude_keys),
                    cfg.null_equals_empty_string,
                ),
                normalize_attributes(
                    exclude_keys(new.clone(), &cfg.exclude_keys),
                    cfg.null_equals_empty_string,
                ),
            )
        } else {
            (before_partial, after_partial)
        };

        // 9. mask the snapshots, then rebuild each diff entry from the
        // masked maps so diff and snapshots agree on redacted fields.
        let before = mask_attributes(before, &cfg.mask_keys);
        let after = mask_attributes(after, &cfg.mask_keys);
        let changes: ChangeSet = changes
            .into_keys()
            .map(|k| {
                let change = FieldChange {
                    before: before.get(&k).cloned().unwrap_or(Value::Null),
                    after: after.get(&k).cloned().unwrap_or(Value::Null),
                };
                (k, change)
            })
            .collect();

        DiffOutcome::Diff {
            before,
            after,
            changes,
        }
    }
}

/// Value of `key` in `map`, with absent fields reading as `Null`.
fn raw_value(map: &AttributeMap, key: &str) -> Value {
    map.get(key).cloned().unwrap_or(Value::Null)
}

fn exclude_keys(mut map: AttributeMap, exclude: &HashSet<String>) -> AttributeMap {
    map.retain(|k, _| !exclude.contains(k));
    map
}
