//! AuditRecorder — explicit wiring from host mutation hooks to the sink
//!
//! The host's data layer calls one of three hooks per mutation. The recorder
//! gates on configuration, runs the engine, enriches fail-open with actor
//! and request context, builds the record, and hands it to the sink. It
//! holds no mutable state; several recorders with independent configs may
//! coexist (per-entity-type configuration).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::actor::{Actor, RequestMetadata};
use crate::config::AuditConfig;
use crate::diff::{AttributeMap, DiffEngine, DiffOutcome};
use crate::error::Result;
use crate::event::AuditEvent;
use crate::record::{AuditRecord, RecordBuilder};
use crate::sink::AuditSink;

pub struct AuditRecorder {
    config: Arc<AuditConfig>,
    engine: DiffEngine,
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    /// Validate the config and wire up a recorder. A malformed config is
    /// rejected here, at startup, so the audit subsystem fails before the
    /// host starts mutating entities.
    pub fn new(config: AuditConfig, sink: Arc<dyn AuditSink>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            engine: DiffEngine::new(config.clone()),
            config,
            sink,
        })
    }

    /// Record an entity creation. Returns the persisted record, or `None`
    /// when the event is gated out or suppressed.
    pub fn on_entity_created(
        &self,
        entity_type: &str,
        entity_id: &str,
        attributes: &AttributeMap,
    ) -> Result<Option<AuditRecord>> {
        self.record(
            entity_type,
            entity_id,
            AuditEvent::Created,
            &AttributeMap::new(),
            attributes,
        )
    }

    /// Record an entity update from its old and new attribute state.
    pub fn on_entity_updated(
        &self,
        entity_type: &str,
        entity_id: &str,
        old_attributes: &AttributeMap,
        new_attributes: &AttributeMap,
    ) -> Result<Option<AuditRecord>> {
        self.record(
            entity_type,
            entity_id,
            AuditEvent::Updated,
            old_attributes,
            new_attributes,
        )
    }

    /// Record an entity deletion from its final attribute state.
    pub fn on_entity_deleted(
        &self,
        entity_type: &str,
        entity_id: &str,
        attributes: &AttributeMap,
    ) -> Result<Option<AuditRecord>> {
        self.record(
            entity_type,
            entity_id,
            AuditEvent::Deleted,
            attributes,
            &AttributeMap::new(),
        )
    }

    fn record(
        &self,
        entity_type: &str,
        entity_id: &str,
        event: AuditEvent,
        old: &AttributeMap,
        new: &AttributeMap,
    ) -> Result<Option<AuditRecord>> {
        if !self.config.tracks(event) {
            debug!(entity_type, %event, "event not tracked, skipping");
            return Ok(None);
        }

        let outcome = self.engine.compute(event, old, new);
        if let DiffOutcome::Suppressed(reason) = outcome {
            debug!(entity_type, entity_id, %event, reason = reason.as_str(), "audit suppressed");
            return Ok(None);
        }

        let record = RecordBuilder::new(entity_type, entity_id, event)
            .actor(self.resolve_actor())
            .request(self.resolve_request())
            .build(outcome);

        match record {
            Some(record) => {
                self.sink.persist(&record)?;
                debug!(entity_type, entity_id, %event, record_id = %record.id, "audit record persisted");
                Ok(Some(record))
            }
            // unreachable given the suppression check above, but the
            // builder contract allows it
            None => Ok(None),
        }
    }

    // Enrichment is fail-open: a panicking resolver degrades to the
    // anonymous/none value and the record still gets written.
    fn resolve_actor(&self) -> Actor {
        let Some(resolver) = &self.config.actor_resolver else {
            return Actor::anonymous();
        };
        catch_unwind(AssertUnwindSafe(|| resolver.resolve())).unwrap_or_else(|_| {
            warn!("actor resolver panicked, recording anonymous actor");
            Actor::anonymous()
        })
    }

    fn resolve_request(&self) -> RequestMetadata {
        let Some(resolver) = &self.config.request_resolver else {
            return RequestMetadata::none();
        };
        catch_unwind(AssertUnwindSafe(|| resolver.resolve())).unwrap_or_else(|_| {
            warn!("request resolver panicked, recording no request metadata");
            RequestMetadata::none()
        })
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
