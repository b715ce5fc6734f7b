//! # Polarway Audit
//!
//! Audit diff engine — given an entity mutation (old attribute map, new
//! attribute map, event kind), compute WHAT gets recorded and in what shape:
//! a before/after/diff triple with semantic normalization and sensitive-field
//! redaction, assembled into a durable [`AuditRecord`].
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              polarway-audit               │
//! ├───────────────┬───────────┬───────────────┤
//! │ AuditRecorder │ DiffEngine│ RecordBuilder │
//! │ (hooks, gate, │ (exclude, │ (pure record  │
//! │  enrichment)  │  diff,    │  assembly)    │
//! │               │  mask)    │               │
//! ├───────────────┴───────────┴───────────────┤
//! │     normalize · mask · actor · sink       │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The host's data layer calls the recorder hooks explicitly; the host's
//! persistence collaborator receives finished records through [`AuditSink`].
//! There is no implicit model registration and no storage inside this crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use polarway_audit::{AuditConfig, AuditRecorder, MemorySink};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(MemorySink::new());
//!     let recorder = AuditRecorder::new(AuditConfig::new(), sink.clone())?;
//!
//!     let old = json!({"name": "Ada", "password": "old"});
//!     let new = json!({"name": "Ada L.", "password": "new"});
//!     recorder.on_entity_updated(
//!         "users",
//!         "42",
//!         old.as_object().unwrap(),
//!         new.as_object().unwrap(),
//!     )?;
//!
//!     assert_eq!(sink.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Semantic diffing**: only fields that changed under the active
//!   normalization rule appear in the diff
//! - **Redaction**: configured keys are masked to `"***"` at any nesting
//!   depth, consistently across diff and snapshots
//! - **Fail-open enrichment**: actor and request-metadata resolution can
//!   never abort a record
//! - **Railway Programming**: fallible operations return `Result<T, AuditError>`

pub mod actor;
pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod mask;
pub mod normalize;
pub mod record;
pub mod recorder;
pub mod sink;

// Re-exports for convenience
pub use actor::{Actor, ActorResolver, RequestMetadata, RequestResolver};
pub use config::AuditConfig;
pub use diff::{AttributeMap, ChangeSet, DiffEngine, DiffOutcome, FieldChange, SnapshotSide, SuppressReason};
pub use error::{AuditError, PersistError, Result};
pub use event::AuditEvent;
pub use mask::MASK_MARKER;
pub use record::{AuditRecord, RecordBuilder};
pub use recorder::AuditRecorder;
pub use sink::{AuditSink, MemorySink, NullSink};
