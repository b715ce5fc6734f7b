//! Error types for polarway-audit.
//!
//! The computing core (diff, normalization, masking) is pure and cannot
//! fail; errors exist only at the configuration boundary and the
//! persistence seam. `Suppressed` outcomes are not errors and never
//! appear here.

use thiserror::Error;

/// Unified error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    // ─── Configuration Errors ───
    /// Malformed `AuditConfig`; surfaced when a recorder is constructed,
    /// fatal to the audit subsystem only.
    #[error("Invalid audit configuration: {0}")]
    Config(String),

    // ─── Persistence Errors ───
    /// The sink collaborator refused or failed the write. The host must
    /// surface this rather than silently drop audit data.
    #[error("Audit persistence failed: {0}")]
    Persist(#[from] PersistError),
}

/// Failure vocabulary for [`AuditSink`](crate::sink::AuditSink)
/// implementations. The core has no retry policy for these; it hands them
/// back to the host unchanged.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Audit store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
