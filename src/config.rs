//! Configuration for the audit core
//!
//! An [`AuditConfig`] is an immutable value built in code and handed to a
//! recorder at construction. There is no file loading and no global
//! singleton: hosts that want per-entity-type behavior build several configs
//! and several recorders.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actor::{ActorResolver, RequestResolver};
use crate::error::{AuditError, Result};
use crate::event::AuditEvent;

/// Field names redacted by default.
pub const DEFAULT_MASK_KEYS: [&str; 5] = ["password", "token", "secret", "api_key", "authorization"];

/// Field names treated as timestamps by default.
pub const DEFAULT_TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Audit configuration
///
/// Plain fields round-trip through serde so hosts can embed this value in
/// their own config files; the resolver capabilities are code-only and
/// skipped in (de)serialization.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Master switch; when false every hook is a no-op.
    pub enabled: bool,

    /// Event kinds that produce records; others are gated out.
    pub events: HashSet<AuditEvent>,

    /// Treat empty-string and null as the same value when diffing.
    pub null_equals_empty_string: bool,

    /// Suppress updates where only timestamp fields changed.
    pub skip_if_only_timestamps_changed: bool,

    /// Store full snapshots for updates instead of only the changed keys.
    /// The diff itself is always partial.
    pub store_full_snapshot: bool,

    /// Lowercase field names to redact (matched case-insensitively).
    /// Non-lowercase entries are rejected by [`validate`](Self::validate).
    pub mask_keys: HashSet<String>,

    /// Field names removed from snapshots and diffs entirely.
    pub exclude_keys: HashSet<String>,

    /// Field names counted as timestamps for the suppression rule.
    pub timestamp_fields: HashSet<String>,

    /// Who caused the mutation; `None` records an anonymous actor.
    #[serde(skip)]
    pub actor_resolver: Option<Arc<dyn ActorResolver>>,

    /// Request context; `None` records no request metadata.
    #[serde(skip)]
    pub request_resolver: Option<Arc<dyn RequestResolver>>,
}

impl AuditConfig {
    /// Create config with the shipped defaults: all events tracked, empty
    /// strings equal null, timestamp-only updates suppressed, partial
    /// snapshots, the common credential fields masked.
    pub fn new() -> Self {
        Self {
            enabled: true,
            events: AuditEvent::all().into_iter().collect(),
            null_equals_empty_string: true,
            skip_if_only_timestamps_changed: true,
            store_full_snapshot: false,
            mask_keys: DEFAULT_MASK_KEYS.iter().map(|s| s.to_string()).collect(),
            exclude_keys: HashSet::new(),
            timestamp_fields: DEFAULT_TIMESTAMP_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            actor_resolver: None,
            request_resolver: None,
        }
    }

    /// Override the master switch
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Override the tracked event set
    pub fn with_events(mut self, events: impl IntoIterator<Item = AuditEvent>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Override empty-string ≡ null normalization
    pub fn with_null_equals_empty_string(mut self, flag: bool) -> Self {
        self.null_equals_empty_string = flag;
        self
    }

    /// Override timestamp-only suppression
    pub fn with_skip_if_only_timestamps_changed(mut self, flag: bool) -> Self {
        self.skip_if_only_timestamps_changed = flag;
        self
    }

    /// Override the snapshot storage strategy
    pub fn with_store_full_snapshot(mut self, flag: bool) -> Self {
        self.store_full_snapshot = flag;
        self
    }

    /// Override the masked key set; names are lowercased here so the engine
    /// compares lowercase-to-lowercase.
    pub fn with_mask_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mask_keys = keys.into_iter().map(|s| s.into().to_lowercase()).collect();
        self
    }

    /// Override the excluded key set
    pub fn with_exclude_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Override the timestamp field names
    pub fn with_timestamp_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamp_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Supply the actor capability
    pub fn with_actor_resolver(mut self, resolver: Arc<dyn ActorResolver>) -> Self {
        self.actor_resolver = Some(resolver);
        self
    }

    /// Supply the request-metadata capability
    pub fn with_request_resolver(mut self, resolver: Arc<dyn RequestResolver>) -> Self {
        self.request_resolver = Some(resolver);
        self
    }

    /// Whether hooks for `event` should produce records at all.
    pub fn tracks(&self, event: AuditEvent) -> bool {
        self.enabled && self.events.contains(&event)
    }

    /// Reject degenerate key names. With the flags strongly typed, the
    /// malformed configs left are empty or whitespace-only names in the key
    /// sets (they would silently match nothing, or everything named `""`)
    /// and mixed-case mask keys. The engine compares mask keys
    /// lowercase-to-lowercase; `with_mask_keys` lowercases on the way in,
    /// but keys arriving via serde or direct field assignment bypass that,
    /// so a non-lowercase entry here would never match and is rejected.
    pub fn validate(&self) -> Result<()> {
        for (set, name) in [
            (&self.mask_keys, "mask_keys"),
            (&self.exclude_keys, "exclude_keys"),
            (&self.timestamp_fields, "timestamp_fields"),
        ] {
            if set.iter().any(|k| k.trim().is_empty()) {
                return Err(AuditError::Config(format!(
                    "{name} contains an empty or whitespace-only field name"
                )));
            }
        }
        if let Some(key) = self.mask_keys.iter().find(|k| *k != &k.to_lowercase()) {
            return Err(AuditError::Config(format!(
                "mask_keys entry '{key}' must be lowercase (data keys are matched case-insensitively)"
            )));
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Resolver fields are opaque; show presence only.
impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("enabled", &self.enabled)
            .field("events", &self.events)
            .field("null_equals_empty_string", &self.null_equals_empty_string)
            .field(
                "skip_if_only_timestamps_changed",
                &self.skip_if_only_timestamps_changed,
            )
            .field("store_full_snapshot", &self.store_full_snapshot)
            .field("mask_keys", &self.mask_keys)
            .field("exclude_keys", &self.exclude_keys)
            .field("timestamp_fields", &self.timestamp_fields)
            .field("actor_resolver", &self.actor_resolver.is_some())
            .field("request_resolver", &self.request_resolver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AuditConfig::new();
        assert!(cfg.enabled);
        assert!(cfg.tracks(AuditEvent::Created));
        assert!(cfg.tracks(AuditEvent::Updated));
        assert!(cfg.tracks(AuditEvent::Deleted));
        assert!(cfg.null_equals_empty_string);
        assert!(cfg.skip_if_only_timestamps_changed);
        assert!(!cfg.store_full_snapshot);
        assert!(cfg.mask_keys.contains("password"));
        assert!(cfg.timestamp_fields.contains("updated_at"));
        assert!(cfg.exclude_keys.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let cfg = AuditConfig::new()
            .with_events([AuditEvent::Updated])
            .with_store_full_snapshot(true)
            .with_mask_keys(["PIN", "ssn"])
            .with_exclude_keys(["remember_token"]);

        assert!(cfg.tracks(AuditEvent::Updated));
        assert!(!cfg.tracks(AuditEvent::Created));
        assert!(cfg.store_full_snapshot);
        // mask keys lowercased on the way in
        assert!(cfg.mask_keys.contains("pin"));
        assert!(cfg.mask_keys.contains("ssn"));
        assert!(cfg.exclude_keys.contains("remember_token"));
    }

    #[test]
    fn test_disabled_tracks_nothing() {
        let cfg = AuditConfig::new().with_enabled(false);
        assert!(!cfg.tracks(AuditEvent::Updated));
    }

    #[test]
    fn test_validate_rejects_blank_keys() {
        let cfg = AuditConfig::new().with_exclude_keys(["  "]);
        assert!(matches!(cfg.validate(), Err(AuditError::Config(_))));
        assert!(AuditConfig::new().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_mixed_case_mask_keys() {
        // direct field assignment bypasses the lowercasing in with_mask_keys
        let mut cfg = AuditConfig::new();
        cfg.mask_keys.insert("Password".into());
        assert!(matches!(cfg.validate(), Err(AuditError::Config(_))));

        // so does deserialization from a host config file
        let cfg: AuditConfig =
            serde_json::from_str(r#"{"mask_keys": ["api_key", "Token"]}"#).unwrap();
        assert!(matches!(cfg.validate(), Err(AuditError::Config(_))));

        let cfg: AuditConfig = serde_json::from_str(r#"{"mask_keys": ["token"]}"#).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_serde_roundtrip_skips_resolvers() {
        let cfg = AuditConfig::new().with_store_full_snapshot(true);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AuditConfig = serde_json::from_str(&json).unwrap();
        assert!(back.store_full_snapshot);
        assert!(back.actor_resolver.is_none());
    }
}
