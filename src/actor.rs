//! Actor and request-metadata capabilities
//!
//! Who caused a mutation, and from which request, is the host's knowledge.
//! The core consumes two pluggable resolvers and treats both as total:
//! a resolver that fails produces the anonymous/none value, never an error.

use serde::{Deserialize, Serialize};

/// Identity of whoever caused a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(kind.into()),
        }
    }

    /// The all-`None` actor, used when no resolver is configured or
    /// resolution failed.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Empty-string id/kind carry no identity; map them to `None` so the
    /// persisted columns stay honestly nullable.
    pub fn sanitized(mut self) -> Self {
        self.id = self.id.filter(|s| !s.is_empty());
        self.kind = self.kind.filter(|s| !s.is_empty());
        self
    }
}

/// Request context attached to a record when the host can supply one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub url: Option<String>,
    pub method: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMetadata {
    /// No request context (background jobs, CLI mutations).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Capability returning the current actor.
///
/// Contract: total and side-effect-free from the core's perspective. The
/// recorder additionally isolates panics, so a misbehaving implementation
/// degrades to [`Actor::anonymous`] rather than aborting the record.
pub trait ActorResolver: Send + Sync {
    fn resolve(&self) -> Actor;
}

impl<F> ActorResolver for F
where
    F: Fn() -> Actor + Send + Sync,
{
    fn resolve(&self) -> Actor {
        self()
    }
}

/// Capability returning the current request context. Same contract as
/// [`ActorResolver`]; failure degrades to [`RequestMetadata::none`].
pub trait RequestResolver: Send + Sync {
    fn resolve(&self) -> RequestMetadata;
}

impl<F> RequestResolver for F
where
    F: Fn() -> RequestMetadata + Send + Sync,
{
    fn resolve(&self) -> RequestMetadata {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_drops_empty_strings() {
        let actor = Actor {
            id: Some(String::new()),
            kind: Some("user".into()),
        };
        let clean = actor.sanitized();
        assert_eq!(clean.id, None);
        assert_eq!(clean.kind, Some("user".into()));
    }

    #[test]
    fn test_closure_resolvers() {
        let actor_resolver = || Actor::new("u1", "user");
        assert_eq!(ActorResolver::resolve(&actor_resolver).id, Some("u1".into()));

        let req_resolver = || RequestMetadata::none().with_method("PUT");
        assert_eq!(
            RequestResolver::resolve(&req_resolver).method,
            Some("PUT".into())
        );
    }

    #[test]
    fn test_actor_serializes_kind_as_type() {
        let json = serde_json::to_value(Actor::new("u1", "user")).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["id"], "u1");
    }
}
