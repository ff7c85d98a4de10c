//! Session provider abstraction
//!
//! The console never issues sessions itself. It consumes a session provider
//! that answers three questions: is there a session, who is signed in (with
//! which metadata), and how to sign out. Views and the API client depend on
//! the [`SessionProvider`] trait, injected once at the application root.
//!
//! Two implementations exist:
//!
//! - [`LocalSessionProvider`] reads the identity snapshot kept with the
//!   stored session, with no network access (demo use and tests).
//! - [`GoTrueSessionProvider`] talks to a GoTrue-compatible auth service to
//!   sign in, refresh identity metadata, and sign out.

pub mod gotrue;
pub mod store;

pub use gotrue::GoTrueSessionProvider;
pub use store::SessionStore;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Metadata key holding the backend credential
pub const API_KEY_FIELD: &str = "apiKey";

/// Metadata key holding the chatbot scope identifier
pub const CHATBOT_ID_FIELD: &str = "chatbotId";

/// The signed-in user as reported by the session provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier
    pub id: String,

    /// Account email
    #[serde(default)]
    pub email: String,

    /// Free-form per-user metadata
    #[serde(default, alias = "user_metadata")]
    pub metadata: Map<String, Value>,
}

impl Identity {
    /// Create an identity with empty metadata
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            metadata: Map::new(),
        }
    }

    /// Builder-style metadata insertion
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// The backend credential assigned to this user, if any
    pub fn api_key(&self) -> Option<&str> {
        self.metadata
            .get(API_KEY_FIELD)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
    }

    /// The chatbot this user administers, if any
    ///
    /// Numeric identifiers are accepted and rendered as strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use botdesk::session::Identity;
    ///
    /// let identity = Identity::new("u1", "a@example.com").with_metadata("chatbotId", 17);
    /// assert_eq!(identity.chatbot_id().as_deref(), Some("17"));
    /// ```
    pub fn chatbot_id(&self) -> Option<String> {
        match self.metadata.get(CHATBOT_ID_FIELD)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Access token; its presence is the session marker
    pub access_token: String,

    /// Refresh token issued alongside the access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires, as reported at sign-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Identity snapshot captured at sign-in or last refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl Session {
    /// Create a session carrying only an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            identity: None,
        }
    }

    /// Attach an identity snapshot
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Whether the session marker is present
    ///
    /// Only presence is checked; integrity and expiry are the provider's
    /// business on the next call.
    pub fn has_marker(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

/// Source of the current session and identity
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, if one exists
    async fn session(&self) -> Result<Option<Session>>;

    /// The signed-in identity with its metadata
    async fn get_identity(&self) -> Result<Option<Identity>>;

    /// End the session
    async fn sign_out(&self) -> Result<()>;
}

/// Session provider backed only by the stored snapshot
///
/// # Examples
///
/// ```
/// use botdesk::session::{Identity, LocalSessionProvider, Session, SessionProvider};
///
/// # async fn example() -> botdesk::error::Result<()> {
/// let identity = Identity::new("u1", "owner@example.com").with_metadata("chatbotId", "bot-1");
/// let provider = LocalSessionProvider::in_memory(Some(Session::new("token").with_identity(identity)));
/// let current = provider.get_identity().await?.unwrap();
/// assert_eq!(current.chatbot_id().as_deref(), Some("bot-1"));
/// # Ok(())
/// # }
/// ```
pub struct LocalSessionProvider {
    store: SessionStore,
}

impl LocalSessionProvider {
    /// Wrap an existing store
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Provider over an in-memory session
    pub fn in_memory(session: Option<Session>) -> Self {
        Self::new(SessionStore::memory(session))
    }

    /// Provider with no session at all
    pub fn signed_out() -> Self {
        Self::in_memory(None)
    }
}

#[async_trait]
impl SessionProvider for LocalSessionProvider {
    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.store.load()?.filter(Session::has_marker))
    }

    async fn get_identity(&self) -> Result<Option<Identity>> {
        Ok(self.session().await?.and_then(|s| s.identity))
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.clear()
    }
}

/// Build the session provider selected by configuration
///
/// A configured auth URL selects the remote provider; otherwise the stored
/// snapshot is used offline.
pub fn create_session_provider(config: &Config) -> Result<Arc<dyn SessionProvider>> {
    let store = SessionStore::file(config.session_path());

    match &config.auth.url {
        Some(url) => {
            tracing::debug!("Using GoTrue session provider at {}", url);
            Ok(Arc::new(GoTrueSessionProvider::new(
                url,
                &config.auth.public_key,
                store,
                std::time::Duration::from_secs(config.backend.timeout_seconds),
            )?))
        }
        None => {
            tracing::debug!("No auth URL configured, using stored session snapshot");
            Ok(Arc::new(LocalSessionProvider::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_api_key_ignores_empty() {
        let identity = Identity::new("u1", "a@b.c").with_metadata(API_KEY_FIELD, "");
        assert!(identity.api_key().is_none());

        let identity = Identity::new("u1", "a@b.c").with_metadata(API_KEY_FIELD, "key-123");
        assert_eq!(identity.api_key(), Some("key-123"));
    }

    #[test]
    fn test_identity_chatbot_id_variants() {
        let none = Identity::new("u1", "a@b.c");
        assert!(none.chatbot_id().is_none());

        let blank = Identity::new("u1", "a@b.c").with_metadata(CHATBOT_ID_FIELD, " ");
        assert!(blank.chatbot_id().is_none());

        let flag = Identity::new("u1", "a@b.c").with_metadata(CHATBOT_ID_FIELD, true);
        assert!(flag.chatbot_id().is_none());

        let text = Identity::new("u1", "a@b.c").with_metadata(CHATBOT_ID_FIELD, "bot-9");
        assert_eq!(text.chatbot_id().as_deref(), Some("bot-9"));
    }

    #[test]
    fn test_identity_accepts_user_metadata_alias() {
        let identity: Identity = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.c",
            "user_metadata": { "chatbotId": "bot-1", "apiKey": "k" }
        }))
        .unwrap();
        assert_eq!(identity.chatbot_id().as_deref(), Some("bot-1"));
        assert_eq!(identity.api_key(), Some("k"));
    }

    #[test]
    fn test_session_marker() {
        assert!(Session::new("abc").has_marker());
        assert!(!Session::new("   ").has_marker());
    }

    #[tokio::test]
    async fn test_local_provider_signed_out() {
        let provider = LocalSessionProvider::signed_out();
        assert!(provider.session().await.unwrap().is_none());
        assert!(provider.get_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_provider_empty_marker_is_no_session() {
        let provider = LocalSessionProvider::in_memory(Some(Session::new("")));
        assert!(provider.session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_provider_sign_out_clears() {
        let identity = Identity::new("u1", "a@b.c");
        let provider =
            LocalSessionProvider::in_memory(Some(Session::new("tok").with_identity(identity)));
        assert!(provider.get_identity().await.unwrap().is_some());

        provider.sign_out().await.unwrap();
        assert!(provider.session().await.unwrap().is_none());
    }
}
