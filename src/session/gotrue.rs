//! GoTrue-compatible session provider
//!
//! Signs in with the password grant, refreshes identity metadata from the
//! user endpoint, and revokes the session on sign-out. Every request carries
//! the configured public key in the `apikey` header.

use super::{Identity, Session, SessionProvider, SessionStore};
use crate::error::{ConsoleError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<Identity>,
}

/// Error bodies vary between GoTrue versions
#[derive(Debug, Deserialize, Default)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AuthErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Session provider backed by a GoTrue auth service
pub struct GoTrueSessionProvider {
    client: Client,
    auth_url: String,
    public_key: String,
    store: SessionStore,
}

impl GoTrueSessionProvider {
    /// Create a provider for the auth service at `auth_url`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(
        auth_url: &str,
        public_key: &str,
        store: SessionStore,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("botdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConsoleError::Session(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            public_key: public_key.to_string(),
            store,
        })
    }

    /// Sign in with email and password and persist the session
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Session`] when the credentials are rejected or
    /// the service cannot be reached.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.auth_url);
        tracing::debug!("Signing in at {}", url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.public_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ConsoleError::Session(format!("Failed to reach auth service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .into_message()
                .unwrap_or_else(|| format!("Sign-in failed with status {}", status.as_u16()));
            tracing::warn!("Sign-in rejected: {}", message);
            return Err(ConsoleError::Session(message).into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ConsoleError::Session(format!("Failed to parse sign-in response: {}", e))
        })?;

        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            identity: token.user,
        };
        self.store.save(&session)?;
        tracing::info!("Signed in as {}", email);

        Ok(session)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Identity> {
        let url = format!("{}/auth/v1/user", self.auth_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.public_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ConsoleError::Session(format!("Failed to reach auth service: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::debug!("Auth service rejected the session token: {}", status);
            return Err(ConsoleError::NoSession.into());
        }
        if !status.is_success() {
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .into_message()
                .unwrap_or_else(|| format!("User lookup failed with status {}", status.as_u16()));
            return Err(ConsoleError::Session(message).into());
        }

        response
            .json()
            .await
            .map_err(|e| ConsoleError::Session(format!("Failed to parse user: {}", e)).into())
    }
}

#[async_trait]
impl SessionProvider for GoTrueSessionProvider {
    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.store.load()?.filter(Session::has_marker))
    }

    async fn get_identity(&self) -> Result<Option<Identity>> {
        let Some(mut session) = self.session().await? else {
            return Ok(None);
        };

        let identity = self.fetch_user(&session.access_token).await?;
        if session.identity.as_ref() != Some(&identity) {
            session.identity = Some(identity.clone());
            if let Err(e) = self.store.save(&session) {
                tracing::warn!("Failed to refresh stored identity: {}", e);
            }
        }

        Ok(Some(identity))
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.session().await? {
            let url = format!("{}/auth/v1/logout", self.auth_url);
            let result = self
                .client
                .post(&url)
                .header("apikey", &self.public_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Session revoked by auth service");
                }
                Ok(response) => {
                    tracing::warn!("Auth service refused logout: {}", response.status());
                }
                Err(e) => tracing::warn!("Failed to reach auth service for logout: {}", e),
            }
        }

        self.store.clear()
    }
}
