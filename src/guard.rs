//! Route guard
//!
//! Gates the dashboard on the presence of a session marker. Only presence is
//! checked here; the session provider validates the token on the next call.

use crate::error::{ConsoleError, Result};
use crate::session::{Session, SessionProvider};
use axum::extract::{Request, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

/// Where unauthenticated visitors are sent
pub const LOGIN_PATH: &str = "/login";

/// Root of the protected area
pub const PROTECTED_PREFIX: &str = "/dashboard";

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue to the requested route
    Pass,
    /// Send the visitor to this path instead
    Redirect(String),
}

/// Session-cookie guard for dashboard routes
#[derive(Debug, Clone)]
pub struct RouteGuard {
    cookie_name: String,
}

impl RouteGuard {
    /// Guard checking the cookie named `cookie_name`
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Whether `path` is `/dashboard` or below it
    pub fn is_protected(path: &str) -> bool {
        path == PROTECTED_PREFIX
            || path
                .strip_prefix(PROTECTED_PREFIX)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Decide whether a request may proceed
    ///
    /// # Examples
    ///
    /// ```
    /// use botdesk::guard::{GuardDecision, RouteGuard};
    ///
    /// let guard = RouteGuard::new("sb-auth-token");
    /// assert_eq!(guard.check("/dashboard", None), GuardDecision::Redirect("/login".into()));
    /// assert_eq!(guard.check("/dashboard", Some("sb-auth-token=abc")), GuardDecision::Pass);
    /// assert_eq!(guard.check("/login", None), GuardDecision::Pass);
    /// ```
    pub fn check(&self, path: &str, cookie_header: Option<&str>) -> GuardDecision {
        if !Self::is_protected(path) {
            return GuardDecision::Pass;
        }

        match cookie_header.and_then(|header| cookie_value(header, &self.cookie_name)) {
            Some(value) if !value.is_empty() => GuardDecision::Pass,
            _ => {
                tracing::debug!("No session cookie for {}, redirecting to login", path);
                GuardDecision::Redirect(LOGIN_PATH.to_string())
            }
        }
    }

    /// The session marker carried by `headers`, if any
    pub fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        joined_cookies(headers)
            .and_then(|header| cookie_value(&header, &self.cookie_name).map(str::to_string))
            .filter(|value| !value.is_empty())
    }
}

/// Find `name` in a `Cookie` header value
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}

fn joined_cookies(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join("; "))
}

/// Axum middleware applying [`RouteGuard::check`]
pub async fn require_session(
    State(guard): State<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = joined_cookies(request.headers());
    match guard.check(request.uri().path(), cookies.as_deref()) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::Redirect(to) => Redirect::temporary(&to).into_response(),
    }
}

/// Require a stored session before a protected CLI command runs
///
/// # Errors
///
/// Returns [`ConsoleError::NoSession`] when no session marker is stored.
pub async fn require_stored_session(provider: &dyn SessionProvider) -> Result<Session> {
    provider
        .session()
        .await?
        .ok_or_else(|| ConsoleError::NoSession.into())
}
