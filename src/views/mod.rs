//! Console views
//!
//! Every view follows the same lifecycle, implemented once here:
//!
//! 1. check that a session exists (no fetch happens without one),
//! 2. resolve the chatbot identifier from the identity metadata,
//! 3. fetch through the [`DataSource`] and settle in `Ready` or `Error`.
//!
//! Mutations go through [`run_action`], which records the in-flight action,
//! raises an error banner on failure and clears the action flag afterwards.
//! The caller raises the success banner and updates its local copy.

pub mod chatbot;
pub mod knowledge;
pub mod stats;
pub mod test_console;

pub use chatbot::ChatbotConfigView;
pub use knowledge::KnowledgeView;
pub use stats::StatsView;
pub use test_console::TestConsoleView;

use crate::backend::DataSource;
use crate::error::{user_message, ConsoleError, Result};
use crate::session::SessionProvider;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Call to action shown with [`ViewError::NoSession`]
pub const LOGIN_CALL_TO_ACTION: &str = "Return to login";

/// Everything a view needs from the application root
#[derive(Clone)]
pub struct ViewContext {
    pub session: Arc<dyn SessionProvider>,
    pub source: Arc<dyn DataSource>,
    pub banner_ttl: Duration,
    pub cancel: CancellationToken,
}

impl ViewContext {
    /// Context with a fresh cancellation token
    pub fn new(
        session: Arc<dyn SessionProvider>,
        source: Arc<dyn DataSource>,
        banner_ttl: Duration,
    ) -> Self {
        Self {
            session,
            source,
            banner_ttl,
            cancel: CancellationToken::new(),
        }
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("banner_ttl", &self.banner_ttl)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Why a view could not reach `Ready`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("No active session")]
    NoSession,

    #[error("No chatbot assigned to this user")]
    NoChatbotAssigned,

    #[error("{0}")]
    Load(String),
}

impl ViewError {
    /// Classify an error raised while loading
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ConsoleError>() {
            Some(ConsoleError::NoSession) => Self::NoSession,
            Some(ConsoleError::NoChatbotAssigned) => Self::NoChatbotAssigned,
            _ => Self::Load(user_message(err)),
        }
    }

    /// Call to action accompanying the error, if any
    pub fn call_to_action(&self) -> Option<&'static str> {
        match self {
            Self::NoSession => Some(LOGIN_CALL_TO_ACTION),
            _ => None,
        }
    }
}

impl From<ViewError> for ConsoleError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::NoSession => ConsoleError::NoSession,
            ViewError::NoChatbotAssigned => ConsoleError::NoChatbotAssigned,
            ViewError::Load(message) => ConsoleError::Api(message),
        }
    }
}

/// Resolve the chatbot a view is scoped to
///
/// The session is checked before the identity so a signed-out caller never
/// triggers an identity lookup.
pub async fn resolve_scope(session: &dyn SessionProvider) -> std::result::Result<String, ViewError> {
    match session.session().await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ViewError::NoSession),
        Err(e) => return Err(ViewError::from_error(&e)),
    }

    let identity = match session.get_identity().await {
        Ok(Some(identity)) => identity,
        Ok(None) => return Err(ViewError::NoSession),
        Err(e) => return Err(ViewError::from_error(&e)),
    };

    identity.chatbot_id().ok_or(ViewError::NoChatbotAssigned)
}

/// Load status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    Error,
}

type Fetcher<T> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// One fetched resource with its load state
///
/// Holds the fetch function so `refetch` repeats exactly the mount request.
pub struct Resource<T> {
    session: Arc<dyn SessionProvider>,
    cancel: CancellationToken,
    fetch: Fetcher<T>,
    scope: Option<String>,
    data: Option<T>,
    status: Status,
    error: Option<ViewError>,
}

impl<T: Send + 'static> Resource<T> {
    /// Resource that fetches with `fetch(chatbot_id)`
    pub fn new<F>(session: Arc<dyn SessionProvider>, cancel: CancellationToken, fetch: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        Self {
            session,
            cancel,
            fetch: Arc::new(fetch),
            scope: None,
            data: None,
            status: Status::Loading,
            error: None,
        }
    }

    /// Resolve the scope and fetch
    pub async fn load(&mut self) {
        self.status = Status::Loading;
        self.error = None;

        let scope = match resolve_scope(self.session.as_ref()).await {
            Ok(scope) => scope,
            Err(e) => {
                self.scope = None;
                self.fail(e);
                return;
            }
        };
        self.scope = Some(scope.clone());

        let fetch = (self.fetch)(scope);
        let cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Fetch cancelled; view was unmounted");
            }
            result = fetch => match result {
                Ok(data) => {
                    self.data = Some(data);
                    self.status = Status::Ready;
                }
                Err(e) => {
                    tracing::warn!("Failed to load view data: {}", e);
                    self.fail(ViewError::from_error(&e));
                }
            },
        }
    }

    /// Repeat the mount request
    pub async fn refetch(&mut self) {
        self.load().await;
    }

    fn fail(&mut self, error: ViewError) {
        self.data = None;
        self.status = Status::Error;
        self.error = Some(error);
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Mutable access for local updates after a confirmed mutation
    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    /// The resolved chatbot identifier
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Chatbot identifier for a mutation, or the reason there is none
    pub fn require_scope(&self) -> Result<String> {
        if let Some(scope) = &self.scope {
            return Ok(scope.clone());
        }
        let err: ConsoleError = self.error.clone().unwrap_or(ViewError::NoSession).into();
        Err(err.into())
    }
}

/// Banner severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

/// A status message shown above a view
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    raised_at: Instant,
    ttl: Option<Duration>,
}

impl Banner {
    /// Whether the banner has auto-dismissed
    pub fn is_expired(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| self.raised_at.elapsed() >= ttl)
    }
}

/// Holds the current banner of a view
///
/// Success banners dismiss themselves after the configured delay; error
/// banners stay until replaced.
#[derive(Debug, Clone)]
pub struct BannerSlot {
    current: Option<Banner>,
    success_ttl: Duration,
}

impl BannerSlot {
    pub fn new(success_ttl: Duration) -> Self {
        Self {
            current: None,
            success_ttl,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.current = Some(Banner {
            kind: BannerKind::Success,
            message: message.into(),
            raised_at: Instant::now(),
            ttl: Some(self.success_ttl),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.current = Some(Banner {
            kind: BannerKind::Error,
            message: message.into(),
            raised_at: Instant::now(),
            ttl: None,
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The banner still on screen
    pub fn current(&self) -> Option<&Banner> {
        self.current.as_ref().filter(|banner| !banner.is_expired())
    }
}

/// An in-flight mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SaveSystemPrompt,
    SaveWidgetConfig,
    AddDocument,
    AddWebsite,
    Delete(String),
    Send,
}

/// Run one mutation with the action flag set
///
/// On failure the propagated message becomes an error banner. The flag is
/// cleared whatever the outcome.
pub async fn run_action<T, F>(
    pending: &mut Option<Action>,
    banner: &mut BannerSlot,
    action: Action,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tracing::debug!("Starting {:?}", action);
    *pending = Some(action);
    banner.clear();

    let result = call.await;
    *pending = None;

    if let Err(e) = &result {
        tracing::warn!("Action failed: {}", e);
        banner.error(user_message(e));
    }
    result
}
