//! Guarded HTTP console
//!
//! Serves the read views as JSON. Every `/dashboard` route sits behind the
//! session-cookie guard; the cookie value is used as the access token of a
//! per-request session.

use crate::backend::create_data_source;
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::guard::{require_session, RouteGuard, LOGIN_PATH};
use crate::session::{
    GoTrueSessionProvider, LocalSessionProvider, Session, SessionProvider, SessionStore,
};
use crate::views::{
    ChatbotConfigView, KnowledgeView, Resource, StatsView, ViewContext, ViewError,
    LOGIN_CALL_TO_ACTION,
};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Shared state of the HTTP console
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    guard: Arc<RouteGuard>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let guard = RouteGuard::new(config.auth.session_cookie.clone());
        Self {
            config: Arc::new(config),
            guard: Arc::new(guard),
        }
    }

    /// Session provider for the token carried by one request
    ///
    /// Without an auth service the token is matched against the locally
    /// stored session so the offline snapshot can be reused.
    fn session_for(&self, token: String) -> Result<Arc<dyn SessionProvider>> {
        let session = Session::new(token);
        match &self.config.auth.url {
            Some(url) => Ok(Arc::new(GoTrueSessionProvider::new(
                url,
                &self.config.auth.public_key,
                SessionStore::memory(Some(session)),
                Duration::from_secs(self.config.backend.timeout_seconds),
            )?)),
            None => {
                let stored = SessionStore::file(self.config.session_path())
                    .load()?
                    .filter(|stored| stored.access_token == session.access_token);
                Ok(Arc::new(LocalSessionProvider::in_memory(Some(
                    stored.unwrap_or(session),
                ))))
            }
        }
    }

    fn context(&self, headers: &HeaderMap) -> Result<ViewContext> {
        let token = self
            .guard
            .session_token(headers)
            .ok_or(ConsoleError::NoSession)?;
        let session = self.session_for(token)?;
        let source = create_data_source(&self.config, session.clone())?;
        Ok(ViewContext::new(
            session,
            source,
            Duration::from_secs(self.config.console.banner_seconds),
        ))
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn view_error_response(error: &ViewError) -> Response {
    match error {
        ViewError::NoSession => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": error.to_string(),
                "action": LOGIN_CALL_TO_ACTION,
                "login": LOGIN_PATH,
            })),
        )
            .into_response(),
        ViewError::NoChatbotAssigned => error_response(StatusCode::FORBIDDEN, &error.to_string()),
        ViewError::Load(message) => error_response(StatusCode::BAD_GATEWAY, message),
    }
}

fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!("Failed to prepare request: {}", err);
    match err.downcast_ref::<ConsoleError>() {
        Some(ConsoleError::NoSession) => view_error_response(&ViewError::NoSession),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn render<T: Serialize + Send + 'static>(resource: &Resource<T>) -> Response {
    match (resource.data(), resource.error()) {
        (Some(data), _) => Json(data).into_response(),
        (None, Some(error)) => view_error_response(error),
        (None, None) => error_response(StatusCode::SERVICE_UNAVAILABLE, "Request cancelled"),
    }
}

async fn login_page(State(state): State<AppState>) -> Response {
    Json(json!({
        "message": "Sign in with `botdesk login`, then send the session token as a cookie",
        "cookie": state.guard.cookie_name(),
    }))
    .into_response()
}

async fn stats_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match state.context(&headers) {
        Ok(ctx) => ctx,
        Err(e) => return internal_error(e),
    };
    render(StatsView::mount(&ctx).await.stats())
}

async fn chatbot_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match state.context(&headers) {
        Ok(ctx) => ctx,
        Err(e) => return internal_error(e),
    };
    render(ChatbotConfigView::mount(&ctx).await.settings())
}

async fn knowledge_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match state.context(&headers) {
        Ok(ctx) => ctx,
        Err(e) => return internal_error(e),
    };
    render(KnowledgeView::mount(&ctx).await.sources())
}

async fn embed_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match state.context(&headers) {
        Ok(ctx) => ctx,
        Err(e) => return internal_error(e),
    };
    let view = ChatbotConfigView::mount(&ctx).await;
    if let Some(error) = view.settings().error() {
        return view_error_response(error);
    }
    match view.embed_snippet(&state.config.embed) {
        Some(snippet) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], snippet).into_response(),
        None => view_error_response(&ViewError::NoChatbotAssigned),
    }
}

/// Build the console router
pub fn router(state: AppState) -> Router {
    let guard = state.guard.clone();
    Router::new()
        .route(LOGIN_PATH, get(login_page))
        .route("/dashboard", get(stats_page))
        .route("/dashboard/chatbot", get(chatbot_page))
        .route("/dashboard/knowledge", get(knowledge_page))
        .route("/dashboard/embed", get(embed_page))
        .layer(middleware::from_fn_with_state(guard, require_session))
        .with_state(state)
}

/// Run the HTTP console until interrupted
pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| ConsoleError::Config(format!("Invalid bind address {}: {}", bind, e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP console listening on http://{}", addr);
    println!("Listening on http://{} (Ctrl-C to stop)", addr);

    axum::serve(listener, router(AppState::new(config)))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("HTTP console stopped");
    Ok(())
}
