//! HTTP console integration tests
//!
//! Drives the guarded router with `tower::ServiceExt::oneshot` over the demo
//! data source and a session stored in a temporary file.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use botdesk::commands::serve::{router, AppState};
use botdesk::config::{BackendMode, Config};
use botdesk::session::{Identity, Session, SessionStore, CHATBOT_ID_FIELD};

fn demo_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.backend.mode = BackendMode::Demo;
    config.auth.url = None;
    config.auth.session_file = Some(dir.path().join("session.json"));
    config
}

fn store_session(config: &Config, token: &str, chatbot_id: Option<&str>) {
    let mut identity = Identity::new("u1", "owner@example.com");
    if let Some(id) = chatbot_id {
        identity = identity.with_metadata(CHATBOT_ID_FIELD, id);
    }
    SessionStore::file(config.session_path())
        .save(&Session::new(token).with_identity(identity))
        .expect("save session");
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_dashboard_without_cookie_redirects_to_login() {
    let dir = TempDir::new().unwrap();
    let app = router(AppState::new(demo_config(&dir)));

    let response = app.oneshot(get("/dashboard/knowledge", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_login_page_is_public() {
    let dir = TempDir::new().unwrap();
    let app = router(AppState::new(demo_config(&dir)));

    let response = app.oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cookie"], "sb-auth-token");
}

#[tokio::test]
async fn test_stats_with_stored_session() {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    store_session(&config, "tok-1", Some("bot-1"));
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard", Some("theme=dark; sb-auth-token=tok-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["totalConversations"], 1248);
}

#[tokio::test]
async fn test_knowledge_lists_seeded_sources() {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    store_session(&config, "tok-1", Some("bot-1"));
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard/knowledge", Some("sb-auth-token=tok-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_unknown_token_needs_login() {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    store_session(&config, "tok-1", Some("bot-1"));
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard", Some("sb-auth-token=someone-else")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No active session");
    assert_eq!(body["action"], "Return to login");
}

#[tokio::test]
async fn test_expired_token_needs_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let mut config = demo_config(&dir);
    config.auth.url = Some(server.uri());
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard", Some("sb-auth-token=expired")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["action"], "Return to login");
    assert_eq!(body["login"], "/login");
}

#[tokio::test]
async fn test_missing_chatbot_assignment_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    store_session(&config, "tok-1", None);
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard/chatbot", Some("sb-auth-token=tok-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_embed_page_renders_snippet() {
    let dir = TempDir::new().unwrap();
    let config = demo_config(&dir);
    store_session(&config, "tok-1", Some("bot-1"));
    let app = router(AppState::new(config));

    let response = app
        .oneshot(get("/dashboard/embed", Some("sb-auth-token=tok-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("chatbotId: \"bot-1\""));
    assert!(html.contains("widget.js"));
}
