//! Test utilities for botdesk
//!
//! Builders for signed-in sessions, view contexts and temporary config
//! files shared by the unit tests.

use crate::backend::DataSource;
use crate::config::Config;
use crate::session::{Identity, LocalSessionProvider, Session, SessionProvider, CHATBOT_ID_FIELD};
use crate::views::ViewContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// In-memory session for `owner@example.com`, optionally scoped to a chatbot
pub fn signed_in(chatbot_id: Option<&str>) -> Arc<dyn SessionProvider> {
    let mut identity = Identity::new("u1", "owner@example.com");
    if let Some(id) = chatbot_id {
        identity = identity.with_metadata(CHATBOT_ID_FIELD, id);
    }
    Arc::new(LocalSessionProvider::in_memory(Some(
        Session::new("tok").with_identity(identity),
    )))
}

/// View context over `source` for a signed-in user
pub fn view_context(source: Arc<dyn DataSource>, chatbot_id: Option<&str>) -> ViewContext {
    ViewContext::new(signed_in(chatbot_id), source, Duration::from_secs(5))
}

/// Default config whose session file lives in `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.session_file = Some(dir.path().join("session.json"));
    config
}

/// Write a config file and return its path
pub fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).expect("Failed to write config file");
    path
}
