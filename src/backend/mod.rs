//! Data sources behind the console views
//!
//! Views never talk to HTTP directly. They go through [`DataSource`], which
//! has three implementations selected by `backend.mode`:
//!
//! - [`LiveBackend`]: the backend REST API via [`crate::api::ApiClient`]
//! - [`DemoBackend`]: in-memory illustrative data, no network
//! - [`FallbackBackend`]: live first, demo data when a live read fails

pub mod demo;
pub mod fallback;
pub mod live;

pub use demo::DemoBackend;
pub use fallback::FallbackBackend;
pub use live::LiveBackend;

use crate::api::types::{
    ChatResponse, Chatbot, ChatbotStats, CrawlLimits, KnowledgeSource, SearchResult, WidgetConfig,
};
use crate::api::ApiClient;
use crate::config::{BackendMode, Config};
use crate::error::Result;
use crate::session::SessionProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Every backend operation the console needs
///
/// All operations are scoped by a chatbot identifier (or a resource id that
/// belongs to one); no operation spans tenants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Chatbots visible to the caller
    async fn list_chatbots(&self) -> Result<Vec<Chatbot>>;

    /// One chatbot by id
    async fn get_chatbot(&self, id: &str) -> Result<Chatbot>;

    /// Replace a chatbot's top-level fields
    async fn update_chatbot(&self, id: &str, chatbot: &Chatbot) -> Result<Chatbot>;

    /// Widget configuration of a chatbot
    async fn get_widget_config(&self, id: &str) -> Result<WidgetConfig>;

    /// Replace the widget configuration wholesale
    async fn update_widget_config(&self, id: &str, config: &WidgetConfig)
        -> Result<WidgetConfig>;

    /// System prompt of a chatbot
    async fn get_system_prompt(&self, id: &str) -> Result<String>;

    /// Replace the system prompt
    async fn update_system_prompt(&self, id: &str, prompt: &str) -> Result<String>;

    /// Knowledge sources of a chatbot
    async fn list_knowledge_sources(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>>;

    /// One knowledge source by id
    async fn get_knowledge_source(&self, id: &str) -> Result<KnowledgeSource>;

    /// Submit pasted text as a document
    async fn create_document_source(
        &self,
        chatbot_id: &str,
        name: &str,
        content: &str,
    ) -> Result<KnowledgeSource>;

    /// Start crawling a website
    async fn create_website_source(
        &self,
        chatbot_id: &str,
        url: &str,
        limits: CrawlLimits,
    ) -> Result<KnowledgeSource>;

    /// Delete one knowledge source
    async fn delete_knowledge_source(&self, id: &str) -> Result<()>;

    /// Search the knowledge base
    async fn search(&self, chatbot_id: &str, query: &str, top_k: u32)
        -> Result<Vec<SearchResult>>;

    /// Ask the chatbot a question
    async fn run_test_chat(&self, chatbot_id: &str, query: &str) -> Result<ChatResponse>;

    /// Usage statistics
    async fn get_stats(&self, chatbot_id: &str) -> Result<ChatbotStats>;
}

/// Build the data source selected by configuration
///
/// # Errors
///
/// Returns error if the HTTP client cannot be created
pub fn create_data_source(
    config: &Config,
    session: Arc<dyn SessionProvider>,
) -> Result<Arc<dyn DataSource>> {
    tracing::debug!("Creating data source: mode={}", config.backend.mode);

    match config.backend.mode {
        BackendMode::Live => Ok(Arc::new(LiveBackend::new(ApiClient::new(
            &config.backend,
            session,
        )?))),
        BackendMode::Demo => Ok(Arc::new(DemoBackend::new())),
        BackendMode::Fallback => Ok(Arc::new(FallbackBackend::new(
            LiveBackend::new(ApiClient::new(&config.backend, session)?),
            DemoBackend::new(),
        ))),
    }
}
