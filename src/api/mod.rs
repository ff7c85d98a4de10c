//! Backend API client
//!
//! One authenticated call path to the chatbot backend. Every request carries
//! the caller's credential in the `X-Client-Key` header: the identity's
//! `apiKey` metadata when present, else the configured fallback credential.
//!
//! Failures of any kind reach the caller as [`ConsoleError::Api`] holding a
//! single message string:
//!
//! - a non-2xx response with a JSON `detail` field yields that detail,
//! - any other non-2xx response yields `API request failed with status <code>`,
//! - a transport failure yields `Failed to reach backend: <cause>`.
//!
//! There is no retry, no caching, and no token refresh. Each call is one
//! round trip.

pub mod types;

use crate::config::BackendConfig;
use crate::error::{ConsoleError, Result};
use crate::session::SessionProvider;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use types::{
    ChatRequest, ChatResponse, Chatbot, ChatbotStats, CrawlLimits, CrawlWebsiteRequest,
    CreateDocumentRequest, KnowledgeSource, SearchRequest, SearchResponse, SearchResult,
    SourceType, SystemPromptBody, WidgetConfig, CHUNKING_STRATEGY, TEST_CHAT_MODEL,
    TEST_CHAT_TEMPERATURE, TEST_CHAT_TOP_K,
};

/// Header carrying the backend credential
pub const CLIENT_KEY_HEADER: &str = "X-Client-Key";

/// Typed wrapper around the chatbot backend
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use botdesk::api::ApiClient;
/// use botdesk::config::BackendConfig;
/// use botdesk::session::LocalSessionProvider;
///
/// # async fn example() -> botdesk::error::Result<()> {
/// let session = Arc::new(LocalSessionProvider::signed_out());
/// let client = ApiClient::new(&BackendConfig::default(), session)?;
/// let stats = client.get_stats("bot-1").await?;
/// println!("{} conversations", stats.total_conversations);
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    client: Client,
    base_url: String,
    fallback_api_key: String,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &BackendConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("botdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized API client: base_url={}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fallback_api_key: config.api_key.clone(),
            session,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the credential for the current caller
    ///
    /// Identity lookup failures are logged and the fallback is used.
    async fn resolve_api_key(&self) -> String {
        match self.session.get_identity().await {
            Ok(Some(identity)) => {
                if let Some(key) = identity.api_key() {
                    return key.to_string();
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Error getting user API key: {}", e),
        }
        self.fallback_api_key.clone()
    }

    /// Send one request and decode the JSON response
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Api`] with the normalized message.
    pub async fn request<T, B>(&self, endpoint: &str, method: Method, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let api_key = self.resolve_api_key().await;
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(CLIENT_KEY_HEADER, api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            ConsoleError::Api(format!("Failed to reach backend: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ConsoleError::Api(format!("Failed to read backend response: {}", e))
        })?;

        if !status.is_success() {
            let message = error_message(status, &text);
            tracing::error!("{} {} returned {}: {}", method, url, status, message);
            return Err(ConsoleError::Api(message).into());
        }

        let payload = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(payload).map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", url, e);
            ConsoleError::Api(format!("Failed to parse backend response: {}", e)).into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request::<T, Value>(endpoint, Method::GET, None).await
    }

    /// List every chatbot visible to the caller
    pub async fn list_chatbots(&self) -> Result<Vec<Chatbot>> {
        self.get("/chatbots/").await
    }

    /// Fetch one chatbot
    pub async fn get_chatbot(&self, id: &str) -> Result<Chatbot> {
        self.get(&format!("/chatbots/{}", id)).await
    }

    /// Replace a chatbot's top-level fields
    pub async fn update_chatbot(&self, id: &str, chatbot: &Chatbot) -> Result<Chatbot> {
        self.request(&format!("/chatbots/{}", id), Method::PUT, Some(chatbot))
            .await
    }

    /// Fetch the widget configuration
    pub async fn get_widget_config(&self, id: &str) -> Result<WidgetConfig> {
        self.get(&format!("/chatbots/{}/widget-config", id)).await
    }

    /// Replace the widget configuration wholesale
    pub async fn update_widget_config(
        &self,
        id: &str,
        config: &WidgetConfig,
    ) -> Result<WidgetConfig> {
        self.request(
            &format!("/chatbots/{}/widget-config", id),
            Method::PUT,
            Some(config),
        )
        .await
    }

    /// Fetch the system prompt
    ///
    /// Accepts `{"system_prompt": ...}` or a bare JSON string.
    pub async fn get_system_prompt(&self, id: &str) -> Result<String> {
        let value: Value = self.get(&format!("/chatbots/{}/system-prompt", id)).await?;
        Ok(prompt_from_value(value))
    }

    /// Replace the system prompt
    pub async fn update_system_prompt(&self, id: &str, prompt: &str) -> Result<String> {
        let body = SystemPromptBody {
            system_prompt: Some(prompt.to_string()),
        };
        let value: Value = self
            .request(
                &format!("/chatbots/{}/system-prompt", id),
                Method::PUT,
                Some(&body),
            )
            .await?;

        // Some backends echo nothing useful; keep what was sent.
        let echoed = prompt_from_value(value);
        Ok(if echoed.is_empty() {
            prompt.to_string()
        } else {
            echoed
        })
    }

    /// List knowledge sources of a chatbot
    pub async fn list_knowledge_sources(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>> {
        self.get(&format!("/knowledge-sources/?chatbot_id={}", chatbot_id))
            .await
    }

    /// Fetch one knowledge source
    pub async fn get_knowledge_source(&self, id: &str) -> Result<KnowledgeSource> {
        self.get(&format!("/knowledge-sources/{}", id)).await
    }

    /// Submit pasted text as a document source
    pub async fn create_document_source(
        &self,
        chatbot_id: &str,
        name: &str,
        content: &str,
    ) -> Result<KnowledgeSource> {
        let body = CreateDocumentRequest {
            chatbot_id,
            source_type: SourceType::Document,
            name,
            content,
            chunking_strategy: CHUNKING_STRATEGY,
        };
        self.request("/knowledge-sources/", Method::POST, Some(&body))
            .await
    }

    /// Start a website crawl
    pub async fn create_website_source(
        &self,
        chatbot_id: &str,
        url: &str,
        limits: CrawlLimits,
    ) -> Result<KnowledgeSource> {
        let body = CrawlWebsiteRequest {
            chatbot_id,
            url,
            max_pages: limits.max_pages,
            max_depth: limits.max_depth,
            chunking_strategy: CHUNKING_STRATEGY,
            scrape_all_pages: false,
        };
        self.request("/knowledge-sources/crawl-website", Method::POST, Some(&body))
            .await
    }

    /// Delete a knowledge source
    pub async fn delete_knowledge_source(&self, id: &str) -> Result<()> {
        let _: Value = self
            .request::<Value, Value>(&format!("/knowledge-sources/{}", id), Method::DELETE, None)
            .await?;
        Ok(())
    }

    /// Search the knowledge base
    pub async fn search(
        &self,
        chatbot_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<SearchResult>> {
        let body = SearchRequest {
            chatbot_id,
            query,
            top_k,
        };
        let response: SearchResponse = self
            .request("/rag/search", Method::POST, Some(&body))
            .await?;
        Ok(response.into_results())
    }

    /// Ask the chatbot a question as the test console does
    pub async fn run_test_chat(&self, chatbot_id: &str, query: &str) -> Result<ChatResponse> {
        let body = ChatRequest {
            chatbot_id,
            query,
            top_k: TEST_CHAT_TOP_K,
            model: TEST_CHAT_MODEL,
            temperature: TEST_CHAT_TEMPERATURE,
        };
        self.request("/rag/chat", Method::POST, Some(&body)).await
    }

    /// Fetch usage statistics
    pub async fn get_stats(&self, chatbot_id: &str) -> Result<ChatbotStats> {
        self.get(&format!("/stats/chatbot/{}", chatbot_id)).await
    }
}

/// Normalize a failed response into one message
///
/// # Examples
///
/// ```
/// use botdesk::api::error_message;
/// use reqwest::StatusCode;
///
/// let status = StatusCode::INTERNAL_SERVER_ERROR;
/// assert_eq!(error_message(status, r#"{"detail": "db down"}"#), "db down");
/// assert_eq!(error_message(status, "<html>"), "API request failed with status 500");
/// ```
pub fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(Value::String(message)) if !message.is_empty() => message,
        Some(Value::Null) | Some(Value::String(_)) | None => {
            format!("API request failed with status {}", status.as_u16())
        }
        Some(other) => other.to_string(),
    }
}

fn prompt_from_value(value: Value) -> String {
    match value {
        Value::String(prompt) => prompt,
        Value::Object(_) => serde_json::from_value::<SystemPromptBody>(value)
            .ok()
            .and_then(|body| body.system_prompt)
            .unwrap_or_default(),
        _ => String::new(),
    }
}
