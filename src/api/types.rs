//! Wire types for the chatbot backend
//!
//! Field names follow the backend's JSON exactly. Identifiers may arrive as
//! strings or numbers and are normalized to `String`.

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Default greeting shown when a chatbot has none configured
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

/// Largest accepted `top_k` for the widget configuration
pub const MAX_TOP_K: u32 = 20;

/// Accept a JSON string or number as an identifier
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn optional_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Chat bubble size
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BubbleSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Which side of the page the widget sits on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WidgetPosition {
    Left,
    #[default]
    Right,
}

impl fmt::Display for WidgetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Widget color theme
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Appearance and model parameters of the embeddable widget
///
/// Always sent wholesale; the backend has no partial-update semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default)]
    pub bubble_size: BubbleSize,
    #[serde(default)]
    pub position: WidgetPosition,
    #[serde(default)]
    pub greeting: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub use_query_expansion: bool,
}

fn default_primary_color() -> String {
    "#6366F1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    3
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            name: String::new(),
            primary_color: default_primary_color(),
            bubble_size: BubbleSize::default(),
            position: WidgetPosition::default(),
            greeting: DEFAULT_GREETING.to_string(),
            theme: Theme::default(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            use_query_expansion: false,
        }
    }
}

fn color_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static color regex")
    })
}

impl WidgetConfig {
    /// Check field ranges before the configuration is sent
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] naming the first bad field.
    ///
    /// # Examples
    ///
    /// ```
    /// use botdesk::api::types::WidgetConfig;
    ///
    /// let mut config = WidgetConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.temperature = 1.5;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !color_pattern().is_match(&self.primary_color) {
            return Err(ConsoleError::Validation(format!(
                "Primary color must be a hex color like #6366F1, got {}",
                self.primary_color
            ))
            .into());
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConsoleError::Validation(
                "Temperature must be between 0.0 and 1.0".to_string(),
            )
            .into());
        }

        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ConsoleError::Validation(format!(
                "Retrieved document count must be between 1 and {}",
                MAX_TOP_K
            ))
            .into());
        }

        if !self.logo_url.is_empty() && url::Url::parse(&self.logo_url).is_err() {
            return Err(
                ConsoleError::Validation("Logo URL must be an absolute URL".to_string()).into(),
            );
        }

        Ok(())
    }
}

/// A customer's chatbot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chatbot {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub widget_config: WidgetConfig,
}

impl Chatbot {
    /// Greeting to open a conversation with
    pub fn greeting(&self) -> &str {
        if self.widget_config.greeting.trim().is_empty() {
            DEFAULT_GREETING
        } else {
            &self.widget_config.greeting
        }
    }
}

/// Knowledge source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Document,
    Website,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "Document"),
            Self::Website => write!(f, "Website"),
        }
    }
}

/// Backend-driven ingestion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A document or crawled website ingested for retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub chatbot_id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub processing_status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_message: Option<String>,
}

/// Chunking strategy requested for new sources
pub const CHUNKING_STRATEGY: &str = "hierarchical";

/// Limits for a website crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlLimits {
    pub max_pages: u32,
    pub max_depth: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
        }
    }
}

/// Body of a document-source creation request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateDocumentRequest<'a> {
    pub chatbot_id: &'a str,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: &'a str,
    pub content: &'a str,
    pub chunking_strategy: &'a str,
}

/// Body of a website crawl request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CrawlWebsiteRequest<'a> {
    pub chatbot_id: &'a str,
    pub url: &'a str,
    pub max_pages: u32,
    pub max_depth: u32,
    pub chunking_strategy: &'a str,
    pub scrape_all_pages: bool,
}

/// Body of a system prompt update, also accepted as a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SystemPromptBody {
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Parameters used by the test console when chatting
pub const TEST_CHAT_TOP_K: u32 = 3;
/// Model used by the test console
pub const TEST_CHAT_MODEL: &str = "gpt-4o";
/// Temperature used by the test console
pub const TEST_CHAT_TEMPERATURE: f32 = 0.7;

/// Body of a RAG chat request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub chatbot_id: &'a str,
    pub query: &'a str,
    pub top_k: u32,
    pub model: &'a str,
    pub temperature: f32,
}

/// Body of a RAG search request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub chatbot_id: &'a str,
    pub query: &'a str,
    pub top_k: u32,
}

/// A citation attached to an assistant answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    #[serde(
        default,
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub title: String,
}

/// Answer from the RAG chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
}

/// Metadata attached to a search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchMetadata {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A chunk returned by knowledge-base search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(deserialize_with = "id_string")]
    pub chunk_id: String,
    pub content: String,
    pub similarity: f64,
    #[serde(default)]
    pub metadata: SearchMetadata,
    #[serde(default)]
    pub chunking_strategy: String,
}

/// Search endpoint response; either a bare list or `{ "results": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SearchResponse {
    List(Vec<SearchResult>),
    Wrapped { results: Vec<SearchResult> },
}

impl SearchResponse {
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            Self::List(results) | Self::Wrapped { results } => results,
        }
    }
}

/// Conversations per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: String,
    pub count: u64,
}

/// A frequently asked question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopQuestion {
    pub question: String,
    pub count: u64,
}

/// Usage statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotStats {
    pub total_conversations: u64,
    pub total_messages: u64,
    pub avg_response_time: f64,
    #[serde(default)]
    pub daily_usage: Vec<DailyUsage>,
    #[serde(default)]
    pub top_questions: Vec<TopQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chatbot_numeric_id_normalized() {
        let bot: Chatbot = serde_json::from_value(json!({
            "id": 42,
            "name": "Helper",
            "status": "active",
            "widget_config": { "greeting": "Hi there" }
        }))
        .unwrap();
        assert_eq!(bot.id, "42");
        assert_eq!(bot.greeting(), "Hi there");
        assert_eq!(bot.widget_config.top_k, 3);
    }

    #[test]
    fn test_chatbot_blank_greeting_uses_default() {
        let bot: Chatbot = serde_json::from_value(json!({
            "id": "bot-1",
            "name": "Helper",
            "widget_config": { "greeting": "  " }
        }))
        .unwrap();
        assert_eq!(bot.greeting(), DEFAULT_GREETING);
    }

    #[test]
    fn test_knowledge_source_wire_names() {
        let source: KnowledgeSource = serde_json::from_value(json!({
            "id": 7,
            "chatbot_id": "bot-1",
            "type": "Website",
            "name": "Company Website",
            "processing_status": "processing"
        }))
        .unwrap();
        assert_eq!(source.id, "7");
        assert_eq!(source.source_type, SourceType::Website);
        assert_eq!(source.processing_status, ProcessingStatus::Processing);

        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["type"], "Website");
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_stats_camel_case() {
        let stats: ChatbotStats = serde_json::from_value(json!({
            "totalConversations": 3,
            "totalMessages": 9,
            "avgResponseTime": 1.5,
            "dailyUsage": [{ "date": "Mon", "count": 2 }],
            "topQuestions": [{ "question": "Hours?", "count": 1 }]
        }))
        .unwrap();
        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.daily_usage[0].date, "Mon");
        assert_eq!(stats.top_questions[0].question, "Hours?");
    }

    #[test]
    fn test_widget_validate_color() {
        let mut config = WidgetConfig::default();
        config.primary_color = "#112233".to_string();
        assert!(config.validate().is_ok());
        config.primary_color = "#abc".to_string();
        assert!(config.validate().is_ok());
        config.primary_color = "blue".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_widget_validate_top_k_range() {
        let mut config = WidgetConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());
        config.top_k = MAX_TOP_K + 1;
        assert!(config.validate().is_err());
        config.top_k = MAX_TOP_K;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_widget_validate_logo_url() {
        let mut config = WidgetConfig::default();
        config.logo_url = "logo.png".to_string();
        assert!(config.validate().is_err());
        config.logo_url = "https://cdn.example.com/logo.png".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_widget_enums_lowercase() {
        let value = serde_json::to_value(WidgetConfig {
            bubble_size: BubbleSize::Large,
            position: WidgetPosition::Left,
            theme: Theme::Dark,
            ..WidgetConfig::default()
        })
        .unwrap();
        assert_eq!(value["bubble_size"], "large");
        assert_eq!(value["position"], "left");
        assert_eq!(value["theme"], "dark");
    }

    #[test]
    fn test_search_response_shapes() {
        let hit = json!({
            "chunk_id": 1,
            "content": "We open at 9",
            "similarity": 0.91,
            "metadata": { "source": "faq", "title": "FAQ", "chunk_total": 4 },
            "chunking_strategy": "hierarchical"
        });
        let list: SearchResponse = serde_json::from_value(json!([hit.clone()])).unwrap();
        assert_eq!(list.into_results().len(), 1);

        let wrapped: SearchResponse = serde_json::from_value(json!({ "results": [hit] })).unwrap();
        let results = wrapped.into_results();
        assert_eq!(results[0].chunk_id, "1");
        assert_eq!(results[0].metadata.extra["chunk_total"], 4);
    }

    #[test]
    fn test_citation_numeric_chunk_id() {
        let citation: SourceCitation = serde_json::from_value(json!({
            "chunk_id": 12,
            "content": "text",
            "source": "https://example.com",
            "title": "Home"
        }))
        .unwrap();
        assert_eq!(citation.chunk_id.as_deref(), Some("12"));
    }
}
