//! In-memory demo data source
//!
//! Serves illustrative data so the console can be explored without a
//! backend. Mutations are kept for the lifetime of the process. Each chatbot
//! gets its own seeded knowledge sources on first access.

use super::DataSource;
use crate::api::types::{
    ChatResponse, Chatbot, ChatbotStats, CrawlLimits, DailyUsage, KnowledgeSource,
    ProcessingStatus, SearchMetadata, SearchResult, SourceCitation, SourceType, TopQuestion,
    WidgetConfig, CHUNKING_STRATEGY, TEST_CHAT_TOP_K,
};
use crate::error::{ConsoleError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Name of every demo chatbot
pub const DEMO_CHATBOT_NAME: &str = "Demo Chatbot";

/// Greeting of every demo chatbot
pub const DEMO_GREETING: &str = "Hello! I'm a demo chatbot. How can I help you today?";

/// Chatbot id used when nothing else is known
pub const DEMO_CHATBOT_ID: &str = "demo-chatbot";

const DEMO_SYSTEM_PROMPT: &str = "You are a helpful assistant for customer support. \
Answer using the knowledge sources provided and say so when you do not know.";

const NO_MATCH_ANSWER: &str = "I'm a demo chatbot, so I can only answer from the sample \
knowledge sources. Try asking about business hours, refunds, or password resets.";

const FAQ_CONTENT: &str = "How do I reset my password? Use the \"Forgot password\" link on the sign-in page and follow the emailed instructions.

What are your business hours? Our support team is available Monday to Friday, 9am to 6pm.

Do you offer refunds? Yes, purchases can be refunded within 30 days of the order date.

How can I contact support? Email support@example.com or use the chat widget on any page.

What payment methods do you accept? We accept all major credit cards and bank transfers.";

const WEBSITE_CONTENT: &str = "Welcome to our company. We build friendly customer support tools for small businesses.

Our pricing page lists a free tier and two paid plans billed monthly or yearly.

The about page introduces the team and our offices in Berlin and Toronto.";

struct SeedSource {
    id: &'static str,
    source_type: SourceType,
    name: &'static str,
    content: &'static str,
    started: &'static str,
    finished: &'static str,
}

const SEED_SOURCES: [SeedSource; 2] = [
    SeedSource {
        id: "mock-1",
        source_type: SourceType::Document,
        name: "FAQ Document",
        content: FAQ_CONTENT,
        started: "2023-10-01T14:30:00Z",
        finished: "2023-10-01T14:35:00Z",
    },
    SeedSource {
        id: "mock-2",
        source_type: SourceType::Website,
        name: "Company Website",
        content: WEBSITE_CONTENT,
        started: "2023-10-02T10:15:00Z",
        finished: "2023-10-02T10:25:00Z",
    },
];

/// Statistics shown for every demo chatbot
pub fn sample_stats() -> ChatbotStats {
    let daily = [
        ("Mon", 120),
        ("Tue", 145),
        ("Wed", 132),
        ("Thu", 187),
        ("Fri", 166),
        ("Sat", 91),
        ("Sun", 78),
    ];
    let questions = [
        ("How do I reset my password?", 45),
        ("What are your business hours?", 38),
        ("Do you offer refunds?", 32),
        ("How can I contact support?", 29),
        ("What payment methods do you accept?", 25),
    ];

    ChatbotStats {
        total_conversations: 1248,
        total_messages: 8963,
        avg_response_time: 1.2,
        daily_usage: daily
            .iter()
            .map(|(date, count)| DailyUsage {
                date: date.to_string(),
                count: *count,
            })
            .collect(),
        top_questions: questions
            .iter()
            .map(|(question, count)| TopQuestion {
                question: question.to_string(),
                count: *count,
            })
            .collect(),
    }
}

fn demo_chatbot(id: &str) -> Chatbot {
    Chatbot {
        id: id.to_string(),
        name: DEMO_CHATBOT_NAME.to_string(),
        status: "active".to_string(),
        system_prompt: Some(DEMO_SYSTEM_PROMPT.to_string()),
        widget_config: WidgetConfig {
            name: DEMO_CHATBOT_NAME.to_string(),
            greeting: DEMO_GREETING.to_string(),
            ..WidgetConfig::default()
        },
    }
}

#[derive(Default)]
struct DemoState {
    chatbots: HashMap<String, Chatbot>,
    /// Source ids are unique across chatbots; lookups by id never cross owners
    sources: Vec<KnowledgeSource>,
    seeded: HashSet<String>,
}

impl DemoState {
    fn chatbot_mut(&mut self, id: &str) -> &mut Chatbot {
        self.chatbots
            .entry(id.to_string())
            .or_insert_with(|| demo_chatbot(id))
    }

    /// Seed sample sources the first time a chatbot is seen
    fn seed(&mut self, chatbot_id: &str) {
        if !self.seeded.insert(chatbot_id.to_string()) {
            return;
        }

        for seed in &SEED_SOURCES {
            let taken = self.sources.iter().any(|s| s.id == seed.id);
            let id = if taken {
                uuid::Uuid::new_v4().to_string()
            } else {
                seed.id.to_string()
            };
            self.sources.push(KnowledgeSource {
                id,
                chatbot_id: chatbot_id.to_string(),
                source_type: seed.source_type,
                name: seed.name.to_string(),
                content: Some(seed.content.to_string()),
                processing_status: ProcessingStatus::Completed,
                processing_start_time: Some(seed.started.to_string()),
                processing_end_time: Some(seed.finished.to_string()),
                processing_message: None,
            });
        }
    }

    fn push_pending(
        &mut self,
        chatbot_id: &str,
        source_type: SourceType,
        name: &str,
        content: Option<String>,
    ) -> KnowledgeSource {
        self.seed(chatbot_id);
        let source = KnowledgeSource {
            id: uuid::Uuid::new_v4().to_string(),
            chatbot_id: chatbot_id.to_string(),
            source_type,
            name: name.to_string(),
            content,
            processing_status: ProcessingStatus::Pending,
            processing_start_time: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            processing_end_time: None,
            processing_message: None,
        };
        self.sources.push(source.clone());
        source
    }
}

fn not_found(id: &str) -> anyhow::Error {
    ConsoleError::Api(format!("Knowledge source {} not found", id)).into()
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Rank paragraphs of `sources` by the share of query terms they contain
fn rank_chunks(sources: &[&KnowledgeSource], query: &str, top_k: u32) -> Vec<SearchResult> {
    let query_terms = terms(query);
    if query_terms.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for source in sources {
        let Some(content) = source.content.as_deref() else {
            continue;
        };
        for (index, chunk) in content.split("\n\n").enumerate() {
            let chunk_terms: HashSet<String> = terms(chunk).into_iter().collect();
            let matched = query_terms
                .iter()
                .filter(|term| chunk_terms.contains(*term))
                .count();
            if matched == 0 {
                continue;
            }
            hits.push(SearchResult {
                chunk_id: format!("{}-{}", source.id, index),
                content: chunk.trim().to_string(),
                similarity: matched as f64 / query_terms.len() as f64,
                metadata: SearchMetadata {
                    source: source.name.clone(),
                    source_type: source.source_type.to_string(),
                    title: source.name.clone(),
                    extra: serde_json::Map::new(),
                },
                chunking_strategy: CHUNKING_STRATEGY.to_string(),
            });
        }
    }

    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(top_k as usize);
    hits
}

/// Illustrative in-memory backend
#[derive(Default)]
pub struct DemoBackend {
    state: RwLock<DemoState>,
}

impl DemoBackend {
    /// Create a demo backend with no chatbots seen yet
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for DemoBackend {
    async fn list_chatbots(&self) -> Result<Vec<Chatbot>> {
        let mut state = self.state.write().await;
        if state.chatbots.is_empty() {
            state.chatbot_mut(DEMO_CHATBOT_ID);
        }
        let mut chatbots: Vec<Chatbot> = state.chatbots.values().cloned().collect();
        chatbots.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(chatbots)
    }

    async fn get_chatbot(&self, id: &str) -> Result<Chatbot> {
        Ok(self.state.write().await.chatbot_mut(id).clone())
    }

    async fn update_chatbot(&self, id: &str, chatbot: &Chatbot) -> Result<Chatbot> {
        let mut state = self.state.write().await;
        let stored = state.chatbot_mut(id);
        *stored = Chatbot {
            id: id.to_string(),
            ..chatbot.clone()
        };
        Ok(stored.clone())
    }

    async fn get_widget_config(&self, id: &str) -> Result<WidgetConfig> {
        Ok(self
            .state
            .write()
            .await
            .chatbot_mut(id)
            .widget_config
            .clone())
    }

    async fn update_widget_config(
        &self,
        id: &str,
        config: &WidgetConfig,
    ) -> Result<WidgetConfig> {
        let mut state = self.state.write().await;
        state.chatbot_mut(id).widget_config = config.clone();
        Ok(config.clone())
    }

    async fn get_system_prompt(&self, id: &str) -> Result<String> {
        Ok(self
            .state
            .write()
            .await
            .chatbot_mut(id)
            .system_prompt
            .clone()
            .unwrap_or_default())
    }

    async fn update_system_prompt(&self, id: &str, prompt: &str) -> Result<String> {
        let mut state = self.state.write().await;
        state.chatbot_mut(id).system_prompt = Some(prompt.to_string());
        Ok(prompt.to_string())
    }

    async fn list_knowledge_sources(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>> {
        let mut state = self.state.write().await;
        state.seed(chatbot_id);
        Ok(state
            .sources
            .iter()
            .filter(|s| s.chatbot_id == chatbot_id)
            .cloned()
            .collect())
    }

    // Ownership of an id is checked by the live backend's row policies. Here
    // it follows from `seed` and `push_pending` never reusing an id.
    async fn get_knowledge_source(&self, id: &str) -> Result<KnowledgeSource> {
        self.state
            .read()
            .await
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create_document_source(
        &self,
        chatbot_id: &str,
        name: &str,
        content: &str,
    ) -> Result<KnowledgeSource> {
        let mut state = self.state.write().await;
        let source = state.push_pending(
            chatbot_id,
            SourceType::Document,
            name,
            Some(content.to_string()),
        );
        tracing::debug!("Demo document source created: {}", source.id);
        Ok(source)
    }

    async fn create_website_source(
        &self,
        chatbot_id: &str,
        url: &str,
        limits: CrawlLimits,
    ) -> Result<KnowledgeSource> {
        let mut state = self.state.write().await;
        let mut source = state.push_pending(chatbot_id, SourceType::Website, url, None);
        source.processing_message = Some(format!(
            "Crawling up to {} pages, {} levels deep",
            limits.max_pages, limits.max_depth
        ));
        if let Some(stored) = state.sources.iter_mut().find(|s| s.id == source.id) {
            stored.processing_message = source.processing_message.clone();
        }
        tracing::debug!("Demo website source created: {}", source.id);
        Ok(source)
    }

    async fn delete_knowledge_source(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;
        state.sources.remove(index);
        Ok(())
    }

    async fn search(
        &self,
        chatbot_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<SearchResult>> {
        let mut state = self.state.write().await;
        state.seed(chatbot_id);
        let sources: Vec<&KnowledgeSource> = state
            .sources
            .iter()
            .filter(|s| s.chatbot_id == chatbot_id)
            .collect();
        Ok(rank_chunks(&sources, query, top_k))
    }

    async fn run_test_chat(&self, chatbot_id: &str, query: &str) -> Result<ChatResponse> {
        let hits = self.search(chatbot_id, query, TEST_CHAT_TOP_K).await?;

        let Some(best) = hits.first() else {
            return Ok(ChatResponse {
                answer: NO_MATCH_ANSWER.to_string(),
                sources: Vec::new(),
            });
        };

        Ok(ChatResponse {
            answer: format!("Here is what I found: {}", best.content),
            sources: hits
                .iter()
                .map(|hit| SourceCitation {
                    chunk_id: Some(hit.chunk_id.clone()),
                    content: hit.content.clone(),
                    source: hit.metadata.source.clone(),
                    title: hit.metadata.title.clone(),
                })
                .collect(),
        })
    }

    async fn get_stats(&self, chatbot_id: &str) -> Result<ChatbotStats> {
        tracing::debug!("Serving demo stats for {}", chatbot_id);
        Ok(sample_stats())
    }
}
